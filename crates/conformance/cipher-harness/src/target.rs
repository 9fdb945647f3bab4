//! Adapter around the executable under test

use crate::alphabet;
use crate::command::{CommandOutput, CommandRunner, RunError};
use crate::{HarnessError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One invocation of the target's process interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    Generate,
    Encrypt {
        plaintext: &'a str,
        key: Option<&'a str>,
    },
    Decrypt {
        ciphertext: &'a str,
        key: Option<&'a str>,
    },
}

impl Operation<'_> {
    /// Argument vector: `generate`, `encrypt <pt> [--key=K]`, `decrypt <ct> [--key=K]`
    pub fn args(&self) -> Vec<String> {
        let (name, input, key) = match *self {
            Operation::Generate => return vec!["generate".to_string()],
            Operation::Encrypt { plaintext, key } => ("encrypt", plaintext, key),
            Operation::Decrypt { ciphertext, key } => ("decrypt", ciphertext, key),
        };

        let mut args = vec![name.to_string(), input.to_string()];
        if let Some(key) = key {
            args.push(format!("--key={}", key));
        }
        args
    }

    /// Reason reported when the process fails to run or exits non-zero
    pub fn run_failure(&self) -> &'static str {
        match self {
            Operation::Generate => "Key generation failed to run",
            Operation::Encrypt { .. } => "Encryption failed to run",
            Operation::Decrypt { .. } => "Decryption failed to run",
        }
    }

    /// Reason reported when the output violates the alphabet contract
    pub fn invalid_output(&self) -> &'static str {
        match self {
            Operation::Generate => "Implementation generated invalid key",
            Operation::Encrypt { .. } => "Encryption generated invalid output",
            Operation::Decrypt { .. } => "Decryption generated invalid output",
        }
    }
}

/// Something that can carry out target operations and hand back raw output
#[async_trait]
pub trait TargetBackend: Send + Sync {
    /// Performs `operation`, returning the raw captured output
    async fn invoke(&self, operation: &Operation<'_>) -> std::result::Result<CommandOutput, RunError>;

    /// Human-readable name of the target
    fn name(&self) -> &str;
}

/// Backend that spawns a fresh process of the target executable per call
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    executable: PathBuf,
    runner: CommandRunner,
}

impl ProcessBackend {
    pub fn new(executable: impl Into<PathBuf>, runner: CommandRunner) -> Self {
        Self {
            executable: executable.into(),
            runner,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl TargetBackend for ProcessBackend {
    async fn invoke(&self, operation: &Operation<'_>) -> std::result::Result<CommandOutput, RunError> {
        self.runner.run(&self.executable, &operation.args()).await
    }

    fn name(&self) -> &str {
        self.executable
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("target")
    }
}

/// Validating adapter exposing `generate`, `encrypt` and `decrypt`
#[derive(Debug, Clone)]
pub struct CipherTarget<B = ProcessBackend> {
    backend: B,
}

impl CipherTarget<ProcessBackend> {
    /// Adapter over an executable on disk
    pub fn process(executable: impl Into<PathBuf>, runner: CommandRunner) -> Self {
        Self::new(ProcessBackend::new(executable, runner))
    }
}

impl<B: TargetBackend> CipherTarget<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Generates a fresh key
    pub async fn generate(&self) -> Result<String> {
        self.execute(Operation::Generate).await
    }

    /// Encrypts `plaintext`, under the implicit default key when `key` is `None`
    pub async fn encrypt(&self, plaintext: &str, key: Option<&str>) -> Result<String> {
        self.execute(Operation::Encrypt { plaintext, key }).await
    }

    /// Decrypts `ciphertext`, under the implicit default key when `key` is
    /// `None`. The cheater sentinel is passed through untouched.
    pub async fn decrypt(&self, ciphertext: &str, key: Option<&str>) -> Result<String> {
        self.execute(Operation::Decrypt { ciphertext, key }).await
    }

    async fn execute(&self, operation: Operation<'_>) -> Result<String> {
        let args = operation.args();
        let reason = operation.run_failure().to_string();

        let output = self.backend.invoke(&operation).await.map_err(|e| match e {
            RunError::Timeout { timeout_ms } => HarnessError::Timeout {
                reason: reason.clone(),
                args: args.clone(),
                timeout_ms,
            },
            other => HarnessError::Execution {
                reason: reason.clone(),
                args: args.clone(),
                output: CommandOutput {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: other.to_string(),
                },
            },
        })?;

        if !output.success() {
            tracing::warn!(
                target_name = %self.name(),
                exit_code = ?output.exit_code,
                "{}",
                reason
            );
            return Err(HarnessError::Execution { reason, args, output });
        }

        let result = alphabet::trim_output(&output.stdout).to_string();
        let valid = match operation {
            Operation::Decrypt { .. } => alphabet::is_valid_decryption(&result),
            _ => alphabet::is_valid(&result),
        };

        if !valid {
            return Err(HarnessError::InvalidOutput {
                reason: operation.invalid_output().to_string(),
                args,
                result,
                output,
            });
        }

        Ok(result)
    }
}

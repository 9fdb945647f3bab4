//! Subprocess execution with explicit argument vectors

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Configuration for running external commands
#[derive(Debug, Clone)]
pub struct CommandRunnerConfig {
    /// Timeout per invocation; `None` waits indefinitely
    pub timeout_ms: Option<u64>,
    /// Maximum output size in bytes, per stream
    pub max_output_size: usize,
    /// Working directory for commands
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env_vars: HashMap<String, String>,
}

impl Default for CommandRunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(30000),
            max_output_size: 10 * 1024 * 1024, // 10MB
            working_dir: None,
            env_vars: HashMap::new(),
        }
    }
}

/// Output from command execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code of the command, `None` if killed by a signal
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a process that exited with `code`
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Reasons a command could not produce a [`CommandOutput`]
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("{stream} exceeds limit of {limit} bytes")]
    OutputTooLarge { stream: &'static str, limit: usize },

    #[error("Failed to collect command output: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads `stream` to the end, giving up as soon as more than `limit` bytes
/// arrive
async fn read_capped<R>(stream: Option<R>, name: &'static str, limit: usize) -> Result<String, RunError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(stream) = stream {
        stream.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    }
    if buf.len() > limit {
        return Err(RunError::OutputTooLarge { stream: name, limit });
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Runs one process at a time and captures its output
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    config: CommandRunnerConfig,
}

impl CommandRunner {
    /// Creates a runner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner with custom configuration
    pub fn with_config(config: CommandRunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CommandRunnerConfig {
        &self.config
    }

    /// Runs `program` with `args` passed as discrete arguments, never through
    /// a shell.
    pub async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, RunError> {
        let start = Utc::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.config.working_dir {
            command.current_dir(dir);
        }

        for (key, value) in &self.config.env_vars {
            command.env(key, value);
        }

        tracing::trace!(program = %program.display(), ?args, "Spawning command");

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        // The child is killed when this future is dropped, on timeout or overflow
        let limit = self.config.max_output_size;
        let (stdout, stderr) = (child.stdout.take(), child.stderr.take());
        let collect = async move {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout, "Stdout", limit),
                read_capped(stderr, "Stderr", limit)
            )?;
            let status = child.wait().await?;
            Ok::<_, RunError>((status, stdout, stderr))
        };

        let (status, stdout, stderr) = match self.config.timeout_ms {
            Some(timeout_ms) => timeout(Duration::from_millis(timeout_ms), collect)
                .await
                .map_err(|_| RunError::Timeout { timeout_ms })??,
            None => collect.await?,
        };

        let duration_ms = (Utc::now() - start).num_milliseconds();
        tracing::debug!(
            program = %program.display(),
            exit_code = ?status.code(),
            duration_ms,
            "Command finished"
        );

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let runner = CommandRunner::new();

        let output = runner
            .run(Path::new("echo"), &args(&["it's; $HOME `x`"]))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "it's; $HOME `x`\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_captured() {
        let runner = CommandRunner::new();

        let output = runner.run(Path::new("false"), &[]).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = CommandRunner::new();

        let result = runner.run(Path::new("nonexistentcommand123"), &[]).await;
        assert!(matches!(result, Err(RunError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = CommandRunner::with_config(CommandRunnerConfig {
            timeout_ms: Some(100),
            ..Default::default()
        });

        let result = runner.run(Path::new("sleep"), &args(&["5"])).await;
        assert!(matches!(result, Err(RunError::Timeout { timeout_ms: 100 })));
    }

    #[tokio::test]
    async fn test_output_limit() {
        let runner = CommandRunner::with_config(CommandRunnerConfig {
            max_output_size: 4,
            ..Default::default()
        });

        let result = runner.run(Path::new("echo"), &args(&["too long"])).await;
        assert!(matches!(result, Err(RunError::OutputTooLarge { stream: "Stdout", limit: 4 })));
    }

    #[tokio::test]
    async fn test_endless_output_is_cut_off() {
        let runner = CommandRunner::with_config(CommandRunnerConfig {
            max_output_size: 64 * 1024,
            ..Default::default()
        });

        // Never terminates on its own; only the cap can end this run early
        let result = runner.run(Path::new("yes"), &[]).await;
        assert!(matches!(result, Err(RunError::OutputTooLarge { stream: "Stdout", .. })));
    }
}

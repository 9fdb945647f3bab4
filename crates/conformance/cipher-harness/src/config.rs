//! Harness configuration

use crate::command::CommandRunnerConfig;
use crate::oracle::SuiteConfig;
use crate::types::RunMode;
use crate::{HarnessError, Result};
use std::path::PathBuf;

/// Configuration of a harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Target identifier, the binary name built with cargo
    pub target: String,
    /// Directory holding the challenge fixture; defaults to `secrets/<target>`
    pub storage: Option<PathBuf>,
    /// Prebuilt executable; when set the build step is skipped
    pub executable: Option<PathBuf>,
    /// Cargo project containing the target
    pub project_dir: PathBuf,
    /// Timeout per target invocation
    pub timeout_ms: u64,
    /// Maximum captured output per stream, in bytes
    pub max_output_size: usize,
    /// Seed for plaintext generation; `None` draws a fresh one per run
    pub seed: Option<u64>,
    /// Fail fast or collect every oracle outcome
    pub mode: RunMode,
    /// Where to write the JSON report, if anywhere
    pub report_path: Option<PathBuf>,
    /// Oracle iteration counts
    pub suite: SuiteConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            storage: None,
            executable: None,
            project_dir: PathBuf::from("."),
            timeout_ms: 30000,
            max_output_size: 10 * 1024 * 1024, // 10MB
            seed: None,
            mode: RunMode::FailFast,
            report_path: None,
            suite: SuiteConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Default configuration for `target`
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Default configuration with overrides from `CIPHER_HARNESS_*`
    /// environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`HarnessConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("CIPHER_HARNESS_TIMEOUT_MS") {
            config.timeout_ms = val
                .parse()
                .map_err(|e| HarnessError::Config(format!("Invalid timeout_ms: {}", e)))?;
        }

        if let Some(val) = lookup("CIPHER_HARNESS_MAX_OUTPUT") {
            config.max_output_size = val
                .parse()
                .map_err(|e| HarnessError::Config(format!("Invalid max_output: {}", e)))?;
        }

        if let Some(val) = lookup("CIPHER_HARNESS_SEED") {
            config.seed = Some(
                val.parse()
                    .map_err(|e| HarnessError::Config(format!("Invalid seed: {}", e)))?,
            );
        }

        Ok(config)
    }

    /// Fixture directory, falling back to `secrets/<target>`
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .clone()
            .unwrap_or_else(|| PathBuf::from("secrets").join(&self.target))
    }

    /// Runner settings for target invocations
    pub fn runner_config(&self) -> CommandRunnerConfig {
        CommandRunnerConfig {
            timeout_ms: Some(self.timeout_ms),
            max_output_size: self.max_output_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.is_empty() {
            return Err(HarnessError::Config("Target identifier is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(HarnessError::Config("Timeout must be positive".to_string()));
        }
        Ok(())
    }
}

//! Producing the target executable

use crate::command::{CommandRunner, CommandRunnerConfig};
use crate::{HarnessError, Result};
use std::path::{Path, PathBuf};
use which::which;

/// Builds a target binary with cargo and locates the result
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    project_dir: PathBuf,
}

impl TargetBuilder {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Path of the release binary for `target`
    pub fn release_path(&self, target: &str) -> PathBuf {
        self.project_dir
            .join("target")
            .join("release")
            .join(format!("{}{}", target, std::env::consts::EXE_SUFFIX))
    }

    /// Runs `cargo build --bin=<target> --release` and returns the binary path
    pub async fn build(&self, target: &str) -> Result<PathBuf> {
        let cargo = which("cargo").map_err(|e| HarnessError::Build {
            reason: format!("Cargo not found: {}", e),
            output: None,
        })?;

        // Builds may take arbitrarily long, so no timeout here.
        let runner = CommandRunner::with_config(CommandRunnerConfig {
            timeout_ms: None,
            working_dir: Some(self.project_dir.clone()),
            ..Default::default()
        });
        let args = vec![
            "build".to_string(),
            format!("--bin={}", target),
            "--release".to_string(),
        ];

        tracing::info!(target_name = target, dir = %self.project_dir.display(), "Building target");
        let output = runner.run(&cargo, &args).await.map_err(|e| HarnessError::Build {
            reason: format!("Code does not compile: {}", e),
            output: None,
        })?;

        if !output.success() {
            return Err(HarnessError::Build {
                reason: "Code does not compile".to_string(),
                output: Some(output),
            });
        }

        Self::locate(&self.release_path(target))
    }

    /// Checks that `path` is an existing file
    pub fn locate(path: &Path) -> Result<PathBuf> {
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "Executable not found");
            return Err(HarnessError::Build {
                reason: "Executable is missing".to_string(),
                output: None,
            });
        }
        Ok(path.to_path_buf())
    }
}

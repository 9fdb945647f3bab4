//! Conformance harness binary for encryption command-line implementations

use anyhow::Context;
use cipher_harness::{ConsoleReporter, Harness, HarnessConfig, RunMode};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Binary name of the implementation under test
    #[arg(long)]
    target: String,

    /// Directory containing plaintext.txt, ciphertext.txt and key.txt
    /// [default: secrets/<target>]
    #[arg(long, value_parser = existing_dir)]
    storage: Option<PathBuf>,

    /// Use this executable instead of building the target with cargo
    #[arg(long)]
    executable: Option<PathBuf>,

    /// Cargo project containing the target
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Timeout per target invocation, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Seed for plaintext generation, to replay a run
    #[arg(long)]
    seed: Option<u64>,

    /// Run every oracle even after a failure
    #[arg(long)]
    keep_going: bool,

    /// Write a JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("Directory '{}' does not exist", value))
    }
}

impl Cli {
    fn into_config(self) -> anyhow::Result<HarnessConfig> {
        let mut config = HarnessConfig::from_env()?;
        config.target = self.target;
        config.storage = self.storage;
        config.executable = self.executable;
        config.project_dir = self.project_dir;
        config.report_path = self.report;
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.keep_going {
            config.mode = RunMode::CollectAll;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Diagnostics go to stderr; stdout carries the progress and verdict
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(target_name = %config.target, seed = ?config.seed, "Starting conformance run");

    let report_path = config.report_path.clone();
    let harness = Harness::new(config);
    let mut reporter = ConsoleReporter::stdio();
    let report = harness.run(&mut reporter).await;

    if let Some(path) = report_path {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

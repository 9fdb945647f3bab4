//! A full harness run: build, load the fixture, run the oracles

use crate::builder::TargetBuilder;
use crate::command::CommandRunner;
use crate::config::HarnessConfig;
use crate::fixture::{ChallengeFixture, FixtureField};
use crate::oracle::OracleSuite;
use crate::reporter::ProgressSink;
use crate::target::CipherTarget;
use crate::text::TextGenerator;
use crate::types::SuiteReport;
use crate::Result;
use std::path::{Path, PathBuf};

/// Drives one run against a target
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every step, reporting progress to `progress`. Setup failures end
    /// the run before any oracle executes.
    pub async fn run<P: ProgressSink>(&self, progress: &mut P) -> SuiteReport {
        let config = &self.config;
        // Drawn here when unset so the report always carries it
        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::debug!(seed, "Plaintext generator seeded");

        let (target, fixture) = match self.prepare(progress).await {
            Ok(prepared) => prepared,
            Err(e) => {
                progress.step_failed(&e);
                let report = SuiteReport::setup_failed(&config.target, Some(seed), config.mode, &e);
                progress.finished(&report);
                return report;
            }
        };

        let outcomes = OracleSuite::new(&target, &fixture, TextGenerator::from_seed(seed))
            .with_config(config.suite.clone())
            .run(config.mode, progress)
            .await;

        let report = SuiteReport::new(&config.target, Some(seed), config.mode, outcomes);
        tracing::info!("{}", report.summary());
        progress.finished(&report);
        report
    }

    async fn prepare<P: ProgressSink>(&self, progress: &mut P) -> Result<(CipherTarget, ChallengeFixture)> {
        let config = &self.config;
        config.validate()?;

        let executable = self.executable(progress).await?;
        progress.step_passed();

        let storage = config.storage_dir();
        let plaintext = Self::fetch(progress, FixtureField::Plaintext, &storage)?;
        let ciphertext = Self::fetch(progress, FixtureField::Ciphertext, &storage)?;
        let default_key = Self::fetch(progress, FixtureField::DefaultKey, &storage)?;
        let fixture = ChallengeFixture::new(plaintext, ciphertext, default_key)?;

        let runner = CommandRunner::with_config(config.runner_config());
        Ok((CipherTarget::process(executable, runner), fixture))
    }

    fn fetch<P: ProgressSink>(progress: &mut P, field: FixtureField, storage: &Path) -> Result<String> {
        progress.step_started(&format!("Fetching {}", field));
        let value = field.load(storage)?;
        progress.step_passed();
        Ok(value)
    }

    async fn executable<P: ProgressSink>(&self, progress: &mut P) -> Result<PathBuf> {
        match self.config.executable {
            Some(ref path) => {
                progress.step_started("Locating executable");
                TargetBuilder::locate(path)
            }
            None => {
                progress.step_started("Compiling code");
                TargetBuilder::new(&self.config.project_dir)
                    .build(&self.config.target)
                    .await
            }
        }
    }
}

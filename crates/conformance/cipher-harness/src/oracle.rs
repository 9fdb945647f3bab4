//! The ordered suite of behavioral oracles

use crate::alphabet::CHEATER_SENTINEL;
use crate::fixture::ChallengeFixture;
use crate::reporter::ProgressSink;
use crate::target::{CipherTarget, TargetBackend};
use crate::text::TextGenerator;
use crate::types::{OracleOutcome, RunMode};
use crate::{HarnessError, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single behavioral check of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Oracle {
    /// Repeated decryption under a generated key always recovers the plaintext
    DecryptionDeterminism,
    /// The on-disk default key is the implementation's implicit key
    DefaultKeyGenuineness,
    /// The challenge ciphertext decrypts to the challenge plaintext
    ChallengeCorrectness,
    /// The challenge ciphertext yields the cheater sentinel without a key
    ChallengeProtection,
    /// Encrypt/decrypt with no key recovers texts of growing length
    NoKeyRoundTrip,
    /// Encrypt/decrypt under generated keys, which must not all be equal
    KeyedRoundTrip,
}

impl Oracle {
    /// Execution order
    pub const ALL: [Oracle; 6] = [
        Oracle::DecryptionDeterminism,
        Oracle::DefaultKeyGenuineness,
        Oracle::ChallengeCorrectness,
        Oracle::ChallengeProtection,
        Oracle::NoKeyRoundTrip,
        Oracle::KeyedRoundTrip,
    ];

    /// Progress line shown while the oracle runs
    pub fn description(&self) -> &'static str {
        match self {
            Oracle::DecryptionDeterminism => "Checking decryption consistency",
            Oracle::DefaultKeyGenuineness => "Verifying default key",
            Oracle::ChallengeCorrectness => "Checking challenge ciphertext correctness",
            Oracle::ChallengeProtection => "Testing if challenge ciphertext is protected",
            Oracle::NoKeyRoundTrip => "Testing encryption/decryption with default key",
            Oracle::KeyedRoundTrip => "Testing encryption/decryption with generated key",
        }
    }
}

/// Iteration counts and plaintext lengths of the oracles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Keys generated by the determinism oracle
    pub determinism_trials: usize,
    /// Decryptions per ciphertext in the determinism oracle
    pub determinism_decryptions: usize,
    /// Plaintexts per direction in the default key oracle
    pub genuineness_trials: usize,
    /// Length of the plaintexts used by the first two oracles
    pub fixed_text_len: usize,
    /// Decryptions of the challenge ciphertext under the default key
    pub challenge_trials: usize,
    /// Round trips without key; trial `i` uses lengths in `[step*i, step*(i+1))`
    pub no_key_trials: usize,
    pub no_key_length_step: usize,
    /// Round trips under generated keys, with the same length scheme
    pub keyed_trials: usize,
    pub keyed_length_step: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            determinism_trials: 5,
            determinism_decryptions: 10,
            genuineness_trials: 10,
            fixed_text_len: 100,
            challenge_trials: 10,
            no_key_trials: 10,
            no_key_length_step: 100,
            keyed_trials: 20,
            keyed_length_step: 10,
        }
    }
}

/// Runs the oracles against one target and fixture
pub struct OracleSuite<'a, B, R = StdRng> {
    target: &'a CipherTarget<B>,
    fixture: &'a ChallengeFixture,
    text: TextGenerator<R>,
    config: SuiteConfig,
}

impl<'a, B: TargetBackend, R: Rng> OracleSuite<'a, B, R> {
    pub fn new(target: &'a CipherTarget<B>, fixture: &'a ChallengeFixture, text: TextGenerator<R>) -> Self {
        Self {
            target,
            fixture,
            text,
            config: SuiteConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SuiteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Runs every oracle in order. In [`RunMode::FailFast`] the first failure
    /// ends the run; in [`RunMode::CollectAll`] the remaining oracles still run.
    pub async fn run<P: ProgressSink>(&mut self, mode: RunMode, progress: &mut P) -> Vec<OracleOutcome> {
        let mut outcomes = Vec::with_capacity(Oracle::ALL.len());

        for oracle in Oracle::ALL {
            progress.step_started(oracle.description());
            let start = Utc::now();
            let result = self.check(oracle).await;
            let duration_ms = (Utc::now() - start).num_milliseconds().max(0) as u64;

            match result {
                Ok(()) => {
                    progress.step_passed();
                    outcomes.push(OracleOutcome::pass(oracle, duration_ms));
                }
                Err(e) => {
                    tracing::info!(?oracle, category = e.category(), "Oracle failed: {}", e);
                    progress.step_failed(&e);
                    outcomes.push(OracleOutcome::fail(oracle, &e, duration_ms));
                    if mode == RunMode::FailFast {
                        break;
                    }
                }
            }
        }

        outcomes
    }

    /// Runs a single oracle
    pub async fn check(&mut self, oracle: Oracle) -> Result<()> {
        tracing::info!(?oracle, "Running oracle");
        match oracle {
            Oracle::DecryptionDeterminism => self.decryption_determinism().await,
            Oracle::DefaultKeyGenuineness => self.default_key_genuineness().await,
            Oracle::ChallengeCorrectness => self.challenge_correctness().await,
            Oracle::ChallengeProtection => self.challenge_protection().await,
            Oracle::NoKeyRoundTrip => self.no_key_round_trip().await,
            Oracle::KeyedRoundTrip => self.keyed_round_trip().await,
        }
    }

    async fn decryption_determinism(&mut self) -> Result<()> {
        for trial in 0..self.config.determinism_trials {
            let plaintext = self.text.text(self.config.fixed_text_len);
            let key = self.target.generate().await?;
            let ciphertext = self.target.encrypt(&plaintext, Some(key.as_str())).await?;

            for _ in 0..self.config.determinism_decryptions {
                let decrypted = self.target.decrypt(&ciphertext, Some(key.as_str())).await?;
                if decrypted != plaintext {
                    return Err(HarnessError::NonDeterminism {
                        expected: plaintext,
                        actual: decrypted,
                    });
                }
            }
            tracing::debug!(trial, "Decryption consistent");
        }
        Ok(())
    }

    async fn default_key_genuineness(&mut self) -> Result<()> {
        let fixture = self.fixture;
        let default_key = fixture.default_key();

        for _ in 0..self.config.genuineness_trials {
            let plaintext = self.text.text(self.config.fixed_text_len);
            let ciphertext = self.target.encrypt(&plaintext, None).await?;
            self.expect_genuine(plaintext, &ciphertext).await?;
        }

        for _ in 0..self.config.genuineness_trials {
            let plaintext = self.text.text(self.config.fixed_text_len);
            let ciphertext = self.target.encrypt(&plaintext, Some(default_key)).await?;
            self.expect_genuine(plaintext, &ciphertext).await?;
        }

        Ok(())
    }

    /// Decrypting without key, decrypting under the default key and the
    /// plaintext must all agree.
    async fn expect_genuine(&self, plaintext: String, ciphertext: &str) -> Result<()> {
        let implicit = self.target.decrypt(ciphertext, None).await?;
        let explicit = self
            .target
            .decrypt(ciphertext, Some(self.fixture.default_key()))
            .await?;

        if implicit != explicit || explicit != plaintext {
            return Err(HarnessError::KeyGenuineness {
                plaintext,
                implicit,
                explicit,
            });
        }
        Ok(())
    }

    async fn challenge_correctness(&mut self) -> Result<()> {
        for _ in 0..self.config.challenge_trials {
            let decrypted = self
                .target
                .decrypt(self.fixture.ciphertext(), Some(self.fixture.default_key()))
                .await?;
            if decrypted != self.fixture.plaintext() {
                return Err(HarnessError::ChallengeCorrectness { actual: decrypted });
            }
        }
        Ok(())
    }

    async fn challenge_protection(&mut self) -> Result<()> {
        let decrypted = self.target.decrypt(self.fixture.ciphertext(), None).await?;
        if decrypted != CHEATER_SENTINEL {
            return Err(HarnessError::ChallengeProtection { actual: decrypted });
        }
        Ok(())
    }

    async fn no_key_round_trip(&mut self) -> Result<()> {
        let step = self.config.no_key_length_step;
        for i in 0..self.config.no_key_trials {
            let message = self.text.text_in(step * i..step * (i + 1));
            self.round_trip(message, None).await?;
        }
        Ok(())
    }

    async fn keyed_round_trip(&mut self) -> Result<()> {
        let step = self.config.keyed_length_step;
        let mut keys = HashSet::new();

        for i in 0..self.config.keyed_trials {
            let key = self.target.generate().await?;
            let message = self.text.text_in(step * i..step * (i + 1));
            self.round_trip(message, Some(key.as_str())).await?;
            keys.insert(key);
        }

        if keys.len() <= 1 {
            return Err(HarnessError::KeyEntropy {
                key: keys.into_iter().next().unwrap_or_default(),
                samples: self.config.keyed_trials,
            });
        }
        tracing::debug!(distinct = keys.len(), "Generated keys are diverse");
        Ok(())
    }

    async fn round_trip(&self, message: String, key: Option<&str>) -> Result<()> {
        let ciphertext = self.target.encrypt(&message, key).await?;
        let decrypted = self.target.decrypt(&ciphertext, key).await?;
        if decrypted != message {
            return Err(HarnessError::RoundTrip {
                expected: message,
                actual: decrypted,
            });
        }
        Ok(())
    }
}

//! # Cipher Harness
//!
//! Black-box conformance testing for encryption command-line implementations.
//! The implementation under test is only ever observed through its
//! `generate` / `encrypt` / `decrypt` process interface; a fixed sequence of
//! oracles checks it for broken, non-deterministic or leaky behavior.
//!
//! ## Key Features
//!
//! - Argument-vector process invocation with per-call timeouts
//! - Output alphabet validation and the cheater sentinel contract
//! - Challenge fixture loading (plaintext, ciphertext, default key)
//! - Seedable random plaintext generation
//! - Fail-fast or collect-all oracle runs with JSON reports

pub mod alphabet;
pub mod builder;
pub mod command;
pub mod config;
pub mod fixture;
pub mod harness;
pub mod oracle;
pub mod reporter;
pub mod target;
pub mod text;
pub mod types;

pub use builder::TargetBuilder;
pub use command::{CommandOutput, CommandRunner, CommandRunnerConfig, RunError};
pub use config::HarnessConfig;
pub use fixture::{ChallengeFixture, FixtureField};
pub use harness::Harness;
pub use oracle::{Oracle, OracleSuite, SuiteConfig};
pub use reporter::{ConsoleReporter, ProgressSink};
pub use target::{CipherTarget, Operation, ProcessBackend, TargetBackend};
pub use text::TextGenerator;
pub use types::*;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Harness errors. Every variant is fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("{reason}")]
    Build {
        reason: String,
        output: Option<CommandOutput>,
    },

    #[error("{reason}")]
    Execution {
        reason: String,
        args: Vec<String>,
        output: CommandOutput,
    },

    #[error("{reason} (timed out after {timeout_ms}ms)")]
    Timeout {
        reason: String,
        args: Vec<String>,
        timeout_ms: u64,
    },

    #[error("{reason}")]
    InvalidOutput {
        reason: String,
        args: Vec<String>,
        /// Trimmed stdout that failed validation
        result: String,
        output: CommandOutput,
    },

    #[error("Decryption is non-deterministic")]
    NonDeterminism { expected: String, actual: String },

    #[error("Default key is not genuine")]
    KeyGenuineness {
        plaintext: String,
        implicit: String,
        explicit: String,
    },

    #[error("Challenge ciphertext is incorrect")]
    ChallengeCorrectness { actual: String },

    #[error("Challenge ciphertext is unprotected")]
    ChallengeProtection { actual: String },

    #[error("Encryption/decryption does not work correctly")]
    RoundTrip { expected: String, actual: String },

    #[error("Key generation must not always return the same value.")]
    KeyEntropy { key: String, samples: usize },

    #[error("Failed to get {field}: {cause}")]
    Fixture { field: FixtureField, cause: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    /// Name of the failure category this error belongs to
    pub fn category(&self) -> &'static str {
        match self {
            HarnessError::Build { .. } => "BuildError",
            HarnessError::Execution { .. } | HarnessError::Timeout { .. } => "ExecutionError",
            HarnessError::InvalidOutput { .. } => "InvalidOutputError",
            HarnessError::NonDeterminism { .. } => "NonDeterminismError",
            HarnessError::KeyGenuineness { .. } => "KeyGenuinenessError",
            HarnessError::ChallengeCorrectness { .. } => "ChallengeCorrectnessError",
            HarnessError::ChallengeProtection { .. } => "ChallengeProtectionError",
            HarnessError::RoundTrip { .. } => "RoundTripError",
            HarnessError::KeyEntropy { .. } => "KeyEntropyError",
            HarnessError::Fixture { .. } => "FixtureError",
            HarnessError::Config(_) => "ConfigError",
            HarnessError::Other(_) => "InternalError",
        }
    }

    /// Captured process output attached to this error, if any
    pub fn captured_output(&self) -> Option<&CommandOutput> {
        match self {
            HarnessError::Build { output, .. } => output.as_ref(),
            HarnessError::Execution { output, .. } | HarnessError::InvalidOutput { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Arguments of the target invocation that failed, if any
    pub fn invocation(&self) -> Option<&[String]> {
        match self {
            HarnessError::Execution { args, .. }
            | HarnessError::Timeout { args, .. }
            | HarnessError::InvalidOutput { args, .. } => Some(args),
            _ => None,
        }
    }
}

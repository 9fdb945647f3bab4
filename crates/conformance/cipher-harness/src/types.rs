//! Core types for oracle results and reports

use crate::oracle::Oracle;
use crate::HarnessError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the suite reacts to a failing oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Abort on the first failure
    #[default]
    FailFast,
    /// Run every oracle and record each outcome
    CollectAll,
}

/// Result of a single oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleOutcome {
    /// Unique ID for this outcome
    pub id: Uuid,
    /// Oracle that was run
    pub oracle: Oracle,
    /// Whether the oracle passed
    pub passed: bool,
    /// Failure category, e.g. `NonDeterminismError`
    pub category: Option<String>,
    /// Failure reason
    pub reason: Option<String>,
    /// When the oracle finished
    pub timestamp: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl OracleOutcome {
    /// Creates a passing outcome
    pub fn pass(oracle: Oracle, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            oracle,
            passed: true,
            category: None,
            reason: None,
            timestamp: Utc::now(),
            duration_ms,
        }
    }

    /// Creates a failing outcome from the error that ended the oracle
    pub fn fail(oracle: Oracle, error: &HarnessError, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            oracle,
            passed: false,
            category: Some(error.category().to_string()),
            reason: Some(error.to_string()),
            timestamp: Utc::now(),
            duration_ms,
        }
    }
}

/// Error that stopped the run before any oracle executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupFailure {
    pub category: String,
    pub reason: String,
}

impl From<&HarnessError> for SetupFailure {
    fn from(error: &HarnessError) -> Self {
        Self {
            category: error.category().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Report of a whole harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Report ID
    pub id: Uuid,
    /// Target identifier
    pub target: String,
    /// Seed of the plaintext generator, when one was fixed
    pub seed: Option<u64>,
    /// Run mode
    pub mode: RunMode,
    /// Build or fixture failure, if the run never reached the oracles
    pub setup_failure: Option<SetupFailure>,
    /// Outcomes of the oracles that ran, in order
    pub outcomes: Vec<OracleOutcome>,
    /// Overall verdict
    pub success: bool,
    /// Number of passed oracles
    pub passed: usize,
    /// Number of failed oracles
    pub failed: usize,
    /// Total duration
    pub total_duration_ms: u64,
    /// Generated at
    pub generated_at: DateTime<Utc>,
}

impl SuiteReport {
    /// Creates a report from oracle outcomes. The verdict is all-or-nothing:
    /// every oracle must have run and passed.
    pub fn new(target: impl Into<String>, seed: Option<u64>, mode: RunMode, outcomes: Vec<OracleOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let failed = outcomes.len() - passed;
        let success = failed == 0 && outcomes.len() == Oracle::ALL.len();
        let total_duration_ms = outcomes.iter().map(|o| o.duration_ms).sum();

        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            seed,
            mode,
            setup_failure: None,
            outcomes,
            success,
            passed,
            failed,
            total_duration_ms,
            generated_at: Utc::now(),
        }
    }

    /// Creates a failed report for a run that stopped during setup
    pub fn setup_failed(target: impl Into<String>, seed: Option<u64>, mode: RunMode, error: &HarnessError) -> Self {
        let mut report = Self::new(target, seed, mode, Vec::new());
        report.setup_failure = Some(error.into());
        report
    }

    /// Gets a summary of the report
    pub fn summary(&self) -> String {
        format!(
            "Conformance Report for {}: {} ({}/{} oracles passed) - Duration: {}ms",
            self.target,
            if self.success { "SUCCESS" } else { "FAILED" },
            self.passed,
            Oracle::ALL.len(),
            self.total_duration_ms
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_requires_every_oracle() {
        let all: Vec<_> = Oracle::ALL.iter().map(|&o| OracleOutcome::pass(o, 1)).collect();
        let report = SuiteReport::new("t", None, RunMode::FailFast, all);
        assert!(report.success);
        assert_eq!(report.passed, 6);
        assert_eq!(report.total_duration_ms, 6);

        let partial = vec![OracleOutcome::pass(Oracle::DecryptionDeterminism, 1)];
        let report = SuiteReport::new("t", None, RunMode::FailFast, partial);
        assert!(!report.success);
    }

    #[test]
    fn test_failed_outcome_records_category() {
        let error = HarnessError::ChallengeProtection { actual: "x".into() };
        let outcome = OracleOutcome::fail(Oracle::ChallengeProtection, &error, 0);

        assert!(!outcome.passed);
        assert_eq!(outcome.category.as_deref(), Some("ChallengeProtectionError"));
        assert_eq!(outcome.reason.as_deref(), Some("Challenge ciphertext is unprotected"));
    }

    #[test]
    fn test_setup_failure_report() {
        let error = HarnessError::Build { reason: "Executable is missing".into(), output: None };
        let report = SuiteReport::setup_failed("t", Some(3), RunMode::CollectAll, &error);

        assert!(!report.success);
        assert!(report.summary().contains("FAILED"));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"BuildError\""));
        assert!(json.contains("\"collect_all\""));
    }
}

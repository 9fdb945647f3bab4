//! Progress output and the final verdict

use crate::types::SuiteReport;
use crate::{alphabet, HarnessError};
use std::io::{self, Write};

pub const PASSED_SUMMARY: &str = "You passed the basic tests.";
pub const FAILED_SUMMARY: &str = "You did not pass all tests.";

/// Receives progress of a harness run
pub trait ProgressSink {
    /// A step (setup or oracle) begins
    fn step_started(&mut self, description: &str);

    /// The current step passed
    fn step_passed(&mut self);

    /// The current step failed with `error`
    fn step_failed(&mut self, error: &HarnessError);

    /// The run is over
    fn finished(&mut self, report: &SuiteReport);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn step_started(&mut self, _: &str) {}
    fn step_passed(&mut self) {}
    fn step_failed(&mut self, _: &HarnessError) {}
    fn finished(&mut self, _: &SuiteReport) {}
}

/// Writes `"<step>... Success!"` lines and the verdict to `out`, and captured
/// process output of failures to `diagnostics`.
pub struct ConsoleReporter<W: Write = io::Stdout, E: Write = io::Stderr> {
    out: W,
    diagnostics: E,
    in_step: bool,
}

impl ConsoleReporter {
    /// Reporter on stdout and stderr
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> ConsoleReporter<W, E> {
    pub fn new(out: W, diagnostics: E) -> Self {
        Self {
            out,
            diagnostics,
            in_step: false,
        }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.diagnostics)
    }

    fn write_diagnostics(&mut self, error: &HarnessError) -> io::Result<()> {
        if let Some(output) = error.captured_output() {
            writeln!(self.diagnostics, "stdout: {}", output.stdout)?;
            writeln!(self.diagnostics, "stderr: {}", output.stderr)?;
        }
        if let Some(args) = error.invocation() {
            writeln!(self.diagnostics, "arguments: {:?}", args)?;
        }
        match error {
            HarnessError::NonDeterminism { expected, actual }
            | HarnessError::RoundTrip { expected, actual } => {
                writeln!(self.diagnostics, "expected = {}", expected)?;
                writeln!(self.diagnostics, "actual = {}", actual)?;
            }
            HarnessError::KeyGenuineness { plaintext, implicit, explicit } => {
                writeln!(self.diagnostics, "plaintext = {}", plaintext)?;
                writeln!(self.diagnostics, "decrypted without key = {}", implicit)?;
                writeln!(self.diagnostics, "decrypted with default key = {}", explicit)?;
            }
            HarnessError::ChallengeCorrectness { actual } | HarnessError::ChallengeProtection { actual } => {
                writeln!(self.diagnostics, "decrypted = {}", actual)?;
            }
            HarnessError::InvalidOutput { result, .. } => {
                if let Some((offset, c)) = alphabet::first_invalid(result) {
                    writeln!(self.diagnostics, "invalid character {:?} at offset {}", c, offset)?;
                }
            }
            _ => {}
        }
        self.diagnostics.flush()
    }
}

impl<W: Write, E: Write> ProgressSink for ConsoleReporter<W, E> {
    fn step_started(&mut self, description: &str) {
        self.in_step = true;
        let _ = write!(self.out, "{}... ", description);
        let _ = self.out.flush();
    }

    fn step_passed(&mut self) {
        self.in_step = false;
        let _ = writeln!(self.out, "Success!");
    }

    fn step_failed(&mut self, error: &HarnessError) {
        if std::mem::take(&mut self.in_step) {
            let _ = writeln!(self.out, "Failed!");
        }
        if let Err(e) = self.write_diagnostics(error) {
            tracing::debug!("Failed to write diagnostics: {}", e);
        }
        let _ = writeln!(self.out, "{}", error);
    }

    fn finished(&mut self, report: &SuiteReport) {
        let summary = if report.success { PASSED_SUMMARY } else { FAILED_SUMMARY };
        let _ = writeln!(self.out, "{}", summary);
        let _ = self.out.flush();

        if report.success || report.setup_failure.is_some() {
            return;
        }
        if let Some(seed) = report.seed {
            let _ = writeln!(self.diagnostics, "replay with --seed={}", seed);
            let _ = self.diagnostics.flush();
        }
    }
}

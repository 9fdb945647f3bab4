//! Common test utilities and fixtures for harness tests

#![allow(dead_code)]

use async_trait::async_trait;
use cipher_harness::alphabet::CHEATER_SENTINEL;
use cipher_harness::{
    ChallengeFixture, CipherTarget, CommandOutput, Operation, RunError, SuiteConfig, TargetBackend,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_KEY: &str = "defaultkey";
pub const CHALLENGE_PLAINTEXT: &str = "secret42";

/// Misbehavior an in-memory target can be given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    /// Behaves correctly
    None,
    /// Every fourth keyed decryption returns a corrupted plaintext
    NonDeterministic,
    /// The implicit key differs from the published default key
    DivergentDefaultKey,
    /// Encryption under an explicitly given default key uses another key
    MishandlesExplicitDefaultKey,
    /// Decrypting the challenge without key reveals the plaintext
    LeaksChallenge,
    /// Encryption drops everything past 500 characters
    TruncatesLongText,
    /// Key generation always returns the same key
    ConstantKey,
    /// Key generation exits non-zero
    FailingGenerate,
    /// Encryption prints characters outside the alphabet
    InvalidCiphertext,
}

/// Toy cipher: the ciphertext is the reversed plaintext followed by `.` and
/// the key. Decrypting under another key yields `wrongkey`.
pub struct InMemoryCipher {
    defect: Defect,
    generated: AtomicUsize,
    decryptions: AtomicUsize,
    invocations: AtomicUsize,
}

impl InMemoryCipher {
    pub fn new(defect: Defect) -> Self {
        Self {
            defect,
            generated: AtomicUsize::new(0),
            decryptions: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Number of operations performed so far
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn implicit_key(&self) -> &'static str {
        if self.defect == Defect::DivergentDefaultKey {
            "otherkey"
        } else {
            DEFAULT_KEY
        }
    }

    fn generate(&self) -> CommandOutput {
        let n = self.generated.fetch_add(1, Ordering::SeqCst);
        match self.defect {
            Defect::FailingGenerate => CommandOutput::exited(1, "", "no entropy"),
            Defect::ConstantKey => CommandOutput::exited(0, "k0\n", ""),
            _ => CommandOutput::exited(0, format!("k{}\n", n), ""),
        }
    }

    fn encrypt(&self, plaintext: &str, key: Option<&str>) -> CommandOutput {
        let key = match key {
            Some(DEFAULT_KEY) if self.defect == Defect::MishandlesExplicitDefaultKey => "mangledkey",
            Some(key) => key,
            None => self.implicit_key(),
        };
        let mut plaintext = plaintext.to_string();
        if self.defect == Defect::TruncatesLongText {
            plaintext.truncate(500);
        }
        if self.defect == Defect::InvalidCiphertext {
            return CommandOutput::exited(0, "has spaces\n", "");
        }
        CommandOutput::exited(0, format!("{}\n", seal(&plaintext, key)), "")
    }

    fn decrypt(&self, ciphertext: &str, key: Option<&str>) -> CommandOutput {
        if key.is_none()
            && ciphertext == challenge_ciphertext()
            && self.defect != Defect::LeaksChallenge
        {
            return CommandOutput::exited(0, format!("{}\n", CHEATER_SENTINEL), "");
        }

        let explicit = key.is_some();
        let key = key.unwrap_or(self.implicit_key());
        let mut plaintext = open(ciphertext, key).unwrap_or_else(|| "wrongkey".to_string());

        if explicit && self.defect == Defect::NonDeterministic {
            let n = self.decryptions.fetch_add(1, Ordering::SeqCst);
            if n % 4 == 3 {
                plaintext.push('x');
            }
        }
        CommandOutput::exited(0, format!("{}\n", plaintext), "")
    }
}

#[async_trait]
impl TargetBackend for InMemoryCipher {
    async fn invoke(&self, operation: &Operation<'_>) -> Result<CommandOutput, RunError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(match *operation {
            Operation::Generate => self.generate(),
            Operation::Encrypt { plaintext, key } => self.encrypt(plaintext, key),
            Operation::Decrypt { ciphertext, key } => self.decrypt(ciphertext, key),
        })
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

pub fn seal(plaintext: &str, key: &str) -> String {
    format!("{}.{}", plaintext.chars().rev().collect::<String>(), key)
}

pub fn open(ciphertext: &str, key: &str) -> Option<String> {
    let (body, used_key) = ciphertext.rsplit_once('.')?;
    (used_key == key).then(|| body.chars().rev().collect())
}

pub fn challenge_ciphertext() -> String {
    seal(CHALLENGE_PLAINTEXT, DEFAULT_KEY)
}

/// Fixture matching [`InMemoryCipher`]
pub fn in_memory_fixture() -> ChallengeFixture {
    ChallengeFixture::new(CHALLENGE_PLAINTEXT, challenge_ciphertext(), DEFAULT_KEY).unwrap()
}

pub fn in_memory_target(defect: Defect) -> CipherTarget<InMemoryCipher> {
    CipherTarget::new(InMemoryCipher::new(defect))
}

/// Suite configuration with fewer iterations, for process-backed tests
pub fn quick_suite() -> SuiteConfig {
    SuiteConfig {
        determinism_trials: 2,
        determinism_decryptions: 3,
        genuineness_trials: 2,
        challenge_trials: 2,
        no_key_trials: 3,
        keyed_trials: 4,
        ..SuiteConfig::default()
    }
}

/// Path of the reference target built alongside the tests
pub fn reference_cipher() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_reference-cipher"))
}

/// Fixture files shipped for the reference target
pub fn reference_fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/reference")
}

/// Writes a complete storage directory for the reference target into `dir`,
/// computing the challenge ciphertext with the reference target itself.
pub fn write_reference_storage(dir: &Path) {
    let source = reference_fixture_dir();
    let plaintext = std::fs::read_to_string(source.join("plaintext.txt")).unwrap();
    let key = std::fs::read_to_string(source.join("key.txt")).unwrap();

    let output = std::process::Command::new(reference_cipher())
        .arg("encrypt")
        .arg(plaintext.trim_end())
        .output()
        .unwrap();
    assert!(output.status.success());

    std::fs::write(dir.join("plaintext.txt"), &plaintext).unwrap();
    std::fs::write(dir.join("key.txt"), &key).unwrap();
    std::fs::write(dir.join("ciphertext.txt"), &output.stdout).unwrap();
}

/// Default key shipped for the reference target
pub fn reference_default_key() -> String {
    std::fs::read_to_string(reference_fixture_dir().join("key.txt"))
        .unwrap()
        .trim_end()
        .to_string()
}

/// Writes an executable shell script named `name` into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

//! Challenge fixture loading

use crate::{alphabet, HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// One of the three files making up a challenge fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureField {
    Plaintext,
    Ciphertext,
    DefaultKey,
}

impl FixtureField {
    pub const ALL: [FixtureField; 3] = [
        FixtureField::Plaintext,
        FixtureField::Ciphertext,
        FixtureField::DefaultKey,
    ];

    /// File name inside the storage directory
    pub fn file_name(&self) -> &'static str {
        match self {
            FixtureField::Plaintext => "plaintext.txt",
            FixtureField::Ciphertext => "ciphertext.txt",
            FixtureField::DefaultKey => "key.txt",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FixtureField::Plaintext => "Challenge plaintext",
            FixtureField::Ciphertext => "Challenge ciphertext",
            FixtureField::DefaultKey => "Default key",
        }
    }

    /// Reads, trims and validates this field from `storage`
    pub fn load(&self, storage: &Path) -> Result<String> {
        let fail = |cause: String| HarnessError::Fixture { field: *self, cause };

        let path = storage.join(self.file_name());
        let raw = fs::read_to_string(&path)
            .map_err(|e| fail(format!("{}: {}", path.display(), e)))?;
        let value = alphabet::trim_output(&raw);

        if value.is_empty() {
            return Err(fail(format!("{} is empty", self.title())));
        }
        if !alphabet::is_valid(value) {
            return Err(fail(format!("{} is invalid", self.title())));
        }

        tracing::debug!(path = %path.display(), len = value.len(), "Loaded fixture field");
        Ok(value.to_string())
    }
}

impl fmt::Display for FixtureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FixtureField::Plaintext => "challenge plaintext",
            FixtureField::Ciphertext => "challenge ciphertext",
            FixtureField::DefaultKey => "default key",
        })
    }
}

/// The fixed `(plaintext, ciphertext, default key)` triple of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeFixture {
    plaintext: String,
    ciphertext: String,
    default_key: String,
}

impl ChallengeFixture {
    /// Builds a fixture from values already in memory, applying the same
    /// checks as [`ChallengeFixture::load`]
    pub fn new(
        plaintext: impl Into<String>,
        ciphertext: impl Into<String>,
        default_key: impl Into<String>,
    ) -> Result<Self> {
        let fixture = Self {
            plaintext: plaintext.into(),
            ciphertext: ciphertext.into(),
            default_key: default_key.into(),
        };

        for field in FixtureField::ALL {
            let value = fixture.get(field);
            let cause = if value.is_empty() {
                format!("{} is empty", field.title())
            } else if !alphabet::is_valid(value) {
                format!("{} is invalid", field.title())
            } else {
                continue;
            };
            return Err(HarnessError::Fixture { field, cause });
        }

        Ok(fixture)
    }

    /// Loads all three files from `storage`
    pub fn load(storage: &Path) -> Result<Self> {
        Ok(Self {
            plaintext: FixtureField::Plaintext.load(storage)?,
            ciphertext: FixtureField::Ciphertext.load(storage)?,
            default_key: FixtureField::DefaultKey.load(storage)?,
        })
    }

    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn get(&self, field: FixtureField) -> &str {
        match field {
            FixtureField::Plaintext => &self.plaintext,
            FixtureField::Ciphertext => &self.ciphertext,
            FixtureField::DefaultKey => &self.default_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(plaintext: &str, ciphertext: &str, key: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("plaintext.txt"), plaintext).unwrap();
        fs::write(dir.path().join("ciphertext.txt"), ciphertext).unwrap();
        fs::write(dir.path().join("key.txt"), key).unwrap();
        dir
    }

    #[test]
    fn test_load_strips_trailing_newline() {
        let dir = storage("secret42\n", "Q2lwaGVy/+=\n", "a2V5");

        let fixture = ChallengeFixture::load(dir.path()).unwrap();
        assert_eq!(fixture.plaintext(), "secret42");
        assert_eq!(fixture.ciphertext(), "Q2lwaGVy/+=");
        assert_eq!(fixture.default_key(), "a2V5");
    }

    #[test]
    fn test_empty_field() {
        let dir = storage("secret42", "abc", "\n");

        let err = ChallengeFixture::load(dir.path()).unwrap_err();
        assert_eq!(err.category(), "FixtureError");
        assert_eq!(err.to_string(), "Failed to get default key: Default key is empty");
    }

    #[test]
    fn test_invalid_field() {
        let dir = storage("not secret", "abc", "key");

        let err = ChallengeFixture::load(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get challenge plaintext: Challenge plaintext is invalid"
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();

        let err = ChallengeFixture::load(dir.path()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to get challenge plaintext: "));
    }

    #[test]
    fn test_new_validates() {
        assert!(ChallengeFixture::new("a", "b", "c").is_ok());
        let err = ChallengeFixture::new("a", "", "c").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get challenge ciphertext: Challenge ciphertext is empty"
        );
    }
}

//! Reference target implementing the `generate` / `encrypt` / `decrypt`
//! process contract.
//!
//! Plaintexts are XORed with a SHA3-256 counter-mode keystream derived from
//! the key. Keys and ciphertexts are base64. Not meant to be secure: it only
//! exists to exercise the harness end to end.

use base64::prelude::*;
use cipher_harness::alphabet::{self, CHEATER_SENTINEL};
use clap::{Parser, Subcommand};
use rand::RngCore;
use sha3::{Digest, Sha3_256};

const DEFAULT_KEY: &str = include_str!("../../tests/fixtures/reference/key.txt");
const CHALLENGE_PLAINTEXT: &str = include_str!("../../tests/fixtures/reference/plaintext.txt");
const KEY_LEN: usize = 32;

fn parse_message(value: &str) -> Result<String, String> {
    match alphabet::first_invalid(value) {
        Some((_, c)) => Err(format!("illegal character '{}'", c)),
        None => Ok(value.to_string()),
    }
}

/// Raw bytes given in base64 on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bytes(Vec<u8>);

fn parse_base64(value: &str) -> Result<Bytes, String> {
    BASE64_STANDARD.decode(value).map(Bytes).map_err(|e| e.to_string())
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a new key
    Generate,
    /// Encrypt a message with the given key, or with the default key
    Encrypt {
        #[arg(value_parser = parse_message)]
        message: String,
        /// Key in base64
        #[arg(long, value_parser = parse_base64)]
        key: Option<Bytes>,
    },
    /// Decrypt a base64 ciphertext with the given key, or with the default key
    Decrypt {
        #[arg(value_parser = parse_base64)]
        ciphertext: Bytes,
        /// Key in base64
        #[arg(long, value_parser = parse_base64)]
        key: Option<Bytes>,
    },
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn apply_keystream(key: &[u8], data: &[u8]) -> Vec<u8> {
    data.chunks(32)
        .enumerate()
        .flat_map(|(counter, chunk)| {
            let block = Sha3_256::new()
                .chain_update(key)
                .chain_update((counter as u64).to_le_bytes())
                .finalize();
            chunk
                .iter()
                .zip(block)
                .map(|(byte, pad)| byte ^ pad)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn default_key() -> anyhow::Result<Vec<u8>> {
    Ok(BASE64_STANDARD.decode(alphabet::trim_output(DEFAULT_KEY))?)
}

fn challenge_ciphertext() -> anyhow::Result<Vec<u8>> {
    Ok(apply_keystream(
        &default_key()?,
        alphabet::trim_output(CHALLENGE_PLAINTEXT).as_bytes(),
    ))
}

fn resolve_key(key: Option<Bytes>) -> anyhow::Result<Vec<u8>> {
    match key {
        Some(Bytes(key)) if key.is_empty() => anyhow::bail!("key must not be empty"),
        Some(Bytes(key)) => Ok(key),
        None => default_key(),
    }
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Generate => {
            let mut key = [0u8; KEY_LEN];
            rand::thread_rng().fill_bytes(&mut key);
            println!("{}", BASE64_STANDARD.encode(key));
        }
        Command::Encrypt { message, key } => {
            let key = resolve_key(key)?;
            println!("{}", BASE64_STANDARD.encode(apply_keystream(&key, message.as_bytes())));
        }
        Command::Decrypt { ciphertext: Bytes(ciphertext), key } => {
            if key.is_none() && ciphertext == challenge_ciphertext()? {
                println!("{}", CHEATER_SENTINEL);
                return Ok(());
            }
            let key = resolve_key(key)?;
            let decrypted = apply_keystream(&key, &ciphertext);
            match String::from_utf8(decrypted) {
                Ok(message) if alphabet::is_valid(&message) => println!("{}", message),
                // Wrong key: keep the output inside the alphabet
                Ok(message) => println!("{}", BASE64_STANDARD.encode(message)),
                Err(e) => println!("{}", BASE64_STANDARD.encode(e.into_bytes())),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystream_is_an_involution() {
        let key = b"reference key";
        let data = b"a message spanning more than one keystream block of 32 bytes";

        let encrypted = apply_keystream(key, data);
        assert_ne!(&encrypted[..], &data[..]);
        assert_eq!(apply_keystream(key, &encrypted), data.to_vec());
    }

    #[test]
    fn test_fixture_key_decodes() {
        assert_eq!(default_key().unwrap().len(), KEY_LEN);
        assert!(!challenge_ciphertext().unwrap().is_empty());
    }
}

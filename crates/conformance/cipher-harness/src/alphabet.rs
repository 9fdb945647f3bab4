//! The character alphabet shared by keys, plaintexts and ciphertexts

/// Punctuation allowed in addition to ASCII letters and digits
pub const PUNCTUATION: &str = ",.;?!()/=+";

/// The only non-alphabet output a target may produce, and only from a
/// decryption without key
pub const CHEATER_SENTINEL: &str = "cheater: it is forbidden to decrypt the challenge ciphertext";

/// Whether `c` belongs to the output alphabet
pub fn is_alphabet_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || PUNCTUATION.contains(c)
}

/// Whether `c` may appear in a generated plaintext (letters and digits only)
pub fn is_text_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Whether every character of `s` belongs to the alphabet.
///
/// The empty string is valid.
pub fn is_valid(s: &str) -> bool {
    first_invalid(s).is_none()
}

/// Byte offset and value of the first character outside the alphabet
pub fn first_invalid(s: &str) -> Option<(usize, char)> {
    s.char_indices().find(|&(_, c)| !is_alphabet_char(c))
}

/// Strips trailing newlines from raw process output
pub fn trim_output(raw: &str) -> &str {
    raw.trim_end_matches('\n')
}

/// Whether `s` is a legitimate decryption result: alphabet-valid or exactly
/// the cheater sentinel
pub fn is_valid_decryption(s: &str) -> bool {
    s == CHEATER_SENTINEL || is_valid(s)
}

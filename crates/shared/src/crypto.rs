//! Hashing helpers for API keys and legacy credential digests.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest used by the pre-Argon2 credential store.
///
/// The login name acts as salt, so two accounts sharing a password still
/// produce different digests.
pub fn legacy_salted_digest(login: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(login.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two strings without short-circuiting on the first mismatch.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Returns true if `value` looks like a hex-encoded SHA-256 digest.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

//! Password hashing utilities using Argon2id.
//!
//! New credentials are always hashed with Argon2id. Stored hashes may still
//! use the legacy login-salted SHA-256 digest written by older installations;
//! those verify normally and are reported by [`needs_rehash`] so the auth
//! layer can upgrade them on the next successful login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::crypto::{constant_time_str_eq, is_sha256_hex, legacy_salted_digest};

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id parameters following OWASP recommendations (2024).
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Hashing scheme a stored credential was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// PHC-formatted Argon2 hash.
    Argon2,
    /// Hex SHA-256 of `login || password`.
    LegacySha256,
}

impl HashScheme {
    /// Detects the scheme of a stored hash, or `None` if it is unrecognised.
    pub fn detect(stored: &str) -> Option<Self> {
        if stored.starts_with("$argon2") {
            Some(HashScheme::Argon2)
        } else if is_sha256_hex(stored) {
            Some(HashScheme::LegacySha256)
        } else {
            None
        }
    }
}

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id with the current parameters.
///
/// # Example
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("my_secure_password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a PHC-formatted Argon2 hash.
///
/// The stored hash carries its own parameters, so hashes written with
/// older parameters still verify.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Verifies a password against a stored credential hash of any known scheme.
///
/// `login` is only consulted for legacy digests, where it is the salt.
pub fn verify_stored_password(
    login: &str,
    password: &str,
    stored: &str,
) -> Result<bool, PasswordError> {
    match HashScheme::detect(stored) {
        Some(HashScheme::Argon2) => verify_password(password, stored),
        Some(HashScheme::LegacySha256) => Ok(constant_time_str_eq(
            &legacy_salted_digest(login, password),
            &stored.to_ascii_lowercase(),
        )),
        None => Err(PasswordError::InvalidHashFormat),
    }
}

/// Returns true when a stored hash was not produced by the current scheme
/// and parameters.
pub fn needs_rehash(stored: &str) -> bool {
    match HashScheme::detect(stored) {
        Some(HashScheme::LegacySha256) => true,
        Some(HashScheme::Argon2) => {
            let Ok(parsed) = PasswordHash::new(stored) else {
                return false;
            };
            if parsed.algorithm.as_str() != Algorithm::Argon2id.ident().as_str() {
                return true;
            }
            if parsed.version != Some(Version::V0x13 as u32) {
                return true;
            }
            match Params::try_from(&parsed) {
                Ok(params) => {
                    params.m_cost() != MEMORY_COST
                        || params.t_cost() != TIME_COST
                        || params.p_cost() != PARALLELISM
                }
                Err(_) => false,
            }
        }
        None => false,
    }
}

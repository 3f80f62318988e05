//! Shared utilities and common types for the multisite FAQ backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing helpers (SHA-256, legacy credential digests)
//! - Password hashing with Argon2id and legacy-hash detection
//! - Validation of tenant identifiers (table prefix, hostname, theme)

pub mod crypto;
pub mod password;
pub mod validation;

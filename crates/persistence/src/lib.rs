//! Persistence layer for the multisite FAQ backend.
//!
//! This crate contains:
//! - Database connection management and the registry migration
//! - The prefixed per-tenant table layout
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the storage side of the
//!   provisioning and credential traits declared in `domain`

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod schema;

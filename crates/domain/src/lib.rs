//! Domain layer for the multisite FAQ backend.
//!
//! This crate contains:
//! - Domain models (Tenant, Credential, CategoryRelation, TenantSettings)
//! - Provisioning, auth and notification services behind storage traits
//! - Domain error types

pub mod models;
pub mod services;

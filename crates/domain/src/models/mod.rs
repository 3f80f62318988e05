//! Domain models for the multisite FAQ backend.

pub mod category;
pub mod config;
pub mod credential;
pub mod tenant;

pub use category::{CategoryCounts, CategoryFaqMatrix, CategoryRef, CategoryRelation, RecordMailInfo};
pub use config::{ConfigEntry, TenantSettings};
pub use credential::{Credential, LoginAttempt, LoginResult, NewCredential};
pub use tenant::{Hostname, ProvisionRequest, TablePrefix, Tenant, TenantStatus};

//! Custom Axum extractors.

pub mod tenant;

pub use tenant::{normalize_host, TenantContext};

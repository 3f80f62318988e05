//! Repository implementations for database operations.

pub mod category_relation;
pub mod config;
pub mod credential;
pub mod schema;
pub mod tenant;

pub use category_relation::CategoryRelationRepository;
pub use config::ConfigRepository;
pub use credential::CredentialRepository;
pub use schema::SchemaRepository;
pub use tenant::TenantRepository;

//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod category_relation;
pub mod config;
pub mod credential;
pub mod tenant;

pub use category_relation::{
    CategoryCountEntity, CategoryRecordPairEntity, CategoryRefEntity, RecordMailInfoEntity,
};
pub use config::ConfigEntity;
pub use credential::CredentialEntity;
pub use tenant::TenantEntity;

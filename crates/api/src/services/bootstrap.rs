//! Master tenant bootstrap.
//!
//! Runs after migrations on every start. Creates the master's tables and
//! default configuration if they are missing and registers the master in
//! the tenant registry. Existing configuration values are never overwritten.

use domain::models::config::keys;
use domain::services::SchemaCloneError;
use persistence::repositories::{ConfigRepository, SchemaRepository, TenantRepository};
use sqlx::PgPool;
use tracing::info;

use crate::config::{Config, ConfigValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Schema(#[from] SchemaCloneError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),
}

/// Defaults written into a fresh master config table.
pub fn master_defaults(config: &Config) -> Vec<(&'static str, String)> {
    let tenancy = &config.tenancy;
    vec![
        (keys::IS_MASTER, "true".to_string()),
        (keys::REFERENCE_URL, tenancy.master_url.clone()),
        (keys::TITLE, tenancy.master_title.clone()),
        (keys::ADMIN_EMAIL, tenancy.master_admin_email.clone()),
        (keys::META_DESCRIPTION, String::new()),
        (keys::LANGUAGE, "language_en.php".to_string()),
        (keys::FORCE_PASSWORD_UPDATE, "false".to_string()),
        (keys::SEO_META_HOME, "index, follow".to_string()),
        (keys::SEO_META_FAQS, "index, follow".to_string()),
        (keys::SEO_META_CATEGORIES, "index, follow".to_string()),
        (keys::SEO_META_PAGES, "index, follow".to_string()),
    ]
}

/// Idempotent; safe to call on every start.
pub async fn bootstrap_master(pool: &PgPool, config: &Config) -> Result<(), BootstrapError> {
    let prefix = config.master_prefix()?;
    let hostname = config.master_hostname()?;

    let schema = SchemaRepository::new(
        pool.clone(),
        prefix.clone(),
        config.tenancy.bootstrap_admin_user_id,
    );
    schema.ensure_master_tables().await?;

    let defaults = master_defaults(config);
    let pairs: Vec<(&str, &str)> = defaults.iter().map(|(k, v)| (*k, v.as_str())).collect();
    ConfigRepository::new(pool.clone())
        .insert_defaults(&prefix, &pairs)
        .await?;

    let master = TenantRepository::new(pool.clone())
        .upsert_master(&prefix, &hostname, &config.tenancy.master_url)
        .await?;

    info!(
        tenant_id = %master.id,
        prefix = %prefix,
        hostname = %hostname,
        "Master tenant ready"
    );
    Ok(())
}

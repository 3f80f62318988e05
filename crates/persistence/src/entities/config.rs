//! Tenant configuration entity.

use domain::models::ConfigEntry;
use sqlx::FromRow;

/// Database row mapping for a `<prefix>config` table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigEntity {
    pub config_key: String,
    pub config_value: Option<String>,
}

impl From<ConfigEntity> for ConfigEntry {
    fn from(entity: ConfigEntity) -> Self {
        Self {
            key: entity.config_key,
            value: entity.config_value.unwrap_or_default(),
        }
    }
}

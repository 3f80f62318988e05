//! Tenant registry entity.

use chrono::{DateTime, Utc};
use domain::models::{Hostname, TablePrefix, Tenant, TenantStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the tenants table.
#[derive(Debug, Clone, FromRow)]
pub struct TenantEntity {
    pub id: Uuid,
    pub table_prefix: String,
    pub hostname: String,
    pub is_master: bool,
    pub status: String,
    pub template: String,
    pub client_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TenantEntity> for Tenant {
    type Error = String;

    fn try_from(entity: TenantEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            table_prefix: TablePrefix::new(entity.table_prefix.as_str())
                .map_err(|e| format!("tenant {} has invalid prefix: {}", entity.id, e))?,
            hostname: Hostname::new(entity.hostname.as_str())
                .map_err(|e| format!("tenant {} has invalid hostname: {}", entity.id, e))?,
            is_master: entity.is_master,
            status: entity.status.parse::<TenantStatus>()?,
            template: entity.template,
            client_url: entity.client_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

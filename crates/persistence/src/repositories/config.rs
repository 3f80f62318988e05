//! Per-tenant configuration repository.

use async_trait::async_trait;
use domain::models::{ConfigEntry, TablePrefix, TenantSettings};
use domain::services::{ConfigStoreError, TenantConfigWriter};
use sqlx::PgPool;

use crate::entities::ConfigEntity;
use crate::metrics::QueryTimer;

/// Repository for `<prefix>config` tables.
#[derive(Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, prefix: &TablePrefix) -> Result<Vec<ConfigEntry>, sqlx::Error> {
        let timer = QueryTimer::new("list_tenant_config");
        let sql = format!(
            "SELECT config_key, config_value FROM {} ORDER BY config_key",
            prefix.table("config")
        );
        let result = sqlx::query_as::<_, ConfigEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.into_iter().map(ConfigEntry::from).collect())
    }

    pub async fn load_settings(&self, prefix: &TablePrefix) -> Result<TenantSettings, sqlx::Error> {
        Ok(TenantSettings::from_entries(self.list(prefix).await?))
    }

    pub async fn get(&self, prefix: &TablePrefix, key: &str) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("get_tenant_config");
        let sql = format!(
            "SELECT config_value FROM {} WHERE config_key = $1",
            prefix.table("config")
        );
        let result = sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.flatten())
    }

    /// Inserts or replaces one key.
    pub async fn upsert(
        &self,
        prefix: &TablePrefix,
        key: &str,
        value: &str,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_tenant_config");
        let sql = format!(
            r#"
            INSERT INTO {} (config_key, config_value)
            VALUES ($1, $2)
            ON CONFLICT (config_key) DO UPDATE SET config_value = EXCLUDED.config_value
            "#,
            prefix.table("config")
        );
        let result = sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    /// Inserts keys that are not set yet, leaving existing values alone.
    pub async fn insert_defaults(
        &self,
        prefix: &TablePrefix,
        entries: &[(&str, &str)],
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("insert_default_tenant_config");
        let sql = format!(
            "INSERT INTO {} (config_key, config_value) VALUES ($1, $2) ON CONFLICT (config_key) DO NOTHING",
            prefix.table("config")
        );
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for (key, value) in entries {
            inserted += sqlx::query(&sql)
                .bind(*key)
                .bind(*value)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        timer.record();
        Ok(inserted)
    }
}

#[async_trait]
impl TenantConfigWriter for ConfigRepository {
    async fn set(
        &self,
        prefix: &TablePrefix,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigStoreError> {
        self.upsert(prefix, key, value)
            .await
            .map_err(|e| ConfigStoreError(format!("setting '{}' for {}: {}", key, prefix, e)))
    }
}

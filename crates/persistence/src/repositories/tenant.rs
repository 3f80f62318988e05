//! Tenant registry repository.

use async_trait::async_trait;
use domain::models::{Hostname, TablePrefix};
use domain::services::{RegistryError, TenantRegistry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TenantEntity;
use crate::metrics::QueryTimer;

const PREFIX_INDEX: &str = "idx_tenants_table_prefix";
const HOSTNAME_INDEX: &str = "idx_tenants_hostname";
/// Advisory lock serializing tenant reservations.
const RESERVE_LOCK_KEY: i64 = 0x7465_6e61_6e74;

/// Repository for the `tenants` registry table.
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All tenants, master first.
    pub async fn list(&self) -> Result<Vec<TenantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tenants");
        let result = sqlx::query_as::<_, TenantEntity>(
            r#"
            SELECT id, table_prefix, hostname, is_master, status, template, client_url, created_at, updated_at
            FROM tenants
            ORDER BY is_master DESC, created_at, hostname
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an active tenant serving `hostname`.
    pub async fn find_active_by_hostname(
        &self,
        hostname: &str,
    ) -> Result<Option<TenantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_tenant_by_hostname");
        let result = sqlx::query_as::<_, TenantEntity>(
            r#"
            SELECT id, table_prefix, hostname, is_master, status, template, client_url, created_at, updated_at
            FROM tenants
            WHERE hostname = $1 AND status = 'active'
            "#,
        )
        .bind(hostname)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_master(&self) -> Result<Option<TenantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_master_tenant");
        let result = sqlx::query_as::<_, TenantEntity>(
            r#"
            SELECT id, table_prefix, hostname, is_master, status, template, client_url, created_at, updated_at
            FROM tenants
            WHERE is_master
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Registers (or refreshes) the master row at startup.
    pub async fn upsert_master(
        &self,
        prefix: &TablePrefix,
        hostname: &Hostname,
        base_url: &str,
    ) -> Result<TenantEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_master_tenant");
        let result = sqlx::query_as::<_, TenantEntity>(
            r#"
            INSERT INTO tenants (table_prefix, hostname, is_master, status, client_url)
            VALUES ($1, $2, true, 'active', $3)
            ON CONFLICT (table_prefix) DO UPDATE
            SET hostname = EXCLUDED.hostname,
                client_url = EXCLUDED.client_url,
                is_master = true,
                status = 'active',
                updated_at = NOW()
            RETURNING id, table_prefix, hostname, is_master, status, template, client_url, created_at, updated_at
            "#,
        )
        .bind(prefix.as_str())
        .bind(hostname.as_str())
        .bind(base_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts a pending row unless the prefix nests with a registered one.
    ///
    /// The overlap scan and the insert run under a transaction-scoped
    /// advisory lock, so two concurrent reservations cannot both pass it.
    pub async fn insert_pending(
        &self,
        prefix: &TablePrefix,
        hostname: &Hostname,
        template: &str,
        client_url: &str,
    ) -> Result<Uuid, RegistryError> {
        let timer = QueryTimer::new("reserve_tenant");
        let storage = |e: sqlx::Error| registry_error(e, prefix, hostname);

        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(RESERVE_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let registered: Vec<String> = sqlx::query_scalar("SELECT table_prefix FROM tenants")
            .fetch_all(&mut *tx)
            .await
            .map_err(storage)?;
        if let Some(existing) = overlapping_prefix(prefix, &registered) {
            timer.record();
            return Err(if existing == prefix.as_str() {
                RegistryError::PrefixInUse(prefix.to_string())
            } else {
                RegistryError::PrefixOverlaps {
                    prefix: prefix.to_string(),
                    existing: existing.to_string(),
                }
            });
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO tenants (table_prefix, hostname, is_master, status, template, client_url)
            VALUES ($1, $2, false, 'pending', $3, $4)
            RETURNING id
            "#,
        )
        .bind(prefix.as_str())
        .bind(hostname.as_str())
        .bind(template)
        .bind(client_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;
        tx.commit().await.map_err(storage)?;
        timer.record();
        Ok(id)
    }

    pub async fn set_active(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("activate_tenant");
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET status = 'active', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Deletes a pending row. Active tenants are never removed here.
    pub async fn delete_pending(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("release_tenant");
        let result = sqlx::query(
            r#"
            DELETE FROM tenants
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

/// First registered prefix whose table names could collide with `prefix`'s.
fn overlapping_prefix<'a>(prefix: &TablePrefix, registered: &'a [String]) -> Option<&'a str> {
    registered
        .iter()
        .map(String::as_str)
        .find(|existing| {
            TablePrefix::new(*existing).map_or(false, |existing| existing.overlaps(prefix))
        })
}

fn registry_error(err: sqlx::Error, prefix: &TablePrefix, hostname: &Hostname) -> RegistryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some(PREFIX_INDEX) => return RegistryError::PrefixInUse(prefix.to_string()),
                Some(HOSTNAME_INDEX) => return RegistryError::HostnameInUse(hostname.to_string()),
                _ => {}
            }
        }
    }
    RegistryError::Storage(err.to_string())
}

#[async_trait]
impl TenantRegistry for TenantRepository {
    async fn reserve(
        &self,
        prefix: &TablePrefix,
        hostname: &Hostname,
        template: &str,
        client_url: &str,
    ) -> Result<Uuid, RegistryError> {
        self.insert_pending(prefix, hostname, template, client_url)
            .await
    }

    async fn activate(&self, tenant_id: Uuid) -> Result<(), RegistryError> {
        match self.set_active(tenant_id).await {
            Ok(0) => Err(RegistryError::NotFound(tenant_id)),
            Ok(_) => Ok(()),
            Err(e) => Err(RegistryError::Storage(e.to_string())),
        }
    }

    async fn release(&self, tenant_id: Uuid) -> Result<(), RegistryError> {
        self.delete_pending(tenant_id)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(prefixes: &[&str]) -> Vec<String> {
        prefixes.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_overlapping_prefix_finds_nested_prefixes() {
        let rows = registered(&["pmf_", "x_"]);
        let prefix = |p: &str| TablePrefix::new(p).unwrap();

        assert_eq!(overlapping_prefix(&prefix("pmf_user_"), &rows), Some("pmf_"));
        assert_eq!(overlapping_prefix(&prefix("x_faq_data_"), &rows), Some("x_"));
        assert_eq!(overlapping_prefix(&prefix("pmf_"), &rows), Some("pmf_"));
        assert_eq!(overlapping_prefix(&prefix("supp_"), &rows), None);
    }

    #[test]
    fn test_overlapping_prefix_shorter_than_registered() {
        let rows = registered(&["sales_eu_"]);
        let prefix = TablePrefix::new("sales_").unwrap();
        assert_eq!(overlapping_prefix(&prefix, &rows), Some("sales_eu_"));
    }
}

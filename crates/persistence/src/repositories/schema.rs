//! Tenant table set creation, cloning and removal.

use async_trait::async_trait;
use domain::models::TablePrefix;
use domain::services::{SchemaCloneError, SchemaCloner, SchemaStatement};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use crate::metrics::{record_schema_operation, QueryTimer};
use crate::schema::{tenant_ddl, tenant_tables_for_drop};

/// Clones the master's table set for new client tenants.
///
/// PostgreSQL DDL is transactional, so every clone runs in one transaction
/// and a failure leaves no partial table set behind.
#[derive(Clone)]
pub struct SchemaRepository {
    pool: PgPool,
    master: TablePrefix,
    admin_user_id: i64,
}

impl SchemaRepository {
    pub fn new(pool: PgPool, master: TablePrefix, admin_user_id: i64) -> Self {
        Self {
            pool,
            master,
            admin_user_id,
        }
    }

    pub fn master(&self) -> &TablePrefix {
        &self.master
    }

    /// Creates the master's tables if they are missing.
    pub async fn ensure_master_tables(&self) -> Result<(), SchemaCloneError> {
        let timer = QueryTimer::new("ensure_master_tables");
        let mut tx = self.begin().await?;
        create_tables(&mut tx, &self.master, true).await?;
        commit(tx).await?;
        timer.record();
        Ok(())
    }

    /// Number of tables carrying `prefix` in the current schema.
    pub async fn count_tables(&self, prefix: &TablePrefix) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_tenant_tables");
        let tables = tenant_tables_for_drop(prefix);
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = ANY($1)
            "#,
        )
        .bind(&tables)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, SchemaCloneError> {
        self.pool
            .begin()
            .await
            .map_err(|e| SchemaCloneError::new(SchemaStatement::Begin, e.to_string()))
    }

    async fn clone_tables(
        &self,
        prefix: &TablePrefix,
        client_url: &str,
    ) -> Result<(), SchemaCloneError> {
        let mut tx = self.begin().await?;
        create_tables(&mut tx, prefix, false).await?;
        self.copy_seed_rows(&mut tx, prefix, client_url).await?;
        commit(tx).await
    }

    async fn drop_tables(&self, prefix: &TablePrefix) -> Result<(), SchemaCloneError> {
        let mut tx = self.begin().await?;
        for table in tenant_tables_for_drop(prefix) {
            let sql = format!("DROP TABLE IF EXISTS {}", table);
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| SchemaCloneError::new(SchemaStatement::DropTable { table }, e.to_string()))?;
        }
        commit(tx).await
    }

    async fn copy_seed_rows(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        prefix: &TablePrefix,
        client_url: &str,
    ) -> Result<(), SchemaCloneError> {
        let copy_config = format!(
            "INSERT INTO {} SELECT * FROM {}",
            prefix.table("config"),
            self.master.table("config")
        );
        sqlx::query(&copy_config)
            .execute(&mut **tx)
            .await
            .map_err(|e| SchemaCloneError::new(SchemaStatement::CopyConfig, e.to_string()))?;

        let set_reference_url = format!(
            "UPDATE {} SET config_value = $1 WHERE config_key = 'main.referenceURL'",
            prefix.table("config")
        );
        sqlx::query(&set_reference_url)
            .bind(client_url)
            .execute(&mut **tx)
            .await
            .map_err(|e| SchemaCloneError::new(SchemaStatement::SetReferenceUrl, e.to_string()))?;

        let copy_rights = format!(
            "INSERT INTO {} SELECT * FROM {}",
            prefix.table("rights"),
            self.master.table("rights")
        );
        sqlx::query(&copy_rights)
            .execute(&mut **tx)
            .await
            .map_err(|e| SchemaCloneError::new(SchemaStatement::CopyRights, e.to_string()))?;

        let copy_user_rights = format!(
            "INSERT INTO {} SELECT * FROM {} WHERE user_id = $1",
            prefix.table("user_rights"),
            self.master.table("user_rights")
        );
        sqlx::query(&copy_user_rights)
            .bind(self.admin_user_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| SchemaCloneError::new(SchemaStatement::CopyUserRights, e.to_string()))?;

        Ok(())
    }
}

async fn create_tables(
    tx: &mut Transaction<'static, Postgres>,
    prefix: &TablePrefix,
    if_not_exists: bool,
) -> Result<(), SchemaCloneError> {
    for statement in tenant_ddl(prefix, if_not_exists) {
        debug!(table = %statement.table, "Creating tenant table");
        sqlx::query(&statement.sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                SchemaCloneError::new(
                    SchemaStatement::CreateTable {
                        table: statement.table.clone(),
                    },
                    e.to_string(),
                )
            })?;
    }
    Ok(())
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), SchemaCloneError> {
    tx.commit()
        .await
        .map_err(|e| SchemaCloneError::new(SchemaStatement::Commit, e.to_string()))
}

#[async_trait]
impl SchemaCloner for SchemaRepository {
    async fn create_client_tables(
        &self,
        prefix: &TablePrefix,
        client_url: &str,
    ) -> Result<(), SchemaCloneError> {
        if prefix == &self.master {
            return Err(SchemaCloneError::new(
                SchemaStatement::Begin,
                "client prefix equals the master prefix",
            ));
        }

        let timer = QueryTimer::new("clone_tenant_schema");
        let result = self.clone_tables(prefix, client_url).await;
        timer.record();
        record_schema_operation("clone", result.is_ok());
        result?;

        info!(prefix = %prefix, master = %self.master, "Cloned tenant tables from master");
        Ok(())
    }

    async fn drop_client_tables(&self, prefix: &TablePrefix) -> Result<(), SchemaCloneError> {
        if prefix == &self.master {
            return Err(SchemaCloneError::new(
                SchemaStatement::DropTable {
                    table: self.master.table("config"),
                },
                "refusing to drop the master tables",
            ));
        }

        let timer = QueryTimer::new("drop_tenant_schema");
        let result = self.drop_tables(prefix).await;
        timer.record();
        record_schema_operation("drop", result.is_ok());
        result?;

        info!(prefix = %prefix, "Dropped tenant tables");
        Ok(())
    }
}

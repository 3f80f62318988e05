//! Credential repository for one tenant's `user_login` table.

use async_trait::async_trait;
use domain::models::{Credential, TablePrefix};
use domain::services::{AuthError, CredentialStore};
use sqlx::PgPool;

use crate::entities::CredentialEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct CredentialRepository {
    pool: PgPool,
    prefix: TablePrefix,
}

impl CredentialRepository {
    pub fn new(pool: PgPool, prefix: TablePrefix) -> Self {
        Self { pool, prefix }
    }

    fn table(&self) -> String {
        self.prefix.table("user_login")
    }

    pub async fn insert(&self, credential: &Credential) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_credential");
        let sql = format!(
            "INSERT INTO {} (login, pass, domain) VALUES ($1, $2, $3)",
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(&credential.login)
            .bind(&credential.pass_hash)
            .bind(&credential.domain)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn count_by_login(&self, login: &str) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_credentials_by_login");
        let sql = format!("SELECT COUNT(*) FROM {} WHERE login = $1", self.table());
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .bind(login)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Vec<CredentialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_credentials_by_login");
        let sql = format!(
            "SELECT login, pass, domain FROM {} WHERE login = $1",
            self.table()
        );
        let result = sqlx::query_as::<_, CredentialEntity>(&sql)
            .bind(login)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn update_pass(
        &self,
        login: &str,
        old_hash: Option<&str>,
        new_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_credential_pass");
        let table = self.table();
        let result = match old_hash {
            Some(old_hash) => {
                let sql = format!(
                    "UPDATE {} SET pass = $1 WHERE login = $2 AND pass = $3",
                    table
                );
                sqlx::query(&sql)
                    .bind(new_hash)
                    .bind(login)
                    .bind(old_hash)
                    .execute(&self.pool)
                    .await
            }
            None => {
                let sql = format!("UPDATE {} SET pass = $1 WHERE login = $2", table);
                sqlx::query(&sql)
                    .bind(new_hash)
                    .bind(login)
                    .execute(&self.pool)
                    .await
            }
        };
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn delete_by_login(&self, login: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_credentials_by_login");
        let sql = format!("DELETE FROM {} WHERE login = $1", self.table());
        let result = sqlx::query(&sql).bind(login).execute(&self.pool).await;
        timer.record();
        Ok(result?.rows_affected())
    }
}

fn storage_error(err: sqlx::Error) -> AuthError {
    AuthError::Storage(err.to_string())
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    async fn insert(&self, credential: &Credential) -> Result<(), AuthError> {
        CredentialRepository::insert(self, credential)
            .await
            .map_err(storage_error)
    }

    async fn count(&self, login: &str) -> Result<i64, AuthError> {
        self.count_by_login(login).await.map_err(storage_error)
    }

    async fn find_by_login(&self, login: &str) -> Result<Vec<Credential>, AuthError> {
        CredentialRepository::find_by_login(self, login)
            .await
            .map(|rows| rows.into_iter().map(Credential::from).collect())
            .map_err(storage_error)
    }

    async fn replace_hash(
        &self,
        login: &str,
        old_hash: &str,
        new_hash: &str,
    ) -> Result<u64, AuthError> {
        self.update_pass(login, Some(old_hash), new_hash)
            .await
            .map_err(storage_error)
    }

    async fn set_hash(&self, login: &str, new_hash: &str) -> Result<u64, AuthError> {
        self.update_pass(login, None, new_hash)
            .await
            .map_err(storage_error)
    }

    async fn delete(&self, login: &str) -> Result<u64, AuthError> {
        self.delete_by_login(login).await.map_err(storage_error)
    }
}

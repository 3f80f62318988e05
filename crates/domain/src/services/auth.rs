//! Credential authentication drivers.
//!
//! A driver is bound to one tenant and selected by the `auth.driver`
//! setting. The database driver checks the tenant's `user_login` table; the
//! HTTP driver trusts the user a reverse proxy has already authenticated.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use shared::password::{hash_password, needs_rehash, verify_stored_password, PasswordError};

use crate::models::credential::Credential;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login '{0}' already exists")]
    DuplicateLogin(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("operation not supported by the {0} auth driver")]
    NotSupported(AuthDriverKind),

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthDriverKind {
    Database,
    Http,
}

impl fmt::Display for AuthDriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthDriverKind::Database => write!(f, "database"),
            AuthDriverKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for AuthDriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(AuthDriverKind::Database),
            "http" => Ok(AuthDriverKind::Http),
            other => Err(format!("unknown auth driver '{}'", other)),
        }
    }
}

/// Authentication operations every driver offers.
#[async_trait]
pub trait AuthDriver: Send + Sync {
    fn kind(&self) -> AuthDriverKind;

    async fn add(&self, login: &str, password: &str, domain: &str) -> Result<(), AuthError>;

    /// Number of rows stored for `login`.
    async fn check_login(&self, login: &str) -> Result<i64, AuthError>;

    /// Verifies a login, reporting why it failed.
    async fn verify(&self, login: &str, password: &str) -> Result<(), AuthError>;

    /// Like [`AuthDriver::verify`], but a failed login is `Ok(false)`.
    async fn check_password(&self, login: &str, password: &str) -> Result<bool, AuthError> {
        match self.verify(login, password).await {
            Ok(()) => Ok(true),
            Err(AuthError::UserNotFound(_)) | Err(AuthError::IncorrectPassword) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn change_password(&self, login: &str, password: &str) -> Result<(), AuthError>;

    async fn delete(&self, login: &str) -> Result<(), AuthError>;
}

/// Storage of a tenant's credential rows.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a row. `user_login.login` carries no unique index because
    /// legacy tables may already hold duplicates, so this never fails with
    /// [`AuthError::DuplicateLogin`].
    async fn insert(&self, credential: &Credential) -> Result<(), AuthError>;

    async fn count(&self, login: &str) -> Result<i64, AuthError>;

    async fn find_by_login(&self, login: &str) -> Result<Vec<Credential>, AuthError>;

    /// Replaces one specific stored hash; returns rows updated.
    async fn replace_hash(
        &self,
        login: &str,
        old_hash: &str,
        new_hash: &str,
    ) -> Result<u64, AuthError>;

    /// Sets the hash of every row for `login`; returns rows updated.
    async fn set_hash(&self, login: &str, new_hash: &str) -> Result<u64, AuthError>;

    async fn delete(&self, login: &str) -> Result<u64, AuthError>;
}

/// Driver backed by the tenant's credential table.
pub struct DatabaseAuth {
    store: Arc<dyn CredentialStore>,
    force_password_update: bool,
}

impl DatabaseAuth {
    pub fn new(store: Arc<dyn CredentialStore>, force_password_update: bool) -> Self {
        Self {
            store,
            force_password_update,
        }
    }

    async fn upgrade_hash(&self, row: &Credential, password: &str) -> Result<(), AuthError> {
        let new_hash = hash_password(password)?;
        let updated = self
            .store
            .replace_hash(&row.login, &row.pass_hash, &new_hash)
            .await?;
        info!(login = %row.login, updated, "Re-hashed password with current scheme");
        Ok(())
    }
}

#[async_trait]
impl AuthDriver for DatabaseAuth {
    fn kind(&self) -> AuthDriverKind {
        AuthDriverKind::Database
    }

    async fn add(&self, login: &str, password: &str, domain: &str) -> Result<(), AuthError> {
        // Check-then-insert: two concurrent adds of one login can both land,
        // which the login check tolerates like any legacy duplicate.
        if self.store.count(login).await? > 0 {
            warn!(login = %login, "Refusing to add duplicate login");
            return Err(AuthError::DuplicateLogin(login.to_string()));
        }

        let credential = Credential {
            login: login.to_string(),
            pass_hash: hash_password(password)?,
            domain: domain.to_string(),
        };
        self.store.insert(&credential).await
    }

    async fn check_login(&self, login: &str) -> Result<i64, AuthError> {
        self.store.count(login).await
    }

    async fn verify(&self, login: &str, password: &str) -> Result<(), AuthError> {
        let rows = self.store.find_by_login(login).await?;

        if rows.is_empty() {
            warn!(login = %login, "Login failed: user not found");
            return Err(AuthError::UserNotFound(login.to_string()));
        }
        if rows.len() > 1 {
            error!(
                login = %login,
                rows = rows.len(),
                "Duplicate login rows; accepting the first whose password verifies"
            );
        }

        for row in &rows {
            let verified = match verify_stored_password(login, password, &row.pass_hash) {
                Ok(verified) => verified,
                Err(e) => {
                    warn!(login = %login, error = %e, "Skipping credential row with unreadable hash");
                    false
                }
            };
            if !verified {
                continue;
            }

            if self.force_password_update && needs_rehash(&row.pass_hash) {
                self.upgrade_hash(row, password).await?;
            }
            return Ok(());
        }

        warn!(login = %login, "Login failed: incorrect password");
        Err(AuthError::IncorrectPassword)
    }

    async fn change_password(&self, login: &str, password: &str) -> Result<(), AuthError> {
        let new_hash = hash_password(password)?;
        if self.store.set_hash(login, &new_hash).await? == 0 {
            return Err(AuthError::UserNotFound(login.to_string()));
        }
        info!(login = %login, "Password changed");
        Ok(())
    }

    async fn delete(&self, login: &str) -> Result<(), AuthError> {
        if self.store.delete(login).await? == 0 {
            return Err(AuthError::UserNotFound(login.to_string()));
        }
        info!(login = %login, "Credential deleted");
        Ok(())
    }
}

/// Driver that trusts the user a reverse proxy authenticated.
///
/// Credentials live in the proxy, so this driver can't manage them.
pub struct HttpAuth {
    remote_user: Option<String>,
}

impl HttpAuth {
    pub fn new(remote_user: Option<String>) -> Self {
        Self {
            remote_user: remote_user.filter(|u| !u.is_empty()),
        }
    }
}

#[async_trait]
impl AuthDriver for HttpAuth {
    fn kind(&self) -> AuthDriverKind {
        AuthDriverKind::Http
    }

    async fn add(&self, _login: &str, _password: &str, _domain: &str) -> Result<(), AuthError> {
        Err(AuthError::NotSupported(AuthDriverKind::Http))
    }

    async fn check_login(&self, login: &str) -> Result<i64, AuthError> {
        Ok(i64::from(self.remote_user.as_deref() == Some(login)))
    }

    async fn verify(&self, login: &str, _password: &str) -> Result<(), AuthError> {
        match self.remote_user.as_deref() {
            None => {
                warn!(login = %login, "Login failed: no authenticated user from proxy");
                Err(AuthError::UserNotFound(login.to_string()))
            }
            Some(user) if user == login => Ok(()),
            Some(user) => {
                warn!(login = %login, remote_user = %user, "Login failed: proxy user mismatch");
                Err(AuthError::IncorrectPassword)
            }
        }
    }

    async fn change_password(&self, _login: &str, _password: &str) -> Result<(), AuthError> {
        Err(AuthError::NotSupported(AuthDriverKind::Http))
    }

    async fn delete(&self, _login: &str) -> Result<(), AuthError> {
        Err(AuthError::NotSupported(AuthDriverKind::Http))
    }
}

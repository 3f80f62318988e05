//! Login credential entity.

use domain::models::Credential;
use sqlx::FromRow;

/// Database row mapping for a `<prefix>user_login` table.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialEntity {
    pub login: String,
    pub pass: Option<String>,
    pub domain: Option<String>,
}

impl From<CredentialEntity> for Credential {
    fn from(entity: CredentialEntity) -> Self {
        Self {
            login: entity.login,
            pass_hash: entity.pass.unwrap_or_default(),
            domain: entity.domain.unwrap_or_default(),
        }
    }
}

//! Auth driver selection.
//!
//! The driver is chosen per request from `auth.driver`: the `database`
//! driver works against the resolved tenant's `user_login` table, the `http`
//! driver trusts the user named by the reverse proxy header.

use axum::http::HeaderMap;
use domain::models::TablePrefix;
use domain::services::{AuthDriver, AuthDriverKind, DatabaseAuth, HttpAuth};
use persistence::repositories::CredentialRepository;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AuthConfig;

/// Everything needed to build the driver for one request.
pub struct DriverContext<'a> {
    pub pool: &'a PgPool,
    pub prefix: &'a TablePrefix,
    pub force_password_update: bool,
    pub headers: &'a HeaderMap,
}

/// Builds the configured driver for the tenant in `ctx`.
pub fn select_driver(config: &AuthConfig, ctx: DriverContext<'_>) -> Arc<dyn AuthDriver> {
    match config.driver {
        AuthDriverKind::Database => {
            let store = CredentialRepository::new(ctx.pool.clone(), ctx.prefix.clone());
            Arc::new(DatabaseAuth::new(
                Arc::new(store),
                ctx.force_password_update,
            ))
        }
        AuthDriverKind::Http => Arc::new(HttpAuth::new(remote_user(
            ctx.headers,
            &config.http_user_header,
        ))),
    }
}

fn remote_user(headers: &HeaderMap, header: &str) -> Option<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_remote_user_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(remote_user(&headers, "X-Remote-User"), None);

        headers.insert("X-Remote-User", HeaderValue::from_static("  alice "));
        assert_eq!(remote_user(&headers, "X-Remote-User"), Some("alice".to_string()));
        assert_eq!(remote_user(&headers, "X-Other"), None);

        headers.insert("X-Remote-User", HeaderValue::from_static(""));
        assert_eq!(remote_user(&headers, "X-Remote-User"), None);
    }

    #[tokio::test]
    async fn test_http_driver_selected() {
        let config = AuthConfig {
            driver: AuthDriverKind::Http,
            http_user_header: "X-Remote-User".to_string(),
        };
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let prefix = TablePrefix::new("pmf_").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("X-Remote-User", HeaderValue::from_static("alice"));

        let driver = select_driver(
            &config,
            DriverContext {
                pool: &pool,
                prefix: &prefix,
                force_password_update: false,
                headers: &headers,
            },
        );
        assert_eq!(driver.kind(), AuthDriverKind::Http);
        assert!(driver.check_password("alice", "anything").await.unwrap());
    }
}

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::{InstanceOrchestrator, MailTransport, Notifier};
use persistence::repositories::{ConfigRepository, SchemaRepository, TenantRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, ConfigValidationError};
use crate::middleware::{metrics_handler, metrics_middleware, require_admin, trace_id};
use crate::routes::{auth, categories, health, instances, links, questions, seo};
use crate::services::{EmailTransport, FilesystemProvisioner};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub tenants: TenantRepository,
    pub config_store: ConfigRepository,
    pub orchestrator: Arc<InstanceOrchestrator>,
    pub notifier: Notifier,
}

impl AppState {
    /// Wires repositories, filesystem and mail transport into the services.
    pub fn new(
        config: Config,
        pool: PgPool,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, ConfigValidationError> {
        let master = config.master_prefix()?;
        let tenants = TenantRepository::new(pool.clone());
        let config_store = ConfigRepository::new(pool.clone());
        let schema = SchemaRepository::new(
            pool.clone(),
            master,
            config.tenancy.bootstrap_admin_user_id,
        );
        let filesystem = FilesystemProvisioner::new(
            config.tenancy.multisite_root.clone(),
            config.tenancy.source_root.clone(),
        );

        let orchestrator = InstanceOrchestrator::new(
            Arc::new(tenants.clone()),
            Arc::new(schema),
            Arc::new(filesystem),
            Arc::new(config_store.clone()),
            config.tenancy.rollback_on_failure,
        );

        Ok(Self {
            pool,
            config: Arc::new(config),
            tenants,
            config_store,
            orchestrator: Arc::new(orchestrator),
            notifier: Notifier::new(transport),
        })
    }
}

/// Builds the application with the configured email provider.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, ConfigValidationError> {
    let transport = Arc::new(EmailTransport::new(config.email.clone()));
    let state = AppState::new(config, pool, transport)?;
    Ok(router(state))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Development: any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    // Admin routes (require admin API key)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/instances",
            post(instances::create_instance).get(instances::list_instances),
        )
        .route("/api/v1/auth/credentials", post(auth::add_credential))
        .route(
            "/api/v1/auth/credentials/:login/password",
            put(auth::change_password),
        )
        .route(
            "/api/v1/auth/credentials/:login",
            delete(auth::delete_credential),
        )
        .route(
            "/api/v1/categories/:id/relations",
            post(categories::add_relation).delete(categories::delete_relations),
        )
        .route(
            "/api/v1/questions/answered",
            post(questions::question_answered),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Tenant routes, resolved from the Host header
    let tenant_routes = Router::new()
        .route("/api/v1/categories/matrix", get(categories::category_matrix))
        .route("/api/v1/categories/counts", get(categories::category_counts))
        .route("/api/v1/faqs/:id/categories", get(categories::record_categories))
        .route("/api/v1/faqs/:id/mail-info", get(categories::record_mail_info))
        .route("/api/v1/faqs/:id/links", get(links::faq_links))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/seo/robots", get(seo::meta_robots))
        .route("/opensearch.xml", get(seo::opensearch_descriptor));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(tenant_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}

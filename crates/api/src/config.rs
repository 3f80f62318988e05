use domain::models::{Hostname, TablePrefix};
use domain::services::AuthDriverKind;
use serde::Deserialize;
use shared::crypto::is_sha256_hex;
use shared::validation::validate_base_url;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub tenancy: TenancyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Hex SHA-256 of the admin API key. Admin routes are closed when empty.
    #[serde(default)]
    pub admin_api_key_hash: String,
}

/// Multisite layout: where the master lives and where clients are created.
#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    #[serde(default = "default_master_prefix")]
    pub master_prefix: String,

    #[serde(default = "default_master_hostname")]
    pub master_hostname: String,

    /// Base URL of the master instance, ending with `/`.
    #[serde(default = "default_master_url")]
    pub master_url: String,

    #[serde(default = "default_master_title")]
    pub master_title: String,

    #[serde(default)]
    pub master_admin_email: String,

    /// Directory that holds one sub-directory per client hostname.
    #[serde(default = "default_multisite_root")]
    pub multisite_root: PathBuf,

    /// Installation root holding `config/constants` and `assets/themes/`.
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Master user whose rights are copied into new clients.
    #[serde(default = "default_bootstrap_admin_user_id")]
    pub bootstrap_admin_user_id: i64,

    #[serde(default = "default_rollback_on_failure")]
    pub rollback_on_failure: bool,

    #[serde(default = "default_template")]
    pub default_template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_driver")]
    pub driver: AuthDriverKind,

    /// Header carrying the proxy-authenticated user for the `http` driver.
    #[serde(default = "default_http_user_header")]
    pub http_user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            driver: default_auth_driver(),
            http_user_header: default_http_user_header(),
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: sendgrid or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    #[serde(default = "default_sendgrid_api_url")]
    pub sendgrid_api_url: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sendgrid_api_url: default_sendgrid_api_url(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_master_prefix() -> String {
    "pmf_".to_string()
}
fn default_master_hostname() -> String {
    "localhost".to_string()
}
fn default_master_url() -> String {
    "http://localhost:8080/".to_string()
}
fn default_master_title() -> String {
    "phpMyFAQ Codename Pontus".to_string()
}
fn default_multisite_root() -> PathBuf {
    PathBuf::from("multisite")
}
fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_bootstrap_admin_user_id() -> i64 {
    1
}
fn default_rollback_on_failure() -> bool {
    true
}
fn default_template() -> String {
    "default".to_string()
}
fn default_auth_driver() -> AuthDriverKind {
    AuthDriverKind::Database
}
fn default_http_user_header() -> String {
    "X-Remote-User".to_string()
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sendgrid_api_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}
fn default_sender_email() -> String {
    "noreply@example.com".to_string()
}
fn default_sender_name() -> String {
    "FAQ".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FAQ__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FAQ")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a config from embedded defaults plus overrides, without files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            admin_api_key_hash = ""

            [tenancy]
            master_prefix = "pmf_"
            master_hostname = "localhost"
            master_url = "http://localhost:8080/"
            master_title = "Test FAQ"
            master_admin_email = "admin@example.com"
            multisite_root = "multisite"
            source_root = "."
            bootstrap_admin_user_id = 1
            rollback_on_failure = true
            default_template = "default"

            [auth]
            driver = "database"
            http_user_header = "X-Remote-User"

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Skip validation to allow partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FAQ__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        self.master_prefix()?;
        self.master_hostname()?;
        validate_base_url(&self.tenancy.master_url).map_err(|e| {
            ConfigValidationError::InvalidValue(format!("tenancy.master_url: {}", e))
        })?;

        if !self.security.admin_api_key_hash.is_empty()
            && !is_sha256_hex(&self.security.admin_api_key_hash)
        {
            return Err(ConfigValidationError::InvalidValue(
                "security.admin_api_key_hash must be a hex SHA-256 digest".to_string(),
            ));
        }

        if self.email.enabled
            && self.email.provider == "sendgrid"
            && self.email.sendgrid_api_key.is_empty()
        {
            return Err(ConfigValidationError::MissingRequired(
                "email.sendgrid_api_key is required for the sendgrid provider".to_string(),
            ));
        }

        Ok(())
    }

    pub fn master_prefix(&self) -> Result<TablePrefix, ConfigValidationError> {
        TablePrefix::new(self.tenancy.master_prefix.as_str()).map_err(|e| {
            ConfigValidationError::InvalidValue(format!("tenancy.master_prefix: {}", e))
        })
    }

    pub fn master_hostname(&self) -> Result<Hostname, ConfigValidationError> {
        Hostname::new(self.tenancy.master_hostname.as_str()).map_err(|e| {
            ConfigValidationError::InvalidValue(format!("tenancy.master_hostname: {}", e))
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!(
                    "Invalid socket address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }
}

//! Tenant (instance) domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::validation::{
    validate_base_url, validate_hostname, validate_table_prefix, validate_theme_name,
};

/// SQL table prefix identifying one tenant's table set, e.g. `pmf_`.
///
/// The prefix is interpolated into table identifiers, so it can only be
/// constructed through validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TablePrefix(String);

impl TablePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        validate_table_prefix(&prefix)?;
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified table name for this tenant, e.g. `pmf_config`.
    pub fn table(&self, name: &str) -> String {
        format!("{}{}", self.0, name)
    }

    /// True when one prefix starts with the other, so `{self}{table}` can
    /// name the same table as `{other}{table2}` (`pmf_` and `pmf_user_`).
    pub fn overlaps(&self, other: &TablePrefix) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }
}

impl fmt::Display for TablePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TablePrefix {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for TablePrefix {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TablePrefix::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Hostname of a tenant; doubles as the tenant's directory name under the
/// multisite root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(hostname: impl Into<String>) -> Result<Self, ValidationError> {
        let hostname = hostname.into().to_ascii_lowercase();
        validate_hostname(&hostname)?;
        Ok(Self(hostname))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Hostname {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Hostname::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Reserved by an in-flight (or failed) provisioning run; not routable.
    Pending,
    /// Fully provisioned and visible to request routing.
    Active,
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TenantStatus::Pending),
            "active" => Ok(TenantStatus::Active),
            _ => Err(format!("Unknown tenant status: {}", s)),
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantStatus::Pending => write!(f, "pending"),
            TenantStatus::Active => write!(f, "active"),
        }
    }
}

/// Tenant registry entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub table_prefix: TablePrefix,
    pub hostname: Hostname,
    pub is_master: bool,
    pub status: TenantStatus,
    pub template: String,
    pub client_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to provision a new client instance.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[validate(custom(function = "validate_hostname"))]
    pub hostname: String,

    #[validate(custom(function = "validate_table_prefix"))]
    pub table_prefix: String,

    /// Theme to copy; the server's default template when absent.
    #[validate(custom(function = "validate_theme_name"))]
    #[serde(default)]
    pub template: Option<String>,

    #[validate(custom(function = "validate_base_url"))]
    pub client_url: String,
}

impl ProvisionRequest {
    pub fn template_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.template.as_deref().unwrap_or(default)
    }

    /// Validated typed identifiers for the orchestrator.
    pub fn identifiers(&self) -> Result<(Hostname, TablePrefix), ValidationError> {
        Ok((
            Hostname::new(self.hostname.as_str())?,
            TablePrefix::new(self.table_prefix.as_str())?,
        ))
    }
}

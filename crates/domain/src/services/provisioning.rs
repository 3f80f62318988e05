//! Client instance provisioning.
//!
//! Provisioning a client tenant runs these steps in order:
//!
//! 1. validate identifiers and reserve prefix + hostname in the registry
//! 2. create the tenant directory under the multisite root
//! 3. clone the master's table set under the new prefix
//! 4. copy the constants file and the theme tree into the directory
//! 5. mark the tenant as a client and point `main.referenceURL` at it
//! 6. activate the registry row
//!
//! A failing step aborts the remaining ones. Completed steps are undone in
//! reverse order when rollback is enabled; otherwise they are left in place
//! and reported so an operator can clean up or retry.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared::validation::{validate_base_url, validate_theme_name};

use crate::models::config::keys;
use crate::models::tenant::{Hostname, TablePrefix};

/// A provisioning step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStep {
    Validate,
    CreateDirectory,
    CloneSchema,
    CopyAssets,
    ConfigureTenant,
    Activate,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionStep::Validate => "validate",
            ProvisionStep::CreateDirectory => "create_directory",
            ProvisionStep::CloneSchema => "clone_schema",
            ProvisionStep::CopyAssets => "copy_assets",
            ProvisionStep::ConfigureTenant => "configure_tenant",
            ProvisionStep::Activate => "activate",
        };
        f.write_str(name)
    }
}

/// Statement of the schema clone that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatement {
    Begin,
    CreateTable { table: String },
    CopyConfig,
    SetReferenceUrl,
    CopyRights,
    CopyUserRights,
    Commit,
    DropTable { table: String },
}

impl fmt::Display for SchemaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStatement::Begin => write!(f, "BEGIN"),
            SchemaStatement::CreateTable { table } => write!(f, "CREATE TABLE {}", table),
            SchemaStatement::CopyConfig => write!(f, "copy master config"),
            SchemaStatement::SetReferenceUrl => write!(f, "set main.referenceURL"),
            SchemaStatement::CopyRights => write!(f, "copy master rights"),
            SchemaStatement::CopyUserRights => write!(f, "copy bootstrap admin user rights"),
            SchemaStatement::Commit => write!(f, "COMMIT"),
            SchemaStatement::DropTable { table } => write!(f, "DROP TABLE {}", table),
        }
    }
}

#[derive(Debug, Error)]
#[error("schema clone failed at '{statement}': {message}")]
pub struct SchemaCloneError {
    pub statement: SchemaStatement,
    pub message: String,
}

impl SchemaCloneError {
    pub fn new(statement: SchemaStatement, message: impl Into<String>) -> Self {
        Self {
            statement,
            message: message.into(),
        }
    }
}

/// Filesystem errors raised while provisioning.
#[derive(Debug, Error)]
pub enum ProvisionIoError {
    #[error("source path does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionIoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProvisionIoError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("table prefix '{0}' is already in use")]
    PrefixInUse(String),

    #[error("table prefix '{prefix}' overlaps registered prefix '{existing}'")]
    PrefixOverlaps { prefix: String, existing: String },

    #[error("hostname '{0}' is already in use")]
    HostnameInUse(String),

    #[error("tenant {0} not found")]
    NotFound(Uuid),

    #[error("registry storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
#[error("tenant config storage error: {0}")]
pub struct ConfigStoreError(pub String);

/// Why provisioning stopped.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Prefix or hostname already registered, or the prefix nests with a
    /// registered one; a validation failure too.
    #[error("validation failed: {0}")]
    InUse(RegistryError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("could not create tenant directory for '{hostname}': {reason}")]
    DirectoryCreate { hostname: String, reason: String },

    #[error(transparent)]
    SchemaClone(#[from] SchemaCloneError),

    #[error("copying tenant files failed: {0}")]
    Io(#[from] ProvisionIoError),

    #[error("configuring tenant failed: {0}")]
    Configuration(#[from] ConfigStoreError),
}

impl ProvisionError {
    /// True for every error raised before anything was mutated.
    pub fn is_validation(&self) -> bool {
        matches!(self, ProvisionError::Validation(_) | ProvisionError::InUse(_))
    }
}

/// Something provisioning created that outlives a failed run unless undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Reservation { tenant_id: Uuid },
    Directory { path: PathBuf },
    CopiedFiles { path: PathBuf },
    Tables { prefix: String },
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Reservation { tenant_id } => write!(f, "registry reservation {}", tenant_id),
            Artifact::Directory { path } => write!(f, "directory {}", path.display()),
            Artifact::CopiedFiles { path } => write!(f, "copied files in {}", path.display()),
            Artifact::Tables { prefix } => write!(f, "tables with prefix {}", prefix),
        }
    }
}

/// A failed provisioning run.
#[derive(Debug, Error)]
#[error("provisioning failed at step '{step}': {error}")]
pub struct ProvisionFailure {
    pub step: ProvisionStep,
    #[source]
    pub error: ProvisionError,
    /// Artifacts that were removed by compensation.
    pub rolled_back: Vec<Artifact>,
    /// Artifacts still present and needing manual cleanup.
    pub left_behind: Vec<Artifact>,
}

/// A fully provisioned client tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResult {
    pub tenant_id: Uuid,
    pub table_prefix: TablePrefix,
    pub hostname: Hostname,
    pub template: String,
    pub client_url: String,
    pub directory: PathBuf,
    pub theme_files_copied: usize,
}

/// Outcome of creating the tenant directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    Created(PathBuf),
    /// Re-running on an existing directory is a no-op success.
    AlreadyExisted(PathBuf),
    /// The multisite root is missing or not writable.
    RootUnavailable(PathBuf),
}

/// Registry of tenants keyed by unique prefix and hostname.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Inserts a pending row; fails if prefix or hostname is taken.
    async fn reserve(
        &self,
        prefix: &TablePrefix,
        hostname: &Hostname,
        template: &str,
        client_url: &str,
    ) -> Result<Uuid, RegistryError>;

    async fn activate(&self, tenant_id: Uuid) -> Result<(), RegistryError>;

    async fn release(&self, tenant_id: Uuid) -> Result<(), RegistryError>;
}

/// Creates and removes a tenant's table set.
#[async_trait]
pub trait SchemaCloner: Send + Sync {
    async fn create_client_tables(
        &self,
        prefix: &TablePrefix,
        client_url: &str,
    ) -> Result<(), SchemaCloneError>;

    async fn drop_client_tables(&self, prefix: &TablePrefix) -> Result<(), SchemaCloneError>;
}

/// Tenant directory operations under the multisite root.
#[async_trait]
pub trait TenantFilesystem: Send + Sync {
    async fn create_tenant_directory(
        &self,
        hostname: &Hostname,
    ) -> Result<DirectoryOutcome, ProvisionIoError>;

    /// Copies the constants file to `dest`, returning bytes written.
    async fn copy_config_file(&self, dest: &Path) -> Result<u64, ProvisionIoError>;

    /// Copies a theme into `<dest_root>/assets/themes/`, returning files copied.
    async fn copy_theme_tree(&self, dest_root: &Path, theme: &str)
        -> Result<usize, ProvisionIoError>;

    async fn remove_directory(&self, path: &Path) -> Result<(), ProvisionIoError>;
}

/// Per-tenant configuration writes.
#[async_trait]
pub trait TenantConfigWriter: Send + Sync {
    async fn set(&self, prefix: &TablePrefix, key: &str, value: &str)
        -> Result<(), ConfigStoreError>;
}

/// File name of the copied constants file inside a tenant directory.
pub const CONSTANTS_FILE_NAME: &str = "constants";

/// Coordinates registry, schema, filesystem and config into one client.
#[derive(Clone)]
pub struct InstanceOrchestrator {
    registry: Arc<dyn TenantRegistry>,
    schema: Arc<dyn SchemaCloner>,
    filesystem: Arc<dyn TenantFilesystem>,
    config: Arc<dyn TenantConfigWriter>,
    rollback_on_failure: bool,
}

struct Run {
    step: ProvisionStep,
    completed: Vec<Artifact>,
}

impl Run {
    fn enter(&mut self, step: ProvisionStep) {
        self.step = step;
    }
}

impl InstanceOrchestrator {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        schema: Arc<dyn SchemaCloner>,
        filesystem: Arc<dyn TenantFilesystem>,
        config: Arc<dyn TenantConfigWriter>,
        rollback_on_failure: bool,
    ) -> Self {
        Self {
            registry,
            schema,
            filesystem,
            config,
            rollback_on_failure,
        }
    }

    /// Provisions a client tenant from the master.
    pub async fn provision_client(
        &self,
        hostname: &str,
        table_prefix: &str,
        template: &str,
        client_url: &str,
    ) -> Result<ProvisionResult, ProvisionFailure> {
        let mut run = Run {
            step: ProvisionStep::Validate,
            completed: Vec::new(),
        };

        match self
            .run_steps(&mut run, hostname, table_prefix, template, client_url)
            .await
        {
            Ok(result) => {
                info!(
                    tenant_id = %result.tenant_id,
                    prefix = %result.table_prefix,
                    hostname = %result.hostname,
                    theme_files = result.theme_files_copied,
                    "Client instance provisioned"
                );
                Ok(result)
            }
            Err(err) => Err(self.fail(run, err, hostname, table_prefix).await),
        }
    }

    async fn run_steps(
        &self,
        run: &mut Run,
        hostname: &str,
        table_prefix: &str,
        template: &str,
        client_url: &str,
    ) -> Result<ProvisionResult, ProvisionError> {
        // 1. validate + reserve
        let hostname = Hostname::new(hostname)
            .map_err(|e| ProvisionError::Validation(format!("hostname: {}", e)))?;
        let prefix = TablePrefix::new(table_prefix)
            .map_err(|e| ProvisionError::Validation(format!("table prefix: {}", e)))?;
        validate_theme_name(template)
            .map_err(|e| ProvisionError::Validation(format!("template: {}", e)))?;
        validate_base_url(client_url)
            .map_err(|e| ProvisionError::Validation(format!("client URL: {}", e)))?;

        let tenant_id = self
            .registry
            .reserve(&prefix, &hostname, template, client_url)
            .await
            .map_err(|e| match e {
                RegistryError::PrefixInUse(_)
                | RegistryError::PrefixOverlaps { .. }
                | RegistryError::HostnameInUse(_) => ProvisionError::InUse(e),
                other => ProvisionError::Registry(other),
            })?;
        run.completed.push(Artifact::Reservation { tenant_id });
        info!(%tenant_id, prefix = %prefix, hostname = %hostname, "Reserved tenant identifiers");

        // 2. directory
        run.enter(ProvisionStep::CreateDirectory);
        let directory = match self.filesystem.create_tenant_directory(&hostname).await {
            Ok(DirectoryOutcome::Created(path)) => {
                run.completed.push(Artifact::Directory { path: path.clone() });
                path
            }
            Ok(DirectoryOutcome::AlreadyExisted(path)) => {
                warn!(path = %path.display(), "Tenant directory already exists, reusing it");
                path
            }
            Ok(DirectoryOutcome::RootUnavailable(root)) => {
                return Err(ProvisionError::DirectoryCreate {
                    hostname: hostname.to_string(),
                    reason: format!("multisite root {} is not writable", root.display()),
                });
            }
            Err(e) => {
                return Err(ProvisionError::DirectoryCreate {
                    hostname: hostname.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        // 3. tables
        run.enter(ProvisionStep::CloneSchema);
        self.schema.create_client_tables(&prefix, client_url).await?;
        run.completed.push(Artifact::Tables {
            prefix: prefix.to_string(),
        });

        // 4. constants + theme
        run.enter(ProvisionStep::CopyAssets);
        if !run
            .completed
            .iter()
            .any(|a| matches!(a, Artifact::Directory { .. }))
        {
            run.completed.push(Artifact::CopiedFiles {
                path: directory.clone(),
            });
        }
        self.filesystem
            .copy_config_file(&directory.join(CONSTANTS_FILE_NAME))
            .await?;
        let theme_files_copied = self.filesystem.copy_theme_tree(&directory, template).await?;

        // 5. client config
        run.enter(ProvisionStep::ConfigureTenant);
        self.config.set(&prefix, keys::IS_MASTER, "false").await?;
        self.config
            .set(&prefix, keys::REFERENCE_URL, client_url)
            .await?;

        // 6. visible
        run.enter(ProvisionStep::Activate);
        self.registry.activate(tenant_id).await?;

        Ok(ProvisionResult {
            tenant_id,
            table_prefix: prefix,
            hostname,
            template: template.to_string(),
            client_url: client_url.to_string(),
            directory,
            theme_files_copied,
        })
    }

    async fn fail(
        &self,
        run: Run,
        error: ProvisionError,
        hostname: &str,
        table_prefix: &str,
    ) -> ProvisionFailure {
        error!(
            step = %run.step,
            prefix = %table_prefix,
            hostname = %hostname,
            error = %error,
            artifacts = ?run.completed,
            "Client provisioning failed"
        );

        if !self.rollback_on_failure {
            for artifact in &run.completed {
                warn!(%artifact, "Leaving artifact of failed provisioning in place");
            }
            return ProvisionFailure {
                step: run.step,
                error,
                rolled_back: Vec::new(),
                left_behind: run.completed,
            };
        }

        let mut rolled_back = Vec::new();
        let mut left_behind = Vec::new();
        for artifact in run.completed.into_iter().rev() {
            match self.compensate(&artifact).await {
                Ok(()) => {
                    info!(%artifact, "Rolled back provisioning artifact");
                    rolled_back.push(artifact);
                }
                Err(reason) => {
                    error!(%artifact, %reason, "Rollback of provisioning artifact failed");
                    left_behind.push(artifact);
                }
            }
        }

        ProvisionFailure {
            step: run.step,
            error,
            rolled_back,
            left_behind,
        }
    }

    async fn compensate(&self, artifact: &Artifact) -> Result<(), String> {
        match artifact {
            Artifact::Reservation { tenant_id } => self
                .registry
                .release(*tenant_id)
                .await
                .map_err(|e| e.to_string()),
            Artifact::Directory { path } => self
                .filesystem
                .remove_directory(path)
                .await
                .map_err(|e| e.to_string()),
            Artifact::Tables { prefix } => {
                let prefix = TablePrefix::new(prefix.as_str()).map_err(|e| e.to_string())?;
                self.schema
                    .drop_client_tables(&prefix)
                    .await
                    .map_err(|e| e.to_string())
            }
            // Files copied into a directory this run did not create are not
            // tracked individually.
            Artifact::CopiedFiles { path } => Err(format!(
                "files copied into pre-existing directory {} must be removed manually",
                path.display()
            )),
        }
    }
}

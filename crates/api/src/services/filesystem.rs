//! Tenant directories under the multisite root.
//!
//! Layout of a provisioned tenant:
//!
//! ```text
//! <multisite_root>/<hostname>/constants
//! <multisite_root>/<hostname>/assets/themes/<theme>/...
//! ```
//!
//! Blocking filesystem work runs on the blocking thread pool.

use async_trait::async_trait;
use domain::models::Hostname;
use domain::services::{DirectoryOutcome, ProvisionIoError, TenantFilesystem};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FilesystemProvisioner {
    multisite_root: PathBuf,
    source_root: PathBuf,
}

impl FilesystemProvisioner {
    pub fn new(multisite_root: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            multisite_root: multisite_root.into(),
            source_root: source_root.into(),
        }
    }

    pub fn tenant_directory(&self, hostname: &Hostname) -> PathBuf {
        self.multisite_root.join(hostname.as_str())
    }

    fn constants_source(&self) -> PathBuf {
        self.source_root.join("config").join("constants")
    }

    fn theme_source(&self, theme: &str) -> PathBuf {
        self.source_root.join("assets").join("themes").join(theme)
    }
}

async fn blocking<T, F>(path: PathBuf, f: F) -> Result<T, ProvisionIoError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProvisionIoError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProvisionIoError::io(path, io::Error::other(e)))?
}

fn root_is_writable(root: &Path) -> bool {
    match fs::metadata(root) {
        Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
        Err(_) => false,
    }
}

fn create_directory(root: &Path, dir: PathBuf) -> Result<DirectoryOutcome, ProvisionIoError> {
    if !root_is_writable(root) {
        warn!(root = %root.display(), "Multisite root is missing or not writable");
        return Ok(DirectoryOutcome::RootUnavailable(root.to_path_buf()));
    }

    match fs::create_dir(&dir) {
        Ok(()) => Ok(DirectoryOutcome::Created(dir)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {
            Ok(DirectoryOutcome::AlreadyExisted(dir))
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(root = %root.display(), error = %e, "Multisite root is not writable");
            Ok(DirectoryOutcome::RootUnavailable(root.to_path_buf()))
        }
        Err(e) => Err(ProvisionIoError::io(dir, e)),
    }
}

fn copy_file(source: &Path, dest: &Path) -> Result<u64, ProvisionIoError> {
    if !source.is_file() {
        return Err(ProvisionIoError::SourceMissing(source.to_path_buf()));
    }
    fs::copy(source, dest).map_err(|e| ProvisionIoError::io(dest, e))
}

/// Copies every file below `source` into `dest`, creating directories as
/// needed. Returns the number of files copied.
fn copy_tree(source: &Path, dest: &Path) -> Result<usize, ProvisionIoError> {
    if !source.is_dir() {
        return Err(ProvisionIoError::SourceMissing(source.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            ProvisionIoError::io(path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ProvisionIoError::io(entry.path(), io::Error::other(e)))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ProvisionIoError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| ProvisionIoError::io(&target, e))?;
            copied += 1;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular theme entry");
        }
    }
    Ok(copied)
}

fn remove_tree(path: &Path) -> Result<(), ProvisionIoError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionIoError::io(path, e)),
    }
}

#[async_trait]
impl TenantFilesystem for FilesystemProvisioner {
    async fn create_tenant_directory(
        &self,
        hostname: &Hostname,
    ) -> Result<DirectoryOutcome, ProvisionIoError> {
        let root = self.multisite_root.clone();
        let dir = self.tenant_directory(hostname);
        let outcome = blocking(dir.clone(), move || create_directory(&root, dir)).await?;
        if let DirectoryOutcome::Created(path) = &outcome {
            info!(path = %path.display(), "Tenant directory created");
        }
        Ok(outcome)
    }

    async fn copy_config_file(&self, dest: &Path) -> Result<u64, ProvisionIoError> {
        let source = self.constants_source();
        let dest = dest.to_path_buf();
        blocking(dest.clone(), move || copy_file(&source, &dest)).await
    }

    async fn copy_theme_tree(
        &self,
        dest_root: &Path,
        theme: &str,
    ) -> Result<usize, ProvisionIoError> {
        let source = self.theme_source(theme);
        let dest = dest_root.join("assets").join("themes").join(theme);
        let copied = blocking(dest.clone(), move || copy_tree(&source, &dest)).await?;
        info!(theme = %theme, files = copied, "Theme copied");
        Ok(copied)
    }

    async fn remove_directory(&self, path: &Path) -> Result<(), ProvisionIoError> {
        let path = path.to_path_buf();
        blocking(path.clone(), move || remove_tree(&path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _multisite: TempDir,
        _source: TempDir,
        provisioner: FilesystemProvisioner,
        multisite_root: PathBuf,
    }

    fn fixture() -> Fixture {
        let multisite = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join("config")).unwrap();
        fs::write(source.path().join("config/constants"), "DB_PREFIX=pmf_\n").unwrap();
        let theme = source.path().join("assets/themes/default");
        fs::create_dir_all(theme.join("css")).unwrap();
        fs::write(theme.join("index.tpl"), "<html></html>").unwrap();
        fs::write(theme.join("css/style.css"), "body {}").unwrap();

        let provisioner = FilesystemProvisioner::new(multisite.path(), source.path());
        Fixture {
            multisite_root: multisite.path().to_path_buf(),
            _multisite: multisite,
            _source: source,
            provisioner,
        }
    }

    fn host() -> Hostname {
        Hostname::new("support.example.com").unwrap()
    }

    #[tokio::test]
    async fn test_create_directory_then_rerun_is_noop() {
        let f = fixture();
        let expected = f.multisite_root.join("support.example.com");

        let first = f.provisioner.create_tenant_directory(&host()).await.unwrap();
        assert_eq!(first, DirectoryOutcome::Created(expected.clone()));
        assert!(expected.is_dir());

        let second = f.provisioner.create_tenant_directory(&host()).await.unwrap();
        assert_eq!(second, DirectoryOutcome::AlreadyExisted(expected));
    }

    #[tokio::test]
    async fn test_missing_root_is_unavailable_not_error() {
        let f = fixture();
        let missing = f.multisite_root.join("does-not-exist");
        let provisioner = FilesystemProvisioner::new(&missing, "/nonexistent");

        let outcome = provisioner.create_tenant_directory(&host()).await.unwrap();
        assert_eq!(outcome, DirectoryOutcome::RootUnavailable(missing.clone()));
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_copy_config_file() {
        let f = fixture();
        let dir = f.provisioner.tenant_directory(&host());
        fs::create_dir_all(&dir).unwrap();

        let dest = dir.join("constants");
        let bytes = f.provisioner.copy_config_file(&dest).await.unwrap();
        assert_eq!(bytes, 15);
        assert_eq!(fs::read_to_string(dest).unwrap(), "DB_PREFIX=pmf_\n");
    }

    #[tokio::test]
    async fn test_copy_config_file_missing_source() {
        let f = fixture();
        let provisioner = FilesystemProvisioner::new(&f.multisite_root, "/nonexistent-source");
        let err = provisioner
            .copy_config_file(&f.multisite_root.join("constants"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionIoError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_copy_config_file_unwritable_destination() {
        let f = fixture();
        let dest = f.multisite_root.join("missing-dir").join("constants");
        let err = f.provisioner.copy_config_file(&dest).await.unwrap_err();
        assert!(matches!(err, ProvisionIoError::Io { .. }));
    }

    #[tokio::test]
    async fn test_copy_theme_tree_recursively() {
        let f = fixture();
        let dir = f.provisioner.tenant_directory(&host());
        fs::create_dir_all(&dir).unwrap();

        let copied = f.provisioner.copy_theme_tree(&dir, "default").await.unwrap();
        assert_eq!(copied, 2);
        assert!(dir.join("assets/themes/default/index.tpl").is_file());
        assert_eq!(
            fs::read_to_string(dir.join("assets/themes/default/css/style.css")).unwrap(),
            "body {}"
        );
    }

    #[tokio::test]
    async fn test_copy_unknown_theme_fails() {
        let f = fixture();
        let dir = f.provisioner.tenant_directory(&host());
        let err = f.provisioner.copy_theme_tree(&dir, "neon").await.unwrap_err();
        assert!(matches!(err, ProvisionIoError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_remove_directory_is_idempotent() {
        let f = fixture();
        f.provisioner.create_tenant_directory(&host()).await.unwrap();
        let dir = f.provisioner.tenant_directory(&host());
        f.provisioner.copy_theme_tree(&dir, "default").await.unwrap();

        f.provisioner.remove_directory(&dir).await.unwrap();
        assert!(!dir.exists());

        // Removing again is fine.
        f.provisioner.remove_directory(&dir).await.unwrap();
    }
}

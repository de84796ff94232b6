//! File-backed settings store

use async_trait::async_trait;
use depot_core::{NormalizedSettings, SettingsStore, StoreError, StoredSettings};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Settings persisted as a single JSON document
///
/// Saves go through a temporary file in the same directory and an atomic
/// rename, so readers see either the previous record or the new one.
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    async fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        debug!("Read settings from {}", self.path.display());
        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn save(&self, settings: NormalizedSettings) -> Result<StoredSettings, StoreError> {
        let _guard = self.write_lock.lock().await;

        let stored = StoredSettings::new(settings);
        let content = serde_json::to_vec_pretty(&stored)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;

        info!("Saved settings to {}", self.path.display());
        Ok(stored)
    }
}

/// Replace `path` with `content` via temp file and rename
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp_file = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut file = temp_file.as_file();
        file.write_all(content)?;
        file.sync_all()?;
    }

    // Owner read/write only; the record holds the license key
    #[cfg(unix)]
    {
        let mut perms = temp_file.as_file().metadata()?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(temp_file.path(), perms)?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{PackagistSync, SyncPolicy};

    fn settings(mode: SyncPolicy) -> NormalizedSettings {
        NormalizedSettings {
            packagist_sync: PackagistSync::Proxy,
            dist_sync_mode: mode,
            git_path: Some("/home/git/mirrors/".to_string()),
            git_prefix: Some("git@mirror:mirrors/".to_string()),
            license: Some("KEY-123".to_string()),
            license_personal: false,
            repositories: None,
        }
    }

    #[tokio::test]
    async fn test_load_before_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        assert!(!store.exists().await.unwrap());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested/settings.json"));

        let saved = store.save(settings(SyncPolicy::NewTags)).await.unwrap();
        assert!(store.exists().await.unwrap());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.settings.dist_sync_mode, SyncPolicy::NewTags);
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        store.save(settings(SyncPolicy::Lazy)).await.unwrap();
        store.save(settings(SyncPolicy::All)).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.settings.dist_sync_mode, SyncPolicy::All);

        // No temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path);

        let mut disabled = settings(SyncPolicy::Lazy);
        disabled.packagist_sync = PackagistSync::Disabled;
        disabled.git_path = None;
        disabled.git_prefix = None;
        store.save(disabled).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["packagist_sync"], false);
        assert_eq!(raw["dist_sync_mode"], "lazy");
        assert!(raw.get("git_path").is_none());
        assert!(raw["saved_at"].is_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path);

        store.save(settings(SyncPolicy::Lazy)).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(StoreError::Serialization(_))
        ));
    }
}

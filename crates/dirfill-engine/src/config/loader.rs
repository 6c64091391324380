use crate::resolver::CacheStore;
use async_trait::async_trait;
use dirfill_common::settings::Settings;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct SettingsLoader;

impl SettingsLoader {
    /// Load from default locations:
    /// 1. ./dirfill.yaml
    /// 2. ~/.dirfill/config.yaml
    /// 3. Default settings
    pub async fn load_default() -> Result<Settings, StoreError> {
        let local = PathBuf::from("./dirfill.yaml");
        if local.exists() {
            return Self::load_from(&local).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".dirfill").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(Settings::default())
    }

    pub async fn load_from(path: &Path) -> Result<Settings, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }
}

/// Settings persistence backed by a single YAML file.
///
/// Cache updates are a read-modify-write of the whole record. Writes are
/// last-write-wins: only the resolver writes, and the cache converges to
/// the last successful lookup regardless of interleaving.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default persisted location (~/.dirfill/config.yaml), falling back
    /// to ./dirfill.yaml when no home directory is available.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".dirfill").join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("./dirfill.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_yaml::to_string(settings)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Blank out the cached username, the options surface's "clear cache".
    pub async fn clear_cache(&self) -> Result<(), StoreError> {
        let mut settings = self.load_or_default().await;
        settings.cached_username = String::new();
        settings.cached_at = 0;
        self.save(&settings).await
    }

    async fn load_or_default(&self) -> Settings {
        SettingsLoader::load_from(&self.path)
            .await
            .unwrap_or_default()
    }
}

#[async_trait]
impl CacheStore for FileSettingsStore {
    async fn save_username(&self, username: &str, cached_at: u64) -> Result<(), StoreError> {
        let mut settings = self.load_or_default().await;
        settings.cached_username = username.to_string();
        settings.cached_at = cached_at;
        self.save(&settings).await
    }
}

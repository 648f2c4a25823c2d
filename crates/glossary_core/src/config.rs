//! Application directory layout and runtime knobs.
//!
//! # Responsibility
//! - Resolve where the database, resource containers, audio and logs live.
//! - Carry catalog/HTTP settings used by `catalog::client`.
//!
//! # Invariants
//! - Every path is derived from `data_dir` unless explicitly overridden.
//! - Environment overrides are read once in `AppConfig::from_env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "GLOSSARY_DATA_DIR";
pub const ENV_CATALOG_URL: &str = "GLOSSARY_CATALOG_URL";
pub const ENV_BUNDLED_DIR: &str = "GLOSSARY_BUNDLED_DIR";

const APP_DIR_NAME: &str = "glossary";
const DB_FILE_NAME: &str = "glossary.sqlite3";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Installed resource-container zips.
    pub resources_dir: PathBuf,
    /// Phrase audio clips.
    pub audio_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Read-only containers shipped with the app (first-run seeding).
    pub bundled_resources_dir: Option<PathBuf>,
    /// Remote catalog endpoint; catalog calls fail until one is configured.
    pub catalog_url: Option<String>,
    pub http_timeout: Duration,
    pub retry_max_attempts: u32,
    /// First retry delay; doubled for every further attempt.
    pub retry_backoff_base: Duration,
}

impl AppConfig {
    /// Lays out all directories under `data_dir` with default network settings.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            resources_dir: data_dir.join("resources"),
            audio_dir: data_dir.join("audio"),
            log_dir: data_dir.join("logs"),
            bundled_resources_dir: None,
            catalog_url: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_backoff_base: DEFAULT_RETRY_BACKOFF_BASE,
            data_dir,
        }
    }

    /// Builds configuration from environment overrides.
    ///
    /// Falls back to the platform data directory, then to the system temp
    /// directory when the platform exposes none.
    pub fn from_env() -> Self {
        let data_dir = env_path(ENV_DATA_DIR)
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR_NAME));

        let mut config = Self::for_data_dir(data_dir);
        config.bundled_resources_dir = env_path(ENV_BUNDLED_DIR);
        config.catalog_url = env_value(ENV_CATALOG_URL);
        config
    }

    pub fn with_bundled_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundled_resources_dir = Some(dir.into());
        self
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Creates data, resources, audio and log directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.data_dir,
            &self.resources_dir,
            &self.audio_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Absolute path of an installed container file.
    pub fn resource_path(&self, filename: &str) -> PathBuf {
        self.resources_dir.join(filename)
    }

    pub fn audio_path(&self, filename: &str) -> PathBuf {
        self.audio_dir.join(filename)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::path::Path;

    #[test]
    fn for_data_dir_derives_every_path() {
        let config = AppConfig::for_data_dir("/srv/glossary");
        assert_eq!(config.db_path, Path::new("/srv/glossary/glossary.sqlite3"));
        assert_eq!(config.resources_dir, Path::new("/srv/glossary/resources"));
        assert_eq!(
            config.resource_path("en_ulb.zip"),
            Path::new("/srv/glossary/resources/en_ulb.zip")
        );
        assert!(config.bundled_resources_dir.is_none());
        assert!(config.retry_max_attempts >= 1);
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_data_dir(dir.path().join("app"));
        config.ensure_dirs().unwrap();
        assert!(config.resources_dir.is_dir());
        assert!(config.audio_dir.is_dir());
        assert!(config.log_dir.is_dir());
    }
}

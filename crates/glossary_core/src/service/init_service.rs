//! First-run initialization (splash screen work).
//!
//! # Responsibility
//! - Create the data directory layout.
//! - Seed languages from the bundled catalog into an empty table.
//! - Register the bundled default resource when none is installed.
//!
//! # Invariants
//! - Running again is a no-op apart from reading counts.
//! - `initialized_at` is written once and never moved.

use crate::catalog::languages::load_bundled_languages;
use crate::config::AppConfig;
use crate::model::now_epoch_ms;
use crate::model::resource::Resource;
use crate::repo::language_repo::SqliteLanguageRepository;
use crate::repo::resource_repo::SqliteResourceRepository;
use crate::repo::RepoError;
use crate::service::resource_service::ResourceService;
use crate::service::settings_service::SettingsService;
use crate::service::ServiceResult;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Container registered on first run when present in the bundled dir.
pub const DEFAULT_RESOURCE_FILE: &str = "en_ulb.zip";

/// Outcome of one initialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Whether this pass recorded `initialized_at`.
    pub first_run: bool,
    pub languages_seeded: usize,
    pub resource_seeded: Option<Resource>,
}

pub struct InitService<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> InitService<'a> {
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    pub fn run(&self) -> ServiceResult<InitReport> {
        let started_at = Instant::now();
        self.config.ensure_dirs()?;

        let languages_seeded = self.seed_languages()?;
        let resource_seeded = self.seed_default_resource()?;

        let settings = SettingsService::new(self.conn);
        let first_run = settings.initialized_at()?.is_none();
        if first_run {
            settings.mark_initialized(now_epoch_ms())?;
        }

        info!(
            "event=app_init module=service status=ok first_run={} languages_seeded={} resource_seeded={} duration_ms={}",
            first_run,
            languages_seeded,
            resource_seeded.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(InitReport {
            first_run,
            languages_seeded,
            resource_seeded,
        })
    }

    fn seed_languages(&self) -> ServiceResult<usize> {
        if SqliteLanguageRepository::new(self.conn).count_languages()? > 0 {
            return Ok(0);
        }

        let languages = load_bundled_languages()
            .map_err(|err| RepoError::InvalidData(format!("bundled language catalog: {err}")))?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteLanguageRepository::new(&tx);
        for language in &languages {
            repo.upsert_language(language)?;
        }
        tx.commit()?;
        Ok(languages.len())
    }

    fn seed_default_resource(&self) -> ServiceResult<Option<Resource>> {
        if !SqliteResourceRepository::new(self.conn)
            .list_resources()?
            .is_empty()
        {
            return Ok(None);
        }
        let Some(bundled_dir) = self.config.bundled_resources_dir.as_ref() else {
            return Ok(None);
        };

        let path = bundled_dir.join(DEFAULT_RESOURCE_FILE);
        if !path.is_file() {
            warn!("event=app_init module=service status=default_resource_missing");
            return Ok(None);
        }
        ResourceService::new(self.conn, self.config)
            .register_container(&path)
            .map(Some)
    }
}

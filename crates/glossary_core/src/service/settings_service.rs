//! Typed user preferences over the key/value settings table.

use crate::model::glossary::GlossaryId;
use crate::repo::settings_repo::SqliteSettingsRepository;
use crate::repo::RepoError;
use crate::service::ServiceResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const KEY_THEME: &str = "theme";
pub const KEY_LOCALE: &str = "locale";
pub const KEY_LAST_GLOSSARY: &str = "last_glossary_id";
pub const KEY_INITIALIZED_AT: &str = "initialized_at";

const DEFAULT_LOCALE: &str = "en";

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

pub struct SettingsService<'conn> {
    repo: SqliteSettingsRepository<'conn>,
}

impl<'conn> SettingsService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            repo: SqliteSettingsRepository::new(conn),
        }
    }

    /// Stored theme; unknown values read as the default.
    pub fn theme(&self) -> ServiceResult<Theme> {
        Ok(self
            .repo
            .get_setting(KEY_THEME)?
            .and_then(|value| Theme::parse(&value))
            .unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> ServiceResult<()> {
        Ok(self.repo.put_setting(KEY_THEME, theme.as_str())?)
    }

    pub fn locale(&self) -> ServiceResult<String> {
        Ok(self
            .repo
            .get_setting(KEY_LOCALE)?
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()))
    }

    pub fn set_locale(&self, locale: &str) -> ServiceResult<()> {
        let locale = locale.trim();
        if locale.is_empty() {
            self.repo.delete_setting(KEY_LOCALE)?;
            return Ok(());
        }
        Ok(self.repo.put_setting(KEY_LOCALE, locale)?)
    }

    /// Glossary opened most recently, if any.
    pub fn last_glossary_id(&self) -> ServiceResult<Option<GlossaryId>> {
        let Some(value) = self.repo.get_setting(KEY_LAST_GLOSSARY)? else {
            return Ok(None);
        };
        Uuid::parse_str(&value).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{value}` in settings")).into()
        })
    }

    pub fn set_last_glossary_id(&self, id: Option<GlossaryId>) -> ServiceResult<()> {
        match id {
            Some(id) => self.repo.put_setting(KEY_LAST_GLOSSARY, &id.to_string())?,
            None => {
                self.repo.delete_setting(KEY_LAST_GLOSSARY)?;
            }
        }
        Ok(())
    }

    /// Epoch ms of the first successful initialization.
    pub fn initialized_at(&self) -> ServiceResult<Option<i64>> {
        Ok(self
            .repo
            .get_setting(KEY_INITIALIZED_AT)?
            .and_then(|value| value.parse().ok()))
    }

    pub(crate) fn mark_initialized(&self, at: i64) -> ServiceResult<()> {
        Ok(self.repo.put_setting(KEY_INITIALIZED_AT, &at.to_string())?)
    }

    pub fn list(&self) -> ServiceResult<Vec<(String, String)>> {
        Ok(self.repo.list_settings()?)
    }
}

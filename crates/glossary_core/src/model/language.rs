//! Language records loaded from the bundled language catalog.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// SQLite row id of a language.
pub type LanguageId = i64;

/// Script direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Storage/wire representation (`ltr|rtl`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }

    /// Parses a direction value case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }
}

/// Persisted language row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: LanguageId,
    /// IETF-style language code, e.g. `en` or `es-419`.
    pub slug: String,
    /// Native name.
    pub name: String,
    /// Anglicized name; empty when the catalog has none.
    pub angle_name: String,
    pub direction: TextDirection,
    /// Gateway languages are offered as glossary source languages.
    pub gateway: bool,
}

/// Language values before a row id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLanguage {
    pub slug: String,
    pub name: String,
    pub angle_name: String,
    pub direction: TextDirection,
    pub gateway: bool,
}

impl NewLanguage {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            angle_name: String::new(),
            direction: TextDirection::Ltr,
            gateway: false,
        }
    }

    /// Rejects blank slugs and slugs with whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_language_slug(&self.slug)
    }
}

pub(crate) fn validate_language_slug(slug: &str) -> Result<(), ValidationError> {
    let trimmed = slug.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) || trimmed != slug {
        return Err(ValidationError::InvalidLanguageSlug(slug.to_string()));
    }
    Ok(())
}

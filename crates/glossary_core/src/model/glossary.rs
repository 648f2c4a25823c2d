//! Glossary record.
//!
//! # Invariants
//! - `id` is stable for the glossary lifetime and preserved by export/import.
//! - `code` is unique, lowercase and limited to `[a-z0-9_-]{1,32}`.
//! - `updated_at >= created_at`.

use crate::model::language::LanguageId;
use crate::model::now_epoch_ms;
use crate::model::resource::ResourceId;
use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable glossary identifier.
pub type GlossaryId = Uuid;

const MAX_CODE_CHARS: usize = 32;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid glossary code regex"));

/// A named set of phrase translations for one source/target language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glossary {
    pub id: GlossaryId,
    pub code: String,
    pub author: String,
    pub source_language_id: LanguageId,
    pub target_language_id: LanguageId,
    /// Scripture resource the glossary's refs point into.
    pub resource_id: ResourceId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Glossary {
    /// Creates a glossary with a generated id and current timestamps.
    ///
    /// `code` is normalized (trimmed, lowercased) but not validated here.
    pub fn new(
        code: &str,
        author: impl Into<String>,
        source_language_id: LanguageId,
        target_language_id: LanguageId,
        resource_id: ResourceId,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(code),
            author: author.into(),
            source_language_id,
            target_language_id,
            resource_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_code(&self.code)?;
        if self.author.trim().is_empty() {
            return Err(ValidationError::BlankAuthor);
        }
        Ok(())
    }
}

/// Trims and lowercases a user-entered glossary code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

fn validate_code(code: &str) -> Result<(), ValidationError> {
    let chars = code.chars().count();
    if chars == 0 || chars > MAX_CODE_CHARS || !CODE_RE.is_match(code) {
        return Err(ValidationError::InvalidGlossaryCode(code.to_string()));
    }
    Ok(())
}

//! Scripture resource records.
//!
//! A resource row points at one resource-container zip stored under the
//! configured resources directory. The book/chapter/verse tree is not
//! persisted; see `container::workbook` for the lazily parsed view.

use crate::model::language::{Language, LanguageId};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// SQLite row id of a resource.
pub type ResourceId = i64;

/// Container format; only USFM scripture containers are supported.
pub const FORMAT_USFM: &str = "usfm";

/// Persisted resource row joined with its language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub language: Language,
    /// Resource identifier such as `ulb` or `reg`.
    pub kind: String,
    pub version: String,
    pub format: String,
    /// Container zip file name relative to the resources directory.
    pub filename: String,
    pub created_at: i64,
}

impl Resource {
    /// Short display slug, e.g. `en_ulb`.
    pub fn slug(&self) -> String {
        format!("{}_{}", self.language.slug, self.kind)
    }
}

/// Resource values before a row id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub language_id: LanguageId,
    pub kind: String,
    pub version: String,
    pub format: String,
    pub filename: String,
}

/// Canonical container file name for a language/type/version triple.
///
/// # Errors
/// `InvalidResourceName` when a part is empty or has characters outside
/// `[A-Za-z0-9._-]`, so the name always stays a single path component.
pub fn container_filename(
    language_slug: &str,
    kind: &str,
    version: &str,
) -> Result<String, ValidationError> {
    for part in [language_slug, kind, version] {
        let valid = !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(ValidationError::InvalidResourceName(part.to_string()));
        }
    }
    Ok(format!("{language_slug}_{kind}_v{version}.zip"))
}

#[cfg(test)]
mod tests {
    use super::container_filename;
    use crate::model::validation::ValidationError;

    #[test]
    fn container_filename_includes_version() {
        assert_eq!(container_filename("en", "ulb", "12").unwrap(), "en_ulb_v12.zip");
        assert_eq!(
            container_filename("pt-br", "ulb", "1.2").unwrap(),
            "pt-br_ulb_v1.2.zip"
        );
    }

    #[test]
    fn container_filename_rejects_path_separators() {
        assert_eq!(
            container_filename("en", "ulb/../..", "12"),
            Err(ValidationError::InvalidResourceName("ulb/../..".to_string()))
        );
        assert!(container_filename("en", "ulb", "1\\2").is_err());
        assert!(container_filename("en", "", "12").is_err());
    }
}

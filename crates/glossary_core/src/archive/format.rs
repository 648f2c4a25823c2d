//! Glossary archive layout and `glossary.json` document.
//!
//! ```text
//! glossary.json            metadata, phrases and refs
//! resources/<filename>     resource container the refs point into
//! audio/<file>             phrase audio clips present at export time
//! ```

use crate::model::glossary::{Glossary, GlossaryId};
use crate::model::phrase::Phrase;
use crate::model::reference::VerseRef;
use crate::model::resource::Resource;
use serde::{Deserialize, Serialize};

/// Current `glossary.json` format version.
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_ENTRY: &str = "glossary.json";
pub const RESOURCES_PREFIX: &str = "resources/";
pub const AUDIO_PREFIX: &str = "audio/";

/// Root of `glossary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub format_version: u32,
    pub exported_at: i64,
    pub glossary: ArchivedGlossary,
    pub resource: ArchivedResource,
    #[serde(default)]
    pub phrases: Vec<ArchivedPhrase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedGlossary {
    pub id: GlossaryId,
    pub code: String,
    pub author: String,
    pub source_language: String,
    pub target_language: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Resource descriptor; `filename` names the entry under `resources/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedResource {
    pub language: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub format: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedPhrase {
    pub id: uuid::Uuid,
    pub phrase: String,
    #[serde(default)]
    pub spelling: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub refs: Vec<VerseRef>,
}

impl ArchivedGlossary {
    pub fn from_glossary(glossary: &Glossary, source_language: &str, target_language: &str) -> Self {
        Self {
            id: glossary.id,
            code: glossary.code.clone(),
            author: glossary.author.clone(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            created_at: glossary.created_at,
            updated_at: glossary.updated_at,
        }
    }
}

impl From<&Resource> for ArchivedResource {
    fn from(resource: &Resource) -> Self {
        Self {
            language: resource.language.slug.clone(),
            kind: resource.kind.clone(),
            version: resource.version.clone(),
            format: resource.format.clone(),
            filename: resource.filename.clone(),
        }
    }
}

impl ArchivedPhrase {
    pub fn from_phrase(phrase: &Phrase, audio: Option<String>, refs: Vec<VerseRef>) -> Self {
        Self {
            id: phrase.id,
            phrase: phrase.phrase.clone(),
            spelling: phrase.spelling.clone(),
            description: phrase.description.clone(),
            audio,
            created_at: phrase.created_at,
            updated_at: phrase.updated_at,
            refs,
        }
    }

    /// Rebuilds the phrase row for `glossary_id`.
    pub fn to_phrase(&self, glossary_id: GlossaryId) -> Phrase {
        Phrase {
            id: self.id,
            glossary_id,
            phrase: self.phrase.clone(),
            spelling: self.spelling.clone(),
            description: self.description.clone(),
            audio: self.audio.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Returns `name` when it is a bare file name with no directory parts.
pub(crate) fn plain_file_name(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    let valid = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\'])
        && trimmed == name;
    valid.then_some(name)
}

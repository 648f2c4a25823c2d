//! Phrase record: one source-language term and its translation.

use crate::model::glossary::GlossaryId;
use crate::model::now_epoch_ms;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable phrase identifier.
pub type PhraseId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: PhraseId,
    pub glossary_id: GlossaryId,
    /// Source-language text as selected in the reader.
    pub phrase: String,
    /// Target-language spelling.
    pub spelling: String,
    pub description: String,
    /// Audio file name under the audio directory.
    pub audio: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Phrase {
    /// Creates a phrase with a generated id. Source text is whitespace-normalized.
    pub fn new(
        glossary_id: GlossaryId,
        phrase: &str,
        spelling: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            glossary_id,
            phrase: normalize_phrase(phrase),
            spelling: spelling.into(),
            description: description.into(),
            audio: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phrase.trim().is_empty() {
            return Err(ValidationError::BlankPhrase);
        }
        Ok(())
    }
}

/// Collapses whitespace runs and trims, so `"  in   the "` becomes `"in the"`.
pub fn normalize_phrase(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{normalize_phrase, Phrase};
    use uuid::Uuid;

    #[test]
    fn normalize_phrase_collapses_whitespace() {
        assert_eq!(normalize_phrase("  in \n the\tbeginning "), "in the beginning");
    }

    #[test]
    fn blank_phrase_fails_validation() {
        let phrase = Phrase::new(Uuid::new_v4(), "   ", "", "");
        assert!(phrase.validate().is_err());
    }
}

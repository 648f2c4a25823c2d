//! Verse locators and the refs that tie phrases to them.

use crate::model::phrase::PhraseId;
use crate::model::resource::ResourceId;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// SQLite row id of a ref.
pub type RefId = i64;

/// A `(book, chapter, verse)` position inside one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseRef {
    /// Lowercase USFM book slug, e.g. `gen` or `1jn`.
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into().trim().to_lowercase(),
            chapter,
            verse,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.book.trim().is_empty() {
            return Err(ValidationError::InvalidVerseRef("book is blank".to_string()));
        }
        if self.chapter == 0 || self.verse == 0 {
            return Err(ValidationError::InvalidVerseRef(format!(
                "{self}: chapter and verse start at 1"
            )));
        }
        Ok(())
    }

    /// Parses `book chapter:verse`, e.g. `gen 1:3`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidVerseRef(format!("cannot parse `{value}`"));
        let (book, position) = value.trim().split_once(' ').ok_or_else(invalid)?;
        let (chapter, verse) = position.trim().split_once(':').ok_or_else(invalid)?;
        let parsed = Self::new(
            book,
            chapter.parse().map_err(|_| invalid())?,
            verse.parse().map_err(|_| invalid())?,
        );
        parsed.validate()?;
        Ok(parsed)
    }
}

impl Display for VerseRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

/// Persisted link from a phrase to one verse of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub id: RefId,
    pub phrase_id: PhraseId,
    pub resource_id: ResourceId,
    pub location: VerseRef,
}

#[cfg(test)]
mod tests {
    use super::VerseRef;

    #[test]
    fn parse_reads_book_chapter_verse() {
        let parsed = VerseRef::parse(" GEN 1:3 ").unwrap();
        assert_eq!(parsed, VerseRef::new("gen", 1, 3));
        assert_eq!(parsed.to_string(), "gen 1:3");
    }

    #[test]
    fn parse_rejects_zero_and_garbage() {
        assert!(VerseRef::parse("gen 0:1").is_err());
        assert!(VerseRef::parse("gen1:1").is_err());
        assert!(VerseRef::parse("gen a:b").is_err());
    }
}

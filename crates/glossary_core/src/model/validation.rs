//! Field validation errors shared by all domain records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for a domain record about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Glossary code is empty, too long, or contains unsupported characters.
    InvalidGlossaryCode(String),
    /// Glossary author is blank after trim.
    BlankAuthor,
    /// Phrase source text is blank after trim.
    BlankPhrase,
    /// Language slug is blank or malformed.
    InvalidLanguageSlug(String),
    /// Book/chapter/verse locator is out of range.
    InvalidVerseRef(String),
    /// Resource language, type or version cannot be used in a file name.
    InvalidResourceName(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGlossaryCode(code) => write!(
                f,
                "invalid glossary code `{code}`: expected 1-32 chars of a-z, 0-9, `-` or `_`"
            ),
            Self::BlankAuthor => write!(f, "glossary author must not be blank"),
            Self::BlankPhrase => write!(f, "phrase must not be blank"),
            Self::InvalidLanguageSlug(slug) => write!(f, "invalid language slug `{slug}`"),
            Self::InvalidVerseRef(details) => write!(f, "invalid verse reference: {details}"),
            Self::InvalidResourceName(value) => write!(f, "invalid resource name part `{value}`"),
        }
    }
}

impl Error for ValidationError {}

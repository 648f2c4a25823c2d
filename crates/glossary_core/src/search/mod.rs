//! Phrase search over scripture text.
//!
//! # Responsibility
//! - Locate verses containing a glossary phrase.
//! - Provide random verse samples for the reader.
//!
//! # See also
//! - `container::workbook` for the text source.

pub mod phrase_search;

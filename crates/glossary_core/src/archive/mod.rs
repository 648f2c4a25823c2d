//! Glossary archive import/export.
//!
//! # Responsibility
//! - Package one glossary, its resource container and audio into a zip.
//! - Restore such a zip into a database in one transaction.
//!
//! # Invariants
//! - Glossary and phrase ids survive a round trip.
//! - A failed import leaves the database unchanged.

pub mod export;
pub mod format;
pub mod import;

use crate::container::ContainerError;
use crate::model::glossary::GlossaryId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use export::{export_glossary, ExportSummary};
pub use import::{import_glossary, ImportSummary};

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug)]
pub enum ArchiveError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    Repo(RepoError),
    /// Archive content is missing, malformed or of an unknown version.
    Corrupted(String),
    /// A glossary with the same code or id already exists.
    DuplicateGlossary(String),
    LanguageNotFound(String),
    GlossaryNotFound(GlossaryId),
    /// Container file of the glossary's resource is not on disk.
    ResourceFileMissing(PathBuf),
}

impl ArchiveError {
    /// Message shown to users.
    pub fn user_message(&self) -> String {
        match self {
            Self::Corrupted(_) | Self::Zip(_) => "glossary corrupted".to_string(),
            Self::DuplicateGlossary(code) => format!("glossary `{code}` already exists"),
            Self::LanguageNotFound(slug) => format!("language not found: {slug}"),
            Self::GlossaryNotFound(_) => "glossary not found".to_string(),
            Self::ResourceFileMissing(_) => "resource not found".to_string(),
            Self::Io(_) | Self::Repo(_) => "unexpected error".to_string(),
        }
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "archive i/o failed: {err}"),
            Self::Zip(err) => write!(f, "invalid archive: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Corrupted(message) => write!(f, "corrupted glossary archive: {message}"),
            Self::DuplicateGlossary(code) => write!(f, "glossary already exists: {code}"),
            Self::LanguageNotFound(slug) => write!(f, "language not found: {slug}"),
            Self::GlossaryNotFound(id) => write!(f, "glossary not found: {id}"),
            Self::ResourceFileMissing(path) => {
                write!(f, "resource container missing: {}", path.display())
            }
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Zip(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Zip(value)
    }
}

impl From<RepoError> for ArchiveError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<ContainerError> for ArchiveError {
    fn from(value: ContainerError) -> Self {
        Self::Corrupted(format!("bundled resource container: {value}"))
    }
}

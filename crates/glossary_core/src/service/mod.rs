//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, container and archive calls into use-case APIs.
//! - Keep UI/FFI layers decoupled from storage details.
//! - Turn layered errors into one `ServiceError` with a user-facing message.

pub mod glossary_service;
pub mod init_service;
pub mod resource_service;
pub mod settings_service;

use crate::archive::ArchiveError;
use crate::catalog::client::CatalogError;
use crate::container::ContainerError;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use crate::search::phrase_search::SearchError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use glossary_service::{GlossaryService, NewGlossaryRequest, PhraseDetail, PhraseInput};
pub use init_service::{InitReport, InitService};
pub use resource_service::ResourceService;
pub use settings_service::{SettingsService, Theme};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every service operation.
#[derive(Debug)]
pub enum ServiceError {
    Invalid(ValidationError),
    NotFound { entity: &'static str, key: String },
    AlreadyExists { entity: &'static str, key: String },
    Repo(RepoError),
    Container(ContainerError),
    Search(SearchError),
    Archive(ArchiveError),
    Catalog(CatalogError),
    Io(std::io::Error),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Short message suitable for showing to users.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(err) => err.to_string(),
            Self::NotFound { entity, .. } => format!("{entity} not found"),
            Self::AlreadyExists { entity, key } => format!("{entity} `{key}` already exists"),
            Self::Container(
                ContainerError::Io(_)
                | ContainerError::Zip(_)
                | ContainerError::MissingManifest(_)
                | ContainerError::InvalidManifest(_)
                | ContainerError::Usfm { .. },
            ) => "resource corrupted".to_string(),
            Self::Container(err) => err.to_string(),
            Self::Search(SearchError::Container(_)) => "resource corrupted".to_string(),
            Self::Search(err) => err.to_string(),
            Self::Archive(err) => err.user_message(),
            Self::Catalog(err) => err.user_message(),
            Self::Repo(_) | Self::Io(_) => "unexpected error".to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::AlreadyExists { entity, key } => write!(f, "{entity} already exists: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Container(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::Archive(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Container(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Archive(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NotFound { .. } | Self::AlreadyExists { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Invalid(err),
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            RepoError::Conflict { entity, key } => Self::AlreadyExists { entity, key },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<ContainerError> for ServiceError {
    fn from(value: ContainerError) -> Self {
        Self::Container(value)
    }
}

impl From<SearchError> for ServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<ArchiveError> for ServiceError {
    fn from(value: ArchiveError) -> Self {
        match value {
            ArchiveError::Repo(err) => err.into(),
            other => Self::Archive(other),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

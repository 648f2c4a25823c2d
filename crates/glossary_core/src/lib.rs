//! Core domain logic for the glossary app.
//! This crate is the single source of truth for glossary, phrase and ref
//! invariants; the FFI bridge and the CLI are thin shells over it.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod container;
pub mod db;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod repo;
pub mod search;
pub mod service;

pub use archive::{export_glossary, import_glossary, ArchiveError, ExportSummary, ImportSummary};
pub use catalog::client::{Catalog, CatalogClient, CatalogError};
pub use config::AppConfig;
pub use container::workbook::Workbook;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::glossary::{Glossary, GlossaryId};
pub use model::language::{Language, TextDirection};
pub use model::phrase::{Phrase, PhraseId};
pub use model::reference::{Ref, VerseRef};
pub use model::resource::{Resource, ResourceId};
pub use navigation::{Navigator, ReadState, Screen};
pub use repo::{RepoError, RepoResult};
pub use search::phrase_search::{
    find_phrase, random_verses, PhraseHit, PhraseMatches, SearchOptions, DEFAULT_MATCH_LIMIT,
};
pub use service::{
    GlossaryService, InitService, ResourceService, ServiceError, ServiceResult, SettingsService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

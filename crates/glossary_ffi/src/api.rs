//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Convert core errors into envelopes with `ok` and a user-facing `message`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Quick lookups are `frb(sync)`; archive, catalog, search and chapter
//!   loading run on the bridge worker pool.
//! - Every call opens its own connection; workbooks are shared per resource.

use glossary_core::db::open_db;
use glossary_core::model::reference::VerseRef;
use glossary_core::repo::language_repo::SqliteLanguageRepository;
use glossary_core::search::phrase_search::{find_phrase, random_verses};
use glossary_core::service::{NewGlossaryRequest, PhraseInput, Theme};
use glossary_core::{
    core_version as core_version_inner, export_glossary, import_glossary,
    init_logging as init_logging_inner, ping as ping_inner, AppConfig, CatalogClient, Glossary,
    GlossaryService, InitService, Phrase, PhraseHit, ResourceId, ResourceService, SearchOptions,
    ServiceError, SettingsService, Workbook, DEFAULT_MATCH_LIMIT,
};
use log::warn;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const RANDOM_VERSE_COUNT: usize = 20;
const SEARCH_LIMIT_MAX: u32 = 500;

static APP_CONFIG: Mutex<Option<AppConfig>> = Mutex::new(None);
static WORKBOOKS: Mutex<Option<HashMap<ResourceId, Arc<Workbook>>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected record, when there is one.
    pub id: Option<String>,
    /// Human-readable message for the UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Sets the data directory and optional bundled dir / catalog URL.
///
/// Without this call the core falls back to `AppConfig::from_env`.
#[flutter_rust_bridge::frb(sync)]
pub fn configure(
    data_dir: String,
    bundled_resources_dir: Option<String>,
    catalog_url: Option<String>,
) -> ActionResponse {
    let trimmed = data_dir.trim();
    if trimmed.is_empty() {
        return ActionResponse::failure("data directory is required");
    }
    let mut config = AppConfig::for_data_dir(trimmed);
    if let Some(dir) = non_blank(bundled_resources_dir) {
        config = config.with_bundled_resources_dir(dir);
    }
    if let Some(url) = non_blank(catalog_url) {
        config = config.with_catalog_url(url);
    }

    *lock(&APP_CONFIG) = Some(config);
    lock(&WORKBOOKS).take();
    ActionResponse::success("Configured.", None)
}

/// Splash-screen result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResponse {
    pub ok: bool,
    pub first_run: bool,
    pub languages_seeded: u32,
    pub message: String,
}

/// Runs first-run initialization. Idempotent.
pub fn app_init() -> InitResponse {
    match with_conn(|conn, config| InitService::new(conn, config).run()) {
        Ok(report) => InitResponse {
            ok: true,
            first_run: report.first_run,
            languages_seeded: to_u32(report.languages_seeded),
            message: "Ready.".to_string(),
        },
        Err(message) => InitResponse {
            ok: false,
            first_run: false,
            languages_seeded: 0,
            message,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageItem {
    pub slug: String,
    pub name: String,
    pub angle_name: String,
    pub rtl: bool,
    pub gateway: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageListResponse {
    pub ok: bool,
    pub items: Vec<LanguageItem>,
    pub message: String,
}

/// Lists languages; `gateway_only` restricts to source-language candidates.
#[flutter_rust_bridge::frb(sync)]
pub fn language_list(gateway_only: bool) -> LanguageListResponse {
    let result = with_conn(|conn, _| {
        let repo = SqliteLanguageRepository::new(conn);
        let languages = if gateway_only {
            repo.list_gateway_languages()?
        } else {
            repo.list_languages()?
        };
        Ok(languages)
    });
    match result {
        Ok(languages) => LanguageListResponse {
            ok: true,
            items: languages
                .into_iter()
                .map(|language| LanguageItem {
                    rtl: language.direction == glossary_core::TextDirection::Rtl,
                    slug: language.slug,
                    name: language.name,
                    angle_name: language.angle_name,
                    gateway: language.gateway,
                })
                .collect(),
            message: String::new(),
        },
        Err(message) => LanguageListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub id: i64,
    pub language: String,
    pub kind: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceListResponse {
    pub ok: bool,
    pub items: Vec<ResourceItem>,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn resource_list() -> ResourceListResponse {
    match with_conn(|conn, config| ResourceService::new(conn, config).list_resources()) {
        Ok(resources) => ResourceListResponse {
            ok: true,
            items: resources
                .into_iter()
                .map(|resource| ResourceItem {
                    id: resource.id,
                    language: resource.language.slug,
                    kind: resource.kind,
                    version: resource.version,
                })
                .collect(),
            message: String::new(),
        },
        Err(message) => ResourceListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryItem {
    pub id: String,
    pub code: String,
    pub author: String,
    pub resource_id: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryListResponse {
    pub ok: bool,
    pub items: Vec<GlossaryItem>,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn glossary_create(
    code: String,
    author: String,
    source_language: String,
    target_language: String,
    resource_id: i64,
) -> ActionResponse {
    let request = NewGlossaryRequest {
        code,
        author,
        source_language,
        target_language,
        resource_id,
    };
    match with_conn(|conn, _| GlossaryService::new(conn).create_glossary(&request)) {
        Ok(glossary) => {
            ActionResponse::success("Glossary created.", Some(glossary.id.to_string()))
        }
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn glossary_list() -> GlossaryListResponse {
    match with_conn(|conn, _| GlossaryService::new(conn).list_glossaries()) {
        Ok(glossaries) => GlossaryListResponse {
            ok: true,
            items: glossaries.into_iter().map(to_glossary_item).collect(),
            message: String::new(),
        },
        Err(message) => GlossaryListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn glossary_delete(glossary_id: String) -> ActionResponse {
    let result = parse_id(&glossary_id, "glossary").and_then(|id| {
        with_conn(|conn, _| {
            GlossaryService::new(conn).delete_glossary(id)?;
            let settings = SettingsService::new(conn);
            if settings.last_glossary_id()? == Some(id) {
                settings.set_last_glossary_id(None)?;
            }
            Ok(id)
        })
    });
    match result {
        Ok(id) => ActionResponse::success("Glossary deleted.", Some(id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseItem {
    pub id: String,
    pub phrase: String,
    pub spelling: String,
    pub description: String,
    pub audio: Option<String>,
    /// `book chapter:verse` strings.
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseListResponse {
    pub ok: bool,
    pub items: Vec<PhraseItem>,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn phrase_add(
    glossary_id: String,
    phrase: String,
    spelling: String,
    description: String,
) -> ActionResponse {
    let input = PhraseInput {
        phrase,
        spelling,
        description,
        audio: None,
    };
    let result = parse_id(&glossary_id, "glossary").and_then(|id| {
        with_conn(|conn, _| {
            let phrase = GlossaryService::new(conn).add_phrase(id, &input)?;
            SettingsService::new(conn).set_last_glossary_id(Some(id))?;
            Ok(phrase)
        })
    });
    match result {
        Ok(phrase) => ActionResponse::success("Phrase added.", Some(phrase.id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn phrase_update(
    phrase_id: String,
    phrase: String,
    spelling: String,
    description: String,
    audio: Option<String>,
) -> ActionResponse {
    let input = PhraseInput {
        phrase,
        spelling,
        description,
        audio,
    };
    let result = parse_id(&phrase_id, "phrase")
        .and_then(|id| with_conn(|conn, _| GlossaryService::new(conn).update_phrase(id, &input)));
    match result {
        Ok(phrase) => ActionResponse::success("Phrase saved.", Some(phrase.id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn phrase_delete(phrase_id: String) -> ActionResponse {
    let result = parse_id(&phrase_id, "phrase")
        .and_then(|id| with_conn(|conn, _| GlossaryService::new(conn).delete_phrase(id)));
    match result {
        Ok(()) => ActionResponse::success("Phrase deleted.", Some(phrase_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn phrase_list(glossary_id: String) -> PhraseListResponse {
    let result = parse_id(&glossary_id, "glossary").and_then(|id| {
        with_conn(|conn, _| {
            let service = GlossaryService::new(conn);
            let mut items = Vec::new();
            for phrase in service.list_phrases(id)? {
                let refs = service.list_refs(phrase.id)?;
                items.push(to_phrase_item(
                    phrase,
                    refs.into_iter().map(|r| r.location.to_string()).collect(),
                ));
            }
            Ok(items)
        })
    });
    match result {
        Ok(items) => PhraseListResponse {
            ok: true,
            items,
            message: String::new(),
        },
        Err(message) => PhraseListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Replaces a phrase's refs in one resource with `refs` (`gen 1:3` strings).
#[flutter_rust_bridge::frb(sync)]
pub fn phrase_link_refs(phrase_id: String, resource_id: i64, refs: Vec<String>) -> ActionResponse {
    let locations: Result<Vec<VerseRef>, String> = refs
        .iter()
        .map(|value| VerseRef::parse(value).map_err(|err| err.to_string()))
        .collect();
    let result = locations.and_then(|locations| {
        parse_id(&phrase_id, "phrase").and_then(|id| {
            with_conn(|conn, _| GlossaryService::new(conn).link_refs(id, resource_id, &locations))
        })
    });
    match result {
        Ok(linked) => {
            ActionResponse::success(format!("Linked {} ref(s).", linked.len()), Some(phrase_id))
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Verse row for the reader.
///
/// `match_start`/`match_end` are UTF-16 code unit offsets into `text`, so
/// Dart can pass them to `substring` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseItem {
    pub reference: String,
    pub text: String,
    pub match_start: u32,
    pub match_end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub ok: bool,
    pub items: Vec<VerseItem>,
    /// Matches before the cap was applied.
    pub total: u32,
    pub sampled: bool,
    pub message: String,
}

/// Finds verses containing `phrase`; falls back to random verses when none match.
pub fn phrase_search(resource_id: i64, phrase: String, limit: Option<u32>) -> SearchResponse {
    let limit = match limit {
        Some(0) | None => DEFAULT_MATCH_LIMIT,
        Some(value) => value.min(SEARCH_LIMIT_MAX) as usize,
    };
    let result = with_workbook(resource_id, |workbook| {
        let mut rng = rand::rng();
        let options = SearchOptions {
            limit,
            books: None,
        };
        let matches = find_phrase(workbook, &phrase, &options, &mut rng)?;
        if matches.hits.is_empty() {
            let verses = random_verses(workbook, RANDOM_VERSE_COUNT, &mut rng)?;
            return Ok((verses, 0, false));
        }
        Ok((matches.hits, matches.total, matches.sampled))
    });
    match result {
        Ok((hits, total, sampled)) => SearchResponse {
            ok: true,
            message: if total == 0 {
                "No matches.".to_string()
            } else {
                format!("Found {total} verse(s).")
            },
            items: hits.into_iter().map(to_verse_item).collect(),
            total: to_u32(total),
            sampled,
        },
        Err(message) => SearchResponse {
            ok: false,
            items: Vec::new(),
            total: 0,
            sampled: false,
            message,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterResponse {
    pub ok: bool,
    pub book: String,
    pub chapter: u32,
    pub verses: Vec<VerseItem>,
    pub message: String,
}

/// Loads one chapter for the reader; parses the book on first access.
pub fn read_chapter(resource_id: i64, book: String, chapter: u32) -> ChapterResponse {
    let result = with_workbook(resource_id, |workbook| {
        let found = workbook.chapter(&book, chapter)?;
        Ok(found
            .verses
            .iter()
            .map(|verse| VerseItem {
                reference: VerseRef::new(book.as_str(), chapter, verse.number).to_string(),
                text: verse.text.clone(),
                match_start: 0,
                match_end: 0,
            })
            .collect::<Vec<_>>())
    });
    match result {
        Ok(verses) => ChapterResponse {
            ok: true,
            book,
            chapter,
            verses,
            message: String::new(),
        },
        Err(message) => ChapterResponse {
            ok: false,
            book,
            chapter,
            verses: Vec::new(),
            message,
        },
    }
}

/// Exports a glossary archive to `dest_path`.
pub fn glossary_export(glossary_id: String, dest_path: String) -> ActionResponse {
    let result = parse_id(&glossary_id, "glossary").and_then(|id| {
        with_conn(|conn, config| Ok(export_glossary(conn, config, id, dest_path.trim())?))
    });
    match result {
        Ok(summary) => ActionResponse::success(
            format!("Exported {} phrase(s).", summary.phrases),
            Some(glossary_id),
        ),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Imports a glossary archive.
pub fn glossary_import(archive_path: String) -> ActionResponse {
    match with_conn(|conn, config| Ok(import_glossary(conn, config, archive_path.trim())?)) {
        Ok(summary) => ActionResponse::success(
            format!("Imported `{}` with {} phrase(s).", summary.code, summary.phrases),
            Some(summary.glossary_id.to_string()),
        ),
        Err(message) => ActionResponse::failure(message),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub language: String,
    pub language_name: String,
    pub kind: String,
    pub version: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogResponse {
    pub ok: bool,
    pub items: Vec<CatalogItem>,
    pub message: String,
}

/// Fetches the remote catalog (retried with backoff).
pub fn catalog_fetch() -> CatalogResponse {
    let config = resolve_config();
    let result = CatalogClient::new(&config)
        .and_then(|client| client.fetch_catalog())
        .map_err(|err| {
            warn!("event=ffi_call module=ffi status=error error={err}");
            err.user_message()
        });
    match result {
        Ok(catalog) => CatalogResponse {
            ok: true,
            items: catalog
                .entries()
                .map(|(language, resource)| CatalogItem {
                    language: language.slug.clone(),
                    language_name: language.name.clone(),
                    kind: resource.kind.clone(),
                    version: resource.version.clone(),
                    title: resource.title.clone(),
                })
                .collect(),
            message: String::new(),
        },
        Err(message) => CatalogResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Downloads and registers one catalog resource.
pub fn catalog_install(language: String, kind: String) -> ActionResponse {
    let result = with_conn(|conn, config| {
        let client = CatalogClient::new(config)?;
        let catalog = client.fetch_catalog()?;
        let (found_language, found_resource) = catalog
            .find(language.trim(), kind.trim())
            .ok_or_else(|| ServiceError::NotFound {
                entity: "resource",
                key: format!("{language}_{kind}"),
            })?;
        ResourceService::new(conn, config).install_from_catalog(
            &client,
            found_language,
            found_resource,
        )
    });
    match result {
        Ok(resource) => ActionResponse::success(
            format!("Installed {}.", resource.slug()),
            Some(resource.id.to_string()),
        ),
        Err(message) => ActionResponse::failure(message),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub theme: String,
    pub locale: String,
    pub last_glossary_id: Option<String>,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    let result = with_conn(|conn, _| {
        let settings = SettingsService::new(conn);
        Ok((
            settings.theme()?,
            settings.locale()?,
            settings.last_glossary_id()?,
        ))
    });
    match result {
        Ok((theme, locale, last)) => SettingsResponse {
            ok: true,
            theme: theme.as_str().to_string(),
            locale,
            last_glossary_id: last.map(|id| id.to_string()),
            message: String::new(),
        },
        Err(message) => SettingsResponse {
            ok: false,
            theme: Theme::default().as_str().to_string(),
            locale: String::new(),
            last_glossary_id: None,
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_set(theme: Option<String>, locale: Option<String>) -> ActionResponse {
    let theme = match theme.as_deref().map(Theme::parse) {
        Some(None) => return ActionResponse::failure("unknown theme"),
        Some(Some(theme)) => Some(theme),
        None => None,
    };
    let result = with_conn(|conn, _| {
        let settings = SettingsService::new(conn);
        if let Some(theme) = theme {
            settings.set_theme(theme)?;
        }
        if let Some(locale) = locale.as_deref() {
            settings.set_locale(locale)?;
        }
        Ok(())
    });
    match result {
        Ok(()) => ActionResponse::success("Settings saved.", None),
        Err(message) => ActionResponse::failure(message),
    }
}

fn with_conn<T>(
    f: impl FnOnce(&Connection, &AppConfig) -> Result<T, ServiceError>,
) -> Result<T, String> {
    let config = resolve_config();
    let conn = open_db(&config.db_path).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error error_code=db_open_failed error={err}");
        "database unavailable".to_string()
    })?;
    f(&conn, &config).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error error={err}");
        err.user_message()
    })
}

fn with_workbook<T>(
    resource_id: ResourceId,
    f: impl FnOnce(&Workbook) -> Result<T, ServiceError>,
) -> Result<T, String> {
    let cached = lock(&WORKBOOKS)
        .as_ref()
        .and_then(|cache| cache.get(&resource_id).cloned());
    let workbook = match cached {
        Some(workbook) => workbook,
        None => {
            let opened = Arc::new(with_conn(|conn, config| {
                ResourceService::new(conn, config).open_workbook(resource_id)
            })?);
            lock(&WORKBOOKS)
                .get_or_insert_with(HashMap::new)
                .entry(resource_id)
                .or_insert(opened)
                .clone()
        }
    };
    f(&workbook).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error resource_id={resource_id} error={err}");
        err.user_message()
    })
}

fn resolve_config() -> AppConfig {
    lock(&APP_CONFIG)
        .get_or_insert_with(AppConfig::from_env)
        .clone()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn parse_id(value: &str, entity: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid {entity} id"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_glossary_item(glossary: Glossary) -> GlossaryItem {
    GlossaryItem {
        id: glossary.id.to_string(),
        code: glossary.code,
        author: glossary.author,
        resource_id: glossary.resource_id,
        updated_at: glossary.updated_at,
    }
}

fn to_phrase_item(phrase: Phrase, refs: Vec<String>) -> PhraseItem {
    PhraseItem {
        id: phrase.id.to_string(),
        phrase: phrase.phrase,
        spelling: phrase.spelling,
        description: phrase.description,
        audio: phrase.audio,
        refs,
    }
}

fn to_verse_item(hit: PhraseHit) -> VerseItem {
    VerseItem {
        reference: hit.location.to_string(),
        match_start: utf16_offset(&hit.text, hit.match_start),
        match_end: utf16_offset(&hit.text, hit.match_end),
        text: hit.text,
    }
}

/// Converts a UTF-8 byte offset in `text` to a UTF-16 code unit offset.
fn utf16_offset(text: &str, byte_offset: usize) -> u32 {
    let prefix = text.get(..byte_offset.min(text.len())).unwrap_or(text);
    to_u32(prefix.encode_utf16().count())
}

#[cfg(test)]
mod tests {
    use super::{
        app_init, configure, core_version, glossary_create, glossary_import, glossary_list,
        init_logging, language_list, phrase_add, phrase_search, ping, settings_get, settings_set,
        to_verse_item,
    };
    use glossary_core::model::reference::VerseRef;
    use glossary_core::PhraseHit;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    static TEST_GUARD: Mutex<()> = Mutex::new(());
    static DATA_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();

    fn configured() -> MutexGuard<'static, ()> {
        let guard = TEST_GUARD
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = DATA_DIR.get_or_init(|| tempfile::tempdir().expect("temp dir"));
        let response = configure(dir.path().to_string_lossy().into_owned(), None, None);
        assert!(response.ok, "{}", response.message);
        guard
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn verse_item_offsets_count_utf16_units() {
        let text = "Jésus dit: lumière";
        let match_start = text.find("lumière").unwrap();
        let item = to_verse_item(PhraseHit {
            location: VerseRef::new("jhn", 8, 12),
            text: text.to_string(),
            match_start,
            match_end: text.len(),
        });
        assert_eq!(match_start, 12);
        assert_eq!(item.match_start, 11);
        assert_eq!(item.match_end, 18);

        let units: Vec<u16> = item.text.encode_utf16().collect();
        let highlighted =
            String::from_utf16(&units[item.match_start as usize..item.match_end as usize]).unwrap();
        assert_eq!(highlighted, "lumière");
    }

    #[test]
    fn verse_item_offsets_handle_astral_characters() {
        let text = "\u{1F54A} dove";
        let item = to_verse_item(PhraseHit {
            location: VerseRef::new("mat", 3, 16),
            text: text.to_string(),
            match_start: text.find("dove").unwrap(),
            match_end: text.len(),
        });
        assert_eq!(item.match_start, 3);
        assert_eq!(item.match_end, 7);
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_rejects_blank_data_dir() {
        assert!(!configure("  ".to_string(), None, None).ok);
    }

    #[test]
    fn app_init_seeds_languages_once() {
        let _guard = configured();
        let first = app_init();
        assert!(first.ok, "{}", first.message);
        let second = app_init();
        assert!(second.ok, "{}", second.message);
        assert_eq!(second.languages_seeded, 0);
        assert!(!second.first_run);

        let gateway = language_list(true);
        assert!(gateway.ok);
        assert!(gateway.items.iter().any(|item| item.slug == "en"));
        assert!(gateway.items.iter().all(|item| item.gateway));
    }

    #[test]
    fn glossary_create_reports_missing_resource() {
        let _guard = configured();
        assert!(app_init().ok);
        let response = glossary_create(
            "demo".to_string(),
            "tester".to_string(),
            "en".to_string(),
            "fr".to_string(),
            9_999,
        );
        assert!(!response.ok);
        assert_eq!(response.message, "resource not found");
        assert!(glossary_list().ok);
    }

    #[test]
    fn phrase_add_rejects_malformed_glossary_id() {
        let _guard = configured();
        let response = phrase_add(
            "not-a-uuid".to_string(),
            "light".to_string(),
            String::new(),
            String::new(),
        );
        assert!(!response.ok);
        assert_eq!(response.message, "invalid glossary id");
    }

    #[test]
    fn search_on_unknown_resource_fails_without_panic() {
        let _guard = configured();
        let response = phrase_search(9_999, "light".to_string(), Some(5));
        assert!(!response.ok);
        assert_eq!(response.message, "resource not found");
    }

    #[test]
    fn import_of_missing_file_fails_gracefully() {
        let _guard = configured();
        let response = glossary_import("/definitely/missing/archive.zip".to_string());
        assert!(!response.ok);
        assert!(!response.message.is_empty());
    }

    #[test]
    fn settings_round_trip_and_reject_unknown_theme() {
        let _guard = configured();
        assert!(settings_set(Some("dark".to_string()), Some("fr".to_string())).ok);
        let settings = settings_get();
        assert!(settings.ok);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.locale, "fr");

        assert!(!settings_set(Some("neon".to_string()), None).ok);
    }
}

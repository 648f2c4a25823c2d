//! Glossary import.
//!
//! # Invariants
//! - All checks (manifest, duplicates, languages) run before any write.
//! - Rows are written in one immediate transaction.
//! - Files are extracted only under the configured resources/audio dirs.

use crate::archive::format::{
    plain_file_name, ArchiveManifest, AUDIO_PREFIX, FORMAT_VERSION, MANIFEST_ENTRY,
    RESOURCES_PREFIX,
};
use crate::archive::{ArchiveError, ArchiveResult};
use crate::config::AppConfig;
use crate::container::ResourceContainer;
use crate::model::glossary::{normalize_code, Glossary, GlossaryId};
use crate::model::language::Language;
use crate::model::resource::{container_filename, NewResource, Resource};
use crate::repo::glossary_repo::{GlossaryRepository, SqliteGlossaryRepository};
use crate::repo::language_repo::SqliteLanguageRepository;
use crate::repo::phrase_repo::{PhraseRepository, SqlitePhraseRepository};
use crate::repo::ref_repo::{RefRepository, SqliteRefRepository};
use crate::repo::resource_repo::SqliteResourceRepository;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// What an import restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub glossary_id: GlossaryId,
    pub code: String,
    pub phrases: usize,
    pub refs: usize,
    /// Whether the resource container was newly registered.
    pub resource_installed: bool,
}

type Archive = ZipArchive<BufReader<File>>;

/// Restores a glossary archive written by `export_glossary`.
///
/// # Errors
/// - `Corrupted` for a missing or unreadable `glossary.json`, an unknown
///   format version, or a missing resource container entry.
/// - `DuplicateGlossary` when the code or id is already present.
/// - `LanguageNotFound` when a language slug is unknown locally.
pub fn import_glossary(
    conn: &Connection,
    config: &AppConfig,
    archive_path: impl AsRef<Path>,
) -> ArchiveResult<ImportSummary> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|err| ArchiveError::Corrupted(err.to_string()))?;
    let manifest = read_manifest(&mut archive)?;

    let code = normalize_code(&manifest.glossary.code);
    let glossaries = SqliteGlossaryRepository::new(conn);
    if glossaries.get_glossary_by_code(&code)?.is_some()
        || glossaries.get_glossary(manifest.glossary.id)?.is_some()
    {
        warn!("event=glossary_import module=archive status=duplicate code={code}");
        return Err(ArchiveError::DuplicateGlossary(code));
    }

    let source = require_language(conn, &manifest.glossary.source_language)?;
    let target = require_language(conn, &manifest.glossary.target_language)?;
    let resource_language = require_language(conn, &manifest.resource.language)?;

    let existing_resource = SqliteResourceRepository::new(conn).find_resource(
        &resource_language.slug,
        &manifest.resource.kind,
        &manifest.resource.version,
    )?;
    let mut glossary = Glossary {
        id: manifest.glossary.id,
        code: code.clone(),
        author: manifest.glossary.author.clone(),
        source_language_id: source.id,
        target_language_id: target.id,
        resource_id: 0,
        created_at: manifest.glossary.created_at,
        updated_at: manifest.glossary.updated_at.max(manifest.glossary.created_at),
    };
    glossary
        .validate()
        .map_err(|err| ArchiveError::Corrupted(err.to_string()))?;

    let extracted = match existing_resource {
        Some(_) => None,
        None => Some(extract_container(
            &mut archive,
            config,
            &manifest,
            &resource_language.slug,
        )?),
    };

    let written = write_rows(
        conn,
        &mut glossary,
        existing_resource,
        &resource_language,
        extracted.as_deref(),
        &manifest,
    );
    let (phrase_count, ref_count) = match written {
        Ok(counts) => counts,
        Err(err) => {
            if let Some(path) = &extracted {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!(
                        "event=glossary_import module=archive status=cleanup_failed error={remove_err}"
                    );
                }
            }
            return Err(err);
        }
    };

    let resource_installed = extracted.is_some();
    extract_audio(&mut archive, config, &manifest);

    info!(
        "event=glossary_import module=archive status=ok glossary_id={} phrases={} refs={} resource_installed={}",
        glossary.id, phrase_count, ref_count, resource_installed
    );
    Ok(ImportSummary {
        glossary_id: glossary.id,
        code,
        phrases: phrase_count,
        refs: ref_count,
        resource_installed,
    })
}

fn read_manifest(archive: &mut Archive) -> ArchiveResult<ArchiveManifest> {
    let mut entry = archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|_| ArchiveError::Corrupted(format!("missing {MANIFEST_ENTRY}")))?;
    let mut json = Vec::new();
    entry.read_to_end(&mut json)?;

    let manifest: ArchiveManifest = serde_json::from_slice(&json)
        .map_err(|err| ArchiveError::Corrupted(format!("invalid {MANIFEST_ENTRY}: {err}")))?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(ArchiveError::Corrupted(format!(
            "unsupported format version {}",
            manifest.format_version
        )));
    }
    Ok(manifest)
}

fn require_language(conn: &Connection, slug: &str) -> ArchiveResult<Language> {
    SqliteLanguageRepository::new(conn)
        .get_language(slug.trim())?
        .ok_or_else(|| ArchiveError::LanguageNotFound(slug.to_string()))
}

/// Copies the bundled container into the resources dir and checks it opens.
fn extract_container(
    archive: &mut Archive,
    config: &AppConfig,
    manifest: &ArchiveManifest,
    language_slug: &str,
) -> ArchiveResult<PathBuf> {
    let descriptor = &manifest.resource;
    let entry_name = plain_file_name(&descriptor.filename)
        .map(|name| format!("{RESOURCES_PREFIX}{name}"))
        .ok_or_else(|| {
            ArchiveError::Corrupted(format!("invalid resource file name `{}`", descriptor.filename))
        })?;
    let target_name = container_filename(language_slug, &descriptor.kind, &descriptor.version)
        .map_err(|err| ArchiveError::Corrupted(err.to_string()))?;
    let target = config.resource_path(&target_name);

    std::fs::create_dir_all(&config.resources_dir)?;
    let partial = target.with_extension("part");
    {
        let mut entry = archive
            .by_name(&entry_name)
            .map_err(|_| ArchiveError::Corrupted(format!("missing {entry_name}")))?;
        let mut out = File::create(&partial)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    if let Err(err) = ResourceContainer::open(&partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(err.into());
    }
    std::fs::rename(&partial, &target)?;
    Ok(target)
}

/// Registers the resource when new and inserts the glossary rows, all in
/// one immediate transaction.
fn write_rows(
    conn: &Connection,
    glossary: &mut Glossary,
    existing_resource: Option<Resource>,
    resource_language: &Language,
    extracted: Option<&Path>,
    manifest: &ArchiveManifest,
) -> ArchiveResult<(usize, usize)> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let resource = match existing_resource {
        Some(resource) => resource,
        None => {
            let filename = extracted
                .and_then(|path| path.file_name())
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| manifest.resource.filename.clone());
            SqliteResourceRepository::new(&tx).insert_resource(&NewResource {
                language_id: resource_language.id,
                kind: manifest.resource.kind.clone(),
                version: manifest.resource.version.clone(),
                format: manifest.resource.format.clone(),
                filename,
            })?
        }
    };
    glossary.resource_id = resource.id;
    let counts = insert_rows(&tx, glossary, &resource, manifest)?;
    tx.commit()?;
    Ok(counts)
}

fn insert_rows(
    tx: &Transaction<'_>,
    glossary: &Glossary,
    resource: &Resource,
    manifest: &ArchiveManifest,
) -> ArchiveResult<(usize, usize)> {
    SqliteGlossaryRepository::new(tx).insert_glossary(glossary)?;

    let phrases = SqlitePhraseRepository::new(tx);
    let refs = SqliteRefRepository::new(tx);
    let mut ref_count = 0;
    for archived in &manifest.phrases {
        let mut phrase = archived.to_phrase(glossary.id);
        phrase.audio = phrase
            .audio
            .as_deref()
            .and_then(plain_file_name)
            .map(str::to_string);
        phrase
            .validate()
            .map_err(|err| ArchiveError::Corrupted(err.to_string()))?;
        phrases.insert_phrase(&phrase)?;

        for location in &archived.refs {
            location
                .validate()
                .map_err(|err| ArchiveError::Corrupted(err.to_string()))?;
            refs.insert_ref(phrase.id, resource.id, location)?;
            ref_count += 1;
        }
    }
    Ok((manifest.phrases.len(), ref_count))
}

/// Best effort; a missing clip leaves the phrase without playable audio.
fn extract_audio(archive: &mut Archive, config: &AppConfig, manifest: &ArchiveManifest) {
    for name in manifest
        .phrases
        .iter()
        .filter_map(|phrase| phrase.audio.as_deref())
        .filter_map(plain_file_name)
    {
        let entry_name = format!("{AUDIO_PREFIX}{name}");
        let result = std::fs::create_dir_all(&config.audio_dir)
            .map_err(ArchiveError::from)
            .and_then(|()| {
                let mut entry = archive.by_name(&entry_name)?;
                let mut out = File::create(config.audio_path(name))?;
                std::io::copy(&mut entry, &mut out)?;
                Ok(())
            });
        if let Err(err) = result {
            warn!("event=glossary_import module=archive status=audio_skipped error={err}");
        }
    }
}

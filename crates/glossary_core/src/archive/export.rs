//! Glossary export: one linear pass from database rows to a zip file.

use crate::archive::format::{
    ArchiveManifest, ArchivedGlossary, ArchivedPhrase, ArchivedResource, AUDIO_PREFIX,
    FORMAT_VERSION, MANIFEST_ENTRY, RESOURCES_PREFIX,
};
use crate::archive::{ArchiveError, ArchiveResult};
use crate::config::AppConfig;
use crate::model::glossary::GlossaryId;
use crate::model::now_epoch_ms;
use crate::repo::glossary_repo::{GlossaryRepository, SqliteGlossaryRepository};
use crate::repo::language_repo::SqliteLanguageRepository;
use crate::repo::phrase_repo::{PhraseRepository, SqlitePhraseRepository};
use crate::repo::ref_repo::{RefRepository, SqliteRefRepository};
use crate::repo::resource_repo::SqliteResourceRepository;
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub phrases: usize,
    pub refs: usize,
    pub audio_files: usize,
}

/// Writes `glossary_id` with its resource container and audio to `dest`.
///
/// The archive is assembled next to `dest` and renamed into place, so a
/// failed export never leaves a truncated file at `dest`.
pub fn export_glossary(
    conn: &Connection,
    config: &AppConfig,
    glossary_id: GlossaryId,
    dest: impl AsRef<Path>,
) -> ArchiveResult<ExportSummary> {
    let dest = dest.as_ref();
    let glossary = SqliteGlossaryRepository::new(conn)
        .get_glossary(glossary_id)?
        .ok_or(ArchiveError::GlossaryNotFound(glossary_id))?;

    let languages = SqliteLanguageRepository::new(conn);
    let language_slug = |id| -> ArchiveResult<String> {
        languages
            .get_language_by_id(id)?
            .map(|language| language.slug)
            .ok_or_else(|| RepoError::not_found("language", id).into())
    };
    let source_language = language_slug(glossary.source_language_id)?;
    let target_language = language_slug(glossary.target_language_id)?;

    let resource = SqliteResourceRepository::new(conn)
        .get_resource(glossary.resource_id)?
        .ok_or_else(|| ArchiveError::from(RepoError::not_found("resource", glossary.resource_id)))?;
    let container_path = config.resource_path(&resource.filename);
    if !container_path.is_file() {
        return Err(ArchiveError::ResourceFileMissing(container_path));
    }

    let phrase_repo = SqlitePhraseRepository::new(conn);
    let ref_repo = SqliteRefRepository::new(conn);
    let mut phrases = Vec::new();
    let mut audio_files = Vec::new();
    let mut ref_count = 0;
    for phrase in phrase_repo.list_phrases(glossary.id)? {
        let refs: Vec<_> = ref_repo
            .list_refs(phrase.id)?
            .into_iter()
            .filter(|reference| reference.resource_id == resource.id)
            .map(|reference| reference.location)
            .collect();
        ref_count += refs.len();

        let audio = phrase.audio.clone().filter(|name| {
            let present = config.audio_path(name).is_file();
            if !present {
                warn!(
                    "event=glossary_export module=archive status=audio_missing phrase_id={}",
                    phrase.id
                );
            }
            present
        });
        if let Some(name) = audio.as_ref() {
            audio_files.push(name.clone());
        }
        phrases.push(ArchivedPhrase::from_phrase(&phrase, audio, refs));
    }

    let manifest = ArchiveManifest {
        format_version: FORMAT_VERSION,
        exported_at: now_epoch_ms(),
        glossary: ArchivedGlossary::from_glossary(&glossary, &source_language, &target_language),
        resource: ArchivedResource::from(&resource),
        phrases,
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let partial = dest.with_extension("part");
    let written = write_archive(&partial, &manifest, &container_path, config, &audio_files);
    if let Err(err) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(err);
    }
    std::fs::rename(&partial, dest)?;

    info!(
        "event=glossary_export module=archive status=ok glossary_id={} phrases={} refs={} audio={}",
        glossary.id,
        manifest.phrases.len(),
        ref_count,
        audio_files.len()
    );
    Ok(ExportSummary {
        path: dest.to_path_buf(),
        phrases: manifest.phrases.len(),
        refs: ref_count,
        audio_files: audio_files.len(),
    })
}

fn write_archive(
    path: &Path,
    manifest: &ArchiveManifest,
    container_path: &Path,
    config: &AppConfig,
    audio_files: &[String],
) -> ArchiveResult<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    // Containers and audio are already compressed.
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let json = serde_json::to_vec_pretty(manifest)
        .map_err(|err| ArchiveError::Corrupted(format!("cannot encode manifest: {err}")))?;
    zip.start_file(MANIFEST_ENTRY, deflated)?;
    zip.write_all(&json)?;

    zip.start_file(
        format!("{RESOURCES_PREFIX}{}", manifest.resource.filename),
        stored,
    )?;
    std::io::copy(&mut File::open(container_path)?, &mut zip)?;

    for name in audio_files {
        zip.start_file(format!("{AUDIO_PREFIX}{name}"), stored)?;
        std::io::copy(&mut File::open(config.audio_path(name))?, &mut zip)?;
    }

    let mut inner = zip.finish()?;
    inner.flush()?;
    Ok(())
}

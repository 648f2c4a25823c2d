mod common;

use common::Fixture;
use glossary_core::archive::format::{FORMAT_VERSION, MANIFEST_ENTRY};
use glossary_core::service::{NewGlossaryRequest, PhraseInput};
use glossary_core::{
    export_glossary, import_glossary, ArchiveError, Glossary, GlossaryService, Resource,
    ResourceService, VerseRef,
};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

struct Seeded {
    glossary: Glossary,
    resource: Resource,
}

fn seed_glossary(fixture: &Fixture) -> Seeded {
    let resource = fixture.register_english();
    let service = GlossaryService::new(&fixture.conn);
    let glossary = service
        .create_glossary(&NewGlossaryRequest {
            code: "KT".to_string(),
            author: "Translator".to_string(),
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            resource_id: resource.id,
        })
        .unwrap();

    std::fs::write(fixture.config.audio_path("light.mp3"), b"ID3 light").unwrap();
    let light = service
        .add_phrase(
            glossary.id,
            &PhraseInput {
                phrase: "light".to_string(),
                spelling: "lumière".to_string(),
                description: "what God made first".to_string(),
                audio: Some("light.mp3".to_string()),
            },
        )
        .unwrap();
    service
        .link_refs(
            light.id,
            resource.id,
            &[VerseRef::new("gen", 1, 3), VerseRef::new("gen", 1, 4)],
        )
        .unwrap();
    service
        .add_phrase(
            glossary.id,
            &PhraseInput {
                phrase: "the deep".to_string(),
                spelling: "l'abîme".to_string(),
                description: String::new(),
                audio: Some("missing.mp3".to_string()),
            },
        )
        .unwrap();

    Seeded { glossary, resource }
}

fn glossary_count(fixture: &Fixture) -> i64 {
    fixture
        .conn
        .query_row("SELECT COUNT(*) FROM glossaries;", [], |row| row.get(0))
        .unwrap()
}

/// Copies `source` to `dest`, passing `glossary.json` through `edit`.
fn rewrite_manifest(source: &Path, dest: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
    let mut input = ZipArchive::new(File::open(source).unwrap()).unwrap();
    let mut output = ZipWriter::new(File::create(dest).unwrap());
    let mut edit = Some(edit);
    for index in 0..input.len() {
        let mut entry = input.by_index(index).unwrap();
        let name = entry.name().to_string();
        let mut body = Vec::new();
        entry.read_to_end(&mut body).unwrap();
        if name == MANIFEST_ENTRY {
            let mut manifest: serde_json::Value = serde_json::from_slice(&body).unwrap();
            if let Some(edit) = edit.take() {
                edit(&mut manifest);
            }
            body = serde_json::to_vec(&manifest).unwrap();
        }
        output
            .start_file(name, SimpleFileOptions::default())
            .unwrap();
        output.write_all(&body).unwrap();
    }
    output.finish().unwrap();
}

fn resource_files(fixture: &Fixture) -> Vec<String> {
    match std::fs::read_dir(&fixture.config.resources_dir) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn export_then_import_restores_glossary_in_fresh_install() {
    let source = Fixture::new();
    let seeded = seed_glossary(&source);
    let archive = source.scratch("kt.zip");

    let exported = export_glossary(&source.conn, &source.config, seeded.glossary.id, &archive)
        .unwrap();
    assert_eq!(exported.phrases, 2);
    assert_eq!(exported.refs, 2);
    assert_eq!(exported.audio_files, 1);
    assert!(archive.exists());

    let target = Fixture::new();
    let imported = import_glossary(&target.conn, &target.config, &archive).unwrap();
    assert_eq!(imported.glossary_id, seeded.glossary.id);
    assert_eq!(imported.code, "kt");
    assert_eq!(imported.phrases, 2);
    assert_eq!(imported.refs, 2);
    assert!(imported.resource_installed);

    let service = GlossaryService::new(&target.conn);
    let glossary = service.get_glossary_by_code("kt").unwrap();
    assert_eq!(glossary.author, "Translator");
    let light = service.find_phrase(glossary.id, "LIGHT").unwrap().unwrap();
    assert_eq!(light.spelling, "lumière");
    let refs: Vec<_> = service
        .list_refs(light.id)
        .unwrap()
        .into_iter()
        .map(|reference| reference.location.to_string())
        .collect();
    assert_eq!(refs, vec!["gen 1:3", "gen 1:4"]);
    assert_eq!(
        std::fs::read(target.config.audio_path("light.mp3")).unwrap(),
        b"ID3 light"
    );

    let resources = ResourceService::new(&target.conn, &target.config);
    let installed = resources.get_resource(glossary.resource_id).unwrap();
    assert_eq!(installed.slug(), seeded.resource.slug());
    let workbook = resources.open_workbook(installed.id).unwrap();
    assert_eq!(workbook.books().len(), 2);
}

#[test]
fn import_reuses_an_installed_resource() {
    let source = Fixture::new();
    let seeded = seed_glossary(&source);
    let archive = source.scratch("kt.zip");
    export_glossary(&source.conn, &source.config, seeded.glossary.id, &archive).unwrap();

    let target = Fixture::new();
    let installed = target.register_english();
    let imported = import_glossary(&target.conn, &target.config, &archive).unwrap();

    assert!(!imported.resource_installed);
    let glossary = GlossaryService::new(&target.conn)
        .get_glossary(imported.glossary_id)
        .unwrap();
    assert_eq!(glossary.resource_id, installed.id);
}

#[test]
fn duplicate_import_is_rejected_and_leaves_database_unchanged() {
    let fixture = Fixture::new();
    let seeded = seed_glossary(&fixture);
    let archive = fixture.scratch("kt.zip");
    export_glossary(&fixture.conn, &fixture.config, seeded.glossary.id, &archive).unwrap();

    let phrases_before = GlossaryService::new(&fixture.conn)
        .list_phrases(seeded.glossary.id)
        .unwrap();
    let err = import_glossary(&fixture.conn, &fixture.config, &archive).unwrap_err();

    assert!(matches!(err, ArchiveError::DuplicateGlossary(ref code) if code == "kt"));
    assert_eq!(err.user_message(), "glossary `kt` already exists");
    assert_eq!(glossary_count(&fixture), 1);
    assert_eq!(
        GlossaryService::new(&fixture.conn)
            .list_phrases(seeded.glossary.id)
            .unwrap(),
        phrases_before
    );
}

#[test]
fn archive_without_manifest_is_corrupted() {
    let fixture = Fixture::new();
    let path = fixture.scratch("broken.zip");
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file("notes.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"not a glossary").unwrap();
    zip.finish().unwrap();

    let err = import_glossary(&fixture.conn, &fixture.config, &path).unwrap_err();
    assert!(matches!(err, ArchiveError::Corrupted(_)));
    assert_eq!(err.user_message(), "glossary corrupted");
    assert_eq!(glossary_count(&fixture), 0);
}

#[test]
fn non_zip_file_and_unknown_version_are_corrupted() {
    let fixture = Fixture::new();
    let garbage = fixture.scratch("garbage.zip");
    std::fs::write(&garbage, b"plain text").unwrap();
    assert!(matches!(
        import_glossary(&fixture.conn, &fixture.config, &garbage).unwrap_err(),
        ArchiveError::Corrupted(_)
    ));

    let future = fixture.scratch("future.zip");
    let mut zip = ZipWriter::new(File::create(&future).unwrap());
    zip.start_file(MANIFEST_ENTRY, SimpleFileOptions::default())
        .unwrap();
    let body = format!(
        r#"{{"format_version":{},"exported_at":0,"glossary":{{}},"resource":{{}},"phrases":[]}}"#,
        FORMAT_VERSION + 1
    );
    zip.write_all(body.as_bytes()).unwrap();
    zip.finish().unwrap();
    assert!(matches!(
        import_glossary(&fixture.conn, &fixture.config, &future).unwrap_err(),
        ArchiveError::Corrupted(_)
    ));
}

#[test]
fn export_requires_the_resource_container_on_disk() {
    let fixture = Fixture::new();
    let seeded = seed_glossary(&fixture);
    std::fs::remove_file(fixture.config.resource_path(&seeded.resource.filename)).unwrap();

    let err = export_glossary(
        &fixture.conn,
        &fixture.config,
        seeded.glossary.id,
        fixture.scratch("kt.zip"),
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::ResourceFileMissing(_)));
    assert_eq!(err.user_message(), "resource not found");
    assert!(!fixture.scratch("kt.zip").exists());
}

#[test]
fn export_of_unknown_glossary_fails() {
    let fixture = Fixture::new();
    let err = export_glossary(
        &fixture.conn,
        &fixture.config,
        uuid::Uuid::new_v4(),
        fixture.scratch("none.zip"),
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::GlossaryNotFound(_)));
}

#[test]
fn failed_row_insert_removes_extracted_container() {
    let source = Fixture::new();
    let seeded = seed_glossary(&source);
    let exported = source.scratch("kt.zip");
    export_glossary(&source.conn, &source.config, seeded.glossary.id, &exported).unwrap();
    let archive = source.scratch("kt_blank_phrase.zip");
    rewrite_manifest(&exported, &archive, |manifest| {
        manifest["phrases"][1]["phrase"] = serde_json::Value::String("   ".to_string());
    });

    let target = Fixture::new();
    let err = import_glossary(&target.conn, &target.config, &archive).unwrap_err();

    assert!(matches!(err, ArchiveError::Corrupted(_)));
    assert_eq!(glossary_count(&target), 0);
    assert!(ResourceService::new(&target.conn, &target.config)
        .list_resources()
        .unwrap()
        .is_empty());
    assert!(resource_files(&target).is_empty());
}

#[test]
fn resource_names_with_path_separators_are_corrupted() {
    let source = Fixture::new();
    let seeded = seed_glossary(&source);
    let exported = source.scratch("kt.zip");
    export_glossary(&source.conn, &source.config, seeded.glossary.id, &exported).unwrap();
    let archive = source.scratch("kt_nested.zip");
    rewrite_manifest(&exported, &archive, |manifest| {
        manifest["resource"]["version"] = serde_json::Value::String("12/../../escape".to_string());
    });

    let target = Fixture::new();
    let err = import_glossary(&target.conn, &target.config, &archive).unwrap_err();

    assert!(matches!(err, ArchiveError::Corrupted(_)));
    assert_eq!(err.user_message(), "glossary corrupted");
    assert_eq!(glossary_count(&target), 0);
    assert!(resource_files(&target).is_empty());
}

mod common;

use common::{write_container, Fixture};
use glossary_core::catalog::languages::load_bundled_languages;
use glossary_core::container::ContainerError;
use glossary_core::db::open_db;
use glossary_core::model::validation::ValidationError;
use glossary_core::repo::language_repo::SqliteLanguageRepository;
use glossary_core::service::init_service::DEFAULT_RESOURCE_FILE;
use glossary_core::service::{NewGlossaryRequest, PhraseInput, Theme};
use glossary_core::{
    AppConfig, GlossaryService, InitService, ResourceService, ServiceError, SettingsService,
    VerseRef,
};

fn request(code: &str, resource_id: i64) -> NewGlossaryRequest {
    NewGlossaryRequest {
        code: code.to_string(),
        author: "Translator".to_string(),
        source_language: "en".to_string(),
        target_language: "fr".to_string(),
        resource_id,
    }
}

fn input(phrase: &str) -> PhraseInput {
    PhraseInput {
        phrase: phrase.to_string(),
        spelling: String::new(),
        description: String::new(),
        audio: None,
    }
}

#[test]
fn init_seeds_once_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::for_data_dir(dir.path().join("data"));
    let conn = open_db(&config.db_path).unwrap();

    let first = InitService::new(&conn, &config).run().unwrap();
    assert!(first.first_run);
    assert_eq!(first.languages_seeded, load_bundled_languages().unwrap().len());
    assert!(first.resource_seeded.is_none());
    assert!(config.resources_dir.is_dir());
    assert!(config.audio_dir.is_dir());

    let initialized_at = SettingsService::new(&conn).initialized_at().unwrap();
    let second = InitService::new(&conn, &config).run().unwrap();
    assert!(!second.first_run);
    assert_eq!(second.languages_seeded, 0);
    assert_eq!(
        SettingsService::new(&conn).initialized_at().unwrap(),
        initialized_at
    );
}

#[test]
fn init_registers_the_bundled_default_resource() {
    let dir = tempfile::tempdir().unwrap();
    let bundled = dir.path().join("bundled");
    std::fs::create_dir_all(&bundled).unwrap();
    write_container(&bundled.join(DEFAULT_RESOURCE_FILE), "en", "12", "en_ulb/");
    let config = AppConfig::for_data_dir(dir.path().join("data")).with_bundled_resources_dir(&bundled);
    let conn = open_db(&config.db_path).unwrap();

    let report = InitService::new(&conn, &config).run().unwrap();
    let seeded = report.resource_seeded.unwrap();
    assert_eq!(seeded.slug(), "en_ulb");
    assert!(config.resource_path(&seeded.filename).is_file());

    let again = InitService::new(&conn, &config).run().unwrap();
    assert!(again.resource_seeded.is_none());
    assert_eq!(
        ResourceService::new(&conn, &config)
            .list_resources()
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn registering_the_same_container_twice_is_rejected() {
    let fixture = Fixture::new();
    fixture.register_english();

    let again = fixture.scratch("copy.zip");
    write_container(&again, "en", "12", "");
    let err = ResourceService::new(&fixture.conn, &fixture.config)
        .register_container(&again)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { entity: "resource", .. }));
    assert_eq!(err.user_message(), "resource `en_ulb_v12` already exists");
}

#[test]
fn container_for_unknown_language_creates_it_from_the_manifest() {
    let fixture = Fixture::new();
    let path = fixture.scratch("qqq.zip");
    write_container(&path, "qqq", "1", "");

    let resource = ResourceService::new(&fixture.conn, &fixture.config)
        .register_container(&path)
        .unwrap();
    assert_eq!(resource.language.slug, "qqq");
    assert_eq!(resource.language.name, "Language qqq");
    assert!(!resource.language.gateway);
}

#[test]
fn container_version_with_path_separator_is_rejected_before_any_write() {
    let fixture = Fixture::new();
    let path = fixture.scratch("nested.zip");
    write_container(&path, "qqq", "1/../../escape", "");

    let service = ResourceService::new(&fixture.conn, &fixture.config);
    let err = service.register_container(&path).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Container(ContainerError::InvalidManifest(_))
    ));
    assert_eq!(err.user_message(), "resource corrupted");
    assert!(service.list_resources().unwrap().is_empty());
    let languages = SqliteLanguageRepository::new(&fixture.conn);
    assert!(languages.get_language("qqq").unwrap().is_none());
}

#[test]
fn create_glossary_validates_references_and_code() {
    let fixture = Fixture::new();
    let resource = fixture.register_english();
    let service = GlossaryService::new(&fixture.conn);

    let mut unknown_language = request("kt", resource.id);
    unknown_language.target_language = "zz-none".to_string();
    let err = service.create_glossary(&unknown_language).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "language", .. }));
    assert_eq!(err.user_message(), "language not found");

    let err = service.create_glossary(&request("kt", 999)).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "resource", .. }));

    let err = service.create_glossary(&request("not valid!", resource.id)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Invalid(ValidationError::InvalidGlossaryCode(_))
    ));

    service.create_glossary(&request("KT", resource.id)).unwrap();
    let err = service.create_glossary(&request("kt", resource.id)).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { entity: "glossary", .. }));
    assert_eq!(service.list_glossaries().unwrap().len(), 1);
}

#[test]
fn phrase_edits_touch_the_glossary() {
    let fixture = Fixture::new();
    let resource = fixture.register_english();
    let service = GlossaryService::new(&fixture.conn);
    let glossary = service.create_glossary(&request("kt", resource.id)).unwrap();

    fixture
        .conn
        .execute(
            "UPDATE glossaries SET updated_at = 1 WHERE id = ?1;",
            [glossary.id.to_string()],
        )
        .unwrap();
    let phrase = service.add_phrase(glossary.id, &input("  the   deep ")).unwrap();
    assert_eq!(phrase.phrase, "the deep");
    assert!(service.get_glossary(glossary.id).unwrap().updated_at > 1);

    let mut changed = input("the deep");
    changed.spelling = "l'abîme".to_string();
    changed.audio = Some("  ".to_string());
    let updated = service.update_phrase(phrase.id, &changed).unwrap();
    assert_eq!(updated.spelling, "l'abîme");
    assert_eq!(updated.audio, None);
    assert_eq!(service.get_phrase(phrase.id).unwrap(), updated);

    let err = service.add_phrase(glossary.id, &input("THE DEEP")).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { entity: "phrase", .. }));
    let err = service.add_phrase(glossary.id, &input("   ")).unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(ValidationError::BlankPhrase)));

    service.delete_phrase(phrase.id).unwrap();
    assert!(matches!(
        service.get_phrase(phrase.id).unwrap_err(),
        ServiceError::NotFound { entity: "phrase", .. }
    ));
}

#[test]
fn link_refs_replaces_previous_refs() {
    let fixture = Fixture::new();
    let resource = fixture.register_english();
    let service = GlossaryService::new(&fixture.conn);
    let glossary = service.create_glossary(&request("kt", resource.id)).unwrap();
    let phrase = service.add_phrase(glossary.id, &input("light")).unwrap();

    service
        .link_refs(
            phrase.id,
            resource.id,
            &[VerseRef::new("gen", 1, 3), VerseRef::new("gen", 1, 4)],
        )
        .unwrap();
    let linked = service
        .link_refs(
            phrase.id,
            resource.id,
            &[
                VerseRef::new("gen", 1, 5),
                VerseRef::new("GEN", 1, 5),
                VerseRef::new("gen", 1, 3),
            ],
        )
        .unwrap();

    let locations: Vec<_> = linked
        .iter()
        .map(|reference| reference.location.to_string())
        .collect();
    assert_eq!(locations, vec!["gen 1:5", "gen 1:3"]);

    let detail = service.phrase_detail(phrase.id).unwrap();
    assert_eq!(detail.refs, linked);

    let err = service
        .link_refs(phrase.id, resource.id, &[VerseRef::new("gen", 0, 1)])
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
    assert_eq!(service.list_refs(phrase.id).unwrap().len(), 2);
}

#[test]
fn deleting_a_glossary_removes_its_phrases() {
    let fixture = Fixture::new();
    let resource = fixture.register_english();
    let service = GlossaryService::new(&fixture.conn);
    let glossary = service.create_glossary(&request("kt", resource.id)).unwrap();
    let phrase = service.add_phrase(glossary.id, &input("light")).unwrap();

    service.delete_glossary(glossary.id).unwrap();
    assert!(matches!(
        service.get_phrase(phrase.id).unwrap_err(),
        ServiceError::NotFound { .. }
    ));
    assert!(matches!(
        service.list_phrases(glossary.id).unwrap_err(),
        ServiceError::NotFound { entity: "glossary", .. }
    ));

    let resources = ResourceService::new(&fixture.conn, &fixture.config);
    resources.delete_resource(resource.id).unwrap();
    assert!(!fixture.config.resource_path(&resource.filename).exists());
}

#[test]
fn settings_survive_reopening_the_database() {
    let fixture = Fixture::new();
    let settings = SettingsService::new(&fixture.conn);
    settings.set_theme(Theme::Dark).unwrap();
    settings.set_locale("pt-br").unwrap();

    let reopened = open_db(&fixture.config.db_path).unwrap();
    let settings = SettingsService::new(&reopened);
    assert_eq!(settings.theme().unwrap(), Theme::Dark);
    assert_eq!(settings.locale().unwrap(), "pt-br");
}

//! Glossary, phrase and ref use-cases.
//!
//! # Responsibility
//! - Create and list glossaries from language slugs and a resource.
//! - Add, edit and remove phrases, keeping the parent glossary's
//!   `updated_at` current.
//! - Replace a phrase's refs for one resource atomically.
//!
//! # Invariants
//! - Phrase mutations require an existing glossary.
//! - `link_refs` either stores the full new ref set or leaves the old one.

use crate::model::glossary::{Glossary, GlossaryId};
use crate::model::now_epoch_ms;
use crate::model::phrase::{normalize_phrase, Phrase, PhraseId};
use crate::model::reference::{Ref, VerseRef};
use crate::model::resource::{Resource, ResourceId};
use crate::repo::glossary_repo::{GlossaryRepository, SqliteGlossaryRepository};
use crate::repo::language_repo::SqliteLanguageRepository;
use crate::repo::phrase_repo::{PhraseRepository, SqlitePhraseRepository};
use crate::repo::ref_repo::{RefRepository, SqliteRefRepository};
use crate::repo::resource_repo::SqliteResourceRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;

/// Input of the glossary creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGlossaryRequest {
    pub code: String,
    pub author: String,
    pub source_language: String,
    pub target_language: String,
    pub resource_id: ResourceId,
}

/// Editable phrase fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseInput {
    pub phrase: String,
    pub spelling: String,
    pub description: String,
    pub audio: Option<String>,
}

/// A phrase with its refs, as shown on the phrase detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseDetail {
    pub phrase: Phrase,
    pub refs: Vec<Ref>,
}

/// Glossary service over one connection.
pub struct GlossaryService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GlossaryService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a glossary.
    ///
    /// # Errors
    /// - `NotFound` for an unknown language slug or resource id.
    /// - `AlreadyExists` when the normalized code is taken.
    /// - `Invalid` for a malformed code or blank author.
    pub fn create_glossary(&self, request: &NewGlossaryRequest) -> ServiceResult<Glossary> {
        let languages = SqliteLanguageRepository::new(self.conn);
        let source = languages
            .get_language(request.source_language.trim())?
            .ok_or_else(|| ServiceError::not_found("language", &request.source_language))?;
        let target = languages
            .get_language(request.target_language.trim())?
            .ok_or_else(|| ServiceError::not_found("language", &request.target_language))?;
        self.resource(request.resource_id)?;

        let glossary = Glossary::new(
            &request.code,
            request.author.trim(),
            source.id,
            target.id,
            request.resource_id,
        );
        self.glossaries().insert_glossary(&glossary)?;

        info!(
            "event=glossary_create module=service status=ok glossary_id={}",
            glossary.id
        );
        Ok(glossary)
    }

    pub fn get_glossary(&self, id: GlossaryId) -> ServiceResult<Glossary> {
        self.glossaries()
            .get_glossary(id)?
            .ok_or_else(|| ServiceError::not_found("glossary", id))
    }

    pub fn get_glossary_by_code(&self, code: &str) -> ServiceResult<Glossary> {
        self.glossaries()
            .get_glossary_by_code(code)?
            .ok_or_else(|| ServiceError::not_found("glossary", code.trim()))
    }

    /// Most recently edited first.
    pub fn list_glossaries(&self) -> ServiceResult<Vec<Glossary>> {
        Ok(self.glossaries().list_glossaries()?)
    }

    /// Deletes a glossary with its phrases and refs.
    pub fn delete_glossary(&self, id: GlossaryId) -> ServiceResult<()> {
        self.glossaries().delete_glossary(id)?;
        info!("event=glossary_delete module=service status=ok glossary_id={id}");
        Ok(())
    }

    pub fn add_phrase(&self, glossary_id: GlossaryId, input: &PhraseInput) -> ServiceResult<Phrase> {
        self.get_glossary(glossary_id)?;

        let mut phrase = Phrase::new(
            glossary_id,
            &input.phrase,
            input.spelling.trim(),
            input.description.trim(),
        );
        phrase.audio = clean_audio(input.audio.as_deref());
        self.phrases().insert_phrase(&phrase)?;
        self.glossaries().touch_glossary(glossary_id)?;
        Ok(phrase)
    }

    /// Replaces every editable field of a phrase.
    pub fn update_phrase(&self, id: PhraseId, input: &PhraseInput) -> ServiceResult<Phrase> {
        let mut phrase = self.get_phrase(id)?;
        phrase.phrase = normalize_phrase(&input.phrase);
        phrase.spelling = input.spelling.trim().to_string();
        phrase.description = input.description.trim().to_string();
        phrase.audio = clean_audio(input.audio.as_deref());
        phrase.updated_at = now_epoch_ms().max(phrase.created_at);

        self.phrases().update_phrase(&phrase)?;
        self.glossaries().touch_glossary(phrase.glossary_id)?;
        Ok(phrase)
    }

    pub fn delete_phrase(&self, id: PhraseId) -> ServiceResult<()> {
        let phrase = self.get_phrase(id)?;
        self.phrases().delete_phrase(id)?;
        self.glossaries().touch_glossary(phrase.glossary_id)?;
        Ok(())
    }

    pub fn get_phrase(&self, id: PhraseId) -> ServiceResult<Phrase> {
        self.phrases()
            .get_phrase(id)?
            .ok_or_else(|| ServiceError::not_found("phrase", id))
    }

    /// Looks up a phrase by text, ignoring case and extra whitespace.
    pub fn find_phrase(&self, glossary_id: GlossaryId, text: &str) -> ServiceResult<Option<Phrase>> {
        Ok(self
            .phrases()
            .find_phrase(glossary_id, &normalize_phrase(text))?)
    }

    pub fn list_phrases(&self, glossary_id: GlossaryId) -> ServiceResult<Vec<Phrase>> {
        self.get_glossary(glossary_id)?;
        Ok(self.phrases().list_phrases(glossary_id)?)
    }

    /// Replaces the phrase's refs inside `resource_id` with `locations`.
    ///
    /// Duplicate locations collapse into one ref. Returns the phrase's refs
    /// in that resource after the write.
    pub fn link_refs(
        &self,
        phrase_id: PhraseId,
        resource_id: ResourceId,
        locations: &[VerseRef],
    ) -> ServiceResult<Vec<Ref>> {
        self.get_phrase(phrase_id)?;
        self.resource(resource_id)?;
        for location in locations {
            location.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let refs = SqliteRefRepository::new(&tx);
        let removed = refs.delete_refs_for_phrase(phrase_id, resource_id)?;
        for location in locations {
            refs.insert_ref(phrase_id, resource_id, location)?;
        }
        tx.commit()?;

        info!(
            "event=refs_link module=service status=ok phrase_id={} resource_id={} removed={} requested={}",
            phrase_id,
            resource_id,
            removed,
            locations.len()
        );
        Ok(self
            .list_refs(phrase_id)?
            .into_iter()
            .filter(|reference| reference.resource_id == resource_id)
            .collect())
    }

    pub fn list_refs(&self, phrase_id: PhraseId) -> ServiceResult<Vec<Ref>> {
        Ok(SqliteRefRepository::new(self.conn).list_refs(phrase_id)?)
    }

    pub fn phrase_detail(&self, phrase_id: PhraseId) -> ServiceResult<PhraseDetail> {
        let phrase = self.get_phrase(phrase_id)?;
        let refs = self.list_refs(phrase_id)?;
        Ok(PhraseDetail { phrase, refs })
    }

    fn resource(&self, id: ResourceId) -> ServiceResult<Resource> {
        SqliteResourceRepository::new(self.conn)
            .get_resource(id)?
            .ok_or_else(|| ServiceError::not_found("resource", id))
    }

    fn glossaries(&self) -> SqliteGlossaryRepository<'conn> {
        SqliteGlossaryRepository::new(self.conn)
    }

    fn phrases(&self) -> SqlitePhraseRepository<'conn> {
        SqlitePhraseRepository::new(self.conn)
    }
}

fn clean_audio(audio: Option<&str>) -> Option<String> {
    audio
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

//! Phrase data source.
//!
//! # Invariants
//! - A phrase text is unique per glossary, compared case-insensitively.
//! - Listing is ordered by phrase text (case-insensitive), then id.

use crate::model::glossary::GlossaryId;
use crate::model::phrase::{Phrase, PhraseId};
use crate::repo::{constraint_violation, parse_uuid, Constraint, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PHRASE_SELECT_SQL: &str = "SELECT
    id,
    glossary_id,
    phrase,
    spelling,
    description,
    audio,
    created_at,
    updated_at
FROM phrases";

/// Repository interface for phrase rows.
pub trait PhraseRepository {
    fn insert_phrase(&self, phrase: &Phrase) -> RepoResult<PhraseId>;
    /// Replaces text, spelling, description, audio and `updated_at`.
    fn update_phrase(&self, phrase: &Phrase) -> RepoResult<()>;
    fn get_phrase(&self, id: PhraseId) -> RepoResult<Option<Phrase>>;
    /// Case-insensitive exact lookup inside one glossary.
    fn find_phrase(&self, glossary_id: GlossaryId, text: &str) -> RepoResult<Option<Phrase>>;
    fn list_phrases(&self, glossary_id: GlossaryId) -> RepoResult<Vec<Phrase>>;
    fn delete_phrase(&self, id: PhraseId) -> RepoResult<()>;
}

/// SQLite-backed phrase repository.
pub struct SqlitePhraseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePhraseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PhraseRepository for SqlitePhraseRepository<'_> {
    fn insert_phrase(&self, phrase: &Phrase) -> RepoResult<PhraseId> {
        phrase.validate()?;

        self.conn
            .execute(
                "INSERT INTO phrases (
                    id,
                    glossary_id,
                    phrase,
                    spelling,
                    description,
                    audio,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    phrase.id.to_string(),
                    phrase.glossary_id.to_string(),
                    phrase.phrase.as_str(),
                    phrase.spelling.as_str(),
                    phrase.description.as_str(),
                    phrase.audio.as_deref(),
                    phrase.created_at,
                    phrase.updated_at,
                ],
            )
            .map_err(|err| map_phrase_write_error(err, phrase))?;

        Ok(phrase.id)
    }

    fn update_phrase(&self, phrase: &Phrase) -> RepoResult<()> {
        phrase.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE phrases
                 SET
                    phrase = ?1,
                    spelling = ?2,
                    description = ?3,
                    audio = ?4,
                    updated_at = ?5
                 WHERE id = ?6;",
                params![
                    phrase.phrase.as_str(),
                    phrase.spelling.as_str(),
                    phrase.description.as_str(),
                    phrase.audio.as_deref(),
                    phrase.updated_at,
                    phrase.id.to_string(),
                ],
            )
            .map_err(|err| map_phrase_write_error(err, phrase))?;

        if changed == 0 {
            return Err(RepoError::not_found("phrase", phrase.id));
        }
        Ok(())
    }

    fn get_phrase(&self, id: PhraseId) -> RepoResult<Option<Phrase>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PHRASE_SELECT_SQL} WHERE id = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_phrase_row(row)))
            .optional()?
            .transpose()
    }

    fn find_phrase(&self, glossary_id: GlossaryId, text: &str) -> RepoResult<Option<Phrase>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHRASE_SELECT_SQL} WHERE glossary_id = ?1 AND phrase = ?2 COLLATE NOCASE;"
        ))?;
        stmt.query_row(params![glossary_id.to_string(), text.trim()], |row| {
            Ok(parse_phrase_row(row))
        })
        .optional()?
        .transpose()
    }

    fn list_phrases(&self, glossary_id: GlossaryId) -> RepoResult<Vec<Phrase>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHRASE_SELECT_SQL}
             WHERE glossary_id = ?1
             ORDER BY phrase COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([glossary_id.to_string()])?;
        let mut phrases = Vec::new();
        while let Some(row) = rows.next()? {
            phrases.push(parse_phrase_row(row)?);
        }
        Ok(phrases)
    }

    fn delete_phrase(&self, id: PhraseId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM phrases WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("phrase", id));
        }
        Ok(())
    }
}

fn map_phrase_write_error(err: rusqlite::Error, phrase: &Phrase) -> RepoError {
    match constraint_violation(&err) {
        Some(Constraint::Unique) => RepoError::conflict("phrase", &phrase.phrase),
        Some(Constraint::ForeignKey) => RepoError::not_found("glossary", phrase.glossary_id),
        None => err.into(),
    }
}

fn parse_phrase_row(row: &Row<'_>) -> RepoResult<Phrase> {
    let id_text: String = row.get("id")?;
    let glossary_text: String = row.get("glossary_id")?;
    Ok(Phrase {
        id: parse_uuid(&id_text, "phrases.id")?,
        glossary_id: parse_uuid(&glossary_text, "phrases.glossary_id")?,
        phrase: row.get("phrase")?,
        spelling: row.get("spelling")?,
        description: row.get("description")?,
        audio: row.get("audio")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

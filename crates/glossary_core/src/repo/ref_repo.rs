//! Ref data source: phrase occurrences at verse locations.
//!
//! # Invariants
//! - `(phrase, resource, book, chapter, verse)` is unique; inserting an
//!   existing locator returns the existing row id.
//! - Listing preserves insertion order.

use crate::model::phrase::PhraseId;
use crate::model::reference::{Ref, RefId, VerseRef};
use crate::model::resource::ResourceId;
use crate::repo::{
    constraint_violation, int_to_u32, parse_uuid, Constraint, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

/// Repository interface for ref rows.
pub trait RefRepository {
    fn insert_ref(
        &self,
        phrase_id: PhraseId,
        resource_id: ResourceId,
        location: &VerseRef,
    ) -> RepoResult<RefId>;
    fn list_refs(&self, phrase_id: PhraseId) -> RepoResult<Vec<Ref>>;
    /// Deletes every ref of the phrase inside one resource; returns the count.
    fn delete_refs_for_phrase(
        &self,
        phrase_id: PhraseId,
        resource_id: ResourceId,
    ) -> RepoResult<usize>;
    fn delete_ref(&self, id: RefId) -> RepoResult<()>;
}

/// SQLite-backed ref repository.
pub struct SqliteRefRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRefRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RefRepository for SqliteRefRepository<'_> {
    fn insert_ref(
        &self,
        phrase_id: PhraseId,
        resource_id: ResourceId,
        location: &VerseRef,
    ) -> RepoResult<RefId> {
        location.validate()?;
        let phrase_text = phrase_id.to_string();

        self.conn
            .execute(
                "INSERT OR IGNORE INTO refs (phrase_id, resource_id, book, chapter, verse)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    phrase_text.as_str(),
                    resource_id,
                    location.book.as_str(),
                    location.chapter,
                    location.verse,
                ],
            )
            .map_err(|err| match constraint_violation(&err) {
                Some(Constraint::ForeignKey) => RepoError::not_found(
                    "phrase or resource",
                    format!("phrase={phrase_id} resource={resource_id}"),
                ),
                _ => err.into(),
            })?;

        let id = self.conn.query_row(
            "SELECT id FROM refs
             WHERE phrase_id = ?1
               AND resource_id = ?2
               AND book = ?3
               AND chapter = ?4
               AND verse = ?5;",
            params![
                phrase_text.as_str(),
                resource_id,
                location.book.as_str(),
                location.chapter,
                location.verse,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn list_refs(&self, phrase_id: PhraseId) -> RepoResult<Vec<Ref>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phrase_id, resource_id, book, chapter, verse
             FROM refs
             WHERE phrase_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([phrase_id.to_string()])?;
        let mut refs = Vec::new();
        while let Some(row) = rows.next()? {
            refs.push(parse_ref_row(row)?);
        }
        Ok(refs)
    }

    fn delete_refs_for_phrase(
        &self,
        phrase_id: PhraseId,
        resource_id: ResourceId,
    ) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM refs WHERE phrase_id = ?1 AND resource_id = ?2;",
            params![phrase_id.to_string(), resource_id],
        )?;
        Ok(deleted)
    }

    fn delete_ref(&self, id: RefId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM refs WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("ref", id));
        }
        Ok(())
    }
}

fn parse_ref_row(row: &Row<'_>) -> RepoResult<Ref> {
    let phrase_text: String = row.get("phrase_id")?;
    Ok(Ref {
        id: row.get("id")?,
        phrase_id: parse_uuid(&phrase_text, "refs.phrase_id")?,
        resource_id: row.get("resource_id")?,
        location: VerseRef {
            book: row.get("book")?,
            chapter: int_to_u32(row.get("chapter")?, "refs.chapter")?,
            verse: int_to_u32(row.get("verse")?, "refs.verse")?,
        },
    })
}

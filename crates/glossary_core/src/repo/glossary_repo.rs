//! Glossary data source.
//!
//! # Responsibility
//! - Persist glossary metadata rows.
//! - Surface duplicate codes as `RepoError::Conflict`.
//!
//! # Invariants
//! - Listing is deterministic: `updated_at DESC, code ASC`.
//! - Deleting a glossary cascades to its phrases and refs.

use crate::model::glossary::{Glossary, GlossaryId};
use crate::repo::{constraint_violation, parse_uuid, Constraint, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const GLOSSARY_SELECT_SQL: &str = "SELECT
    id,
    code,
    author,
    source_language_id,
    target_language_id,
    resource_id,
    created_at,
    updated_at
FROM glossaries";

/// Repository interface for glossary rows.
pub trait GlossaryRepository {
    fn insert_glossary(&self, glossary: &Glossary) -> RepoResult<GlossaryId>;
    fn get_glossary(&self, id: GlossaryId) -> RepoResult<Option<Glossary>>;
    fn get_glossary_by_code(&self, code: &str) -> RepoResult<Option<Glossary>>;
    fn list_glossaries(&self) -> RepoResult<Vec<Glossary>>;
    /// Bumps `updated_at` to now (never backwards).
    fn touch_glossary(&self, id: GlossaryId) -> RepoResult<()>;
    fn delete_glossary(&self, id: GlossaryId) -> RepoResult<()>;
}

/// SQLite-backed glossary repository.
pub struct SqliteGlossaryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGlossaryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GlossaryRepository for SqliteGlossaryRepository<'_> {
    fn insert_glossary(&self, glossary: &Glossary) -> RepoResult<GlossaryId> {
        glossary.validate()?;

        self.conn
            .execute(
                "INSERT INTO glossaries (
                    id,
                    code,
                    author,
                    source_language_id,
                    target_language_id,
                    resource_id,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    glossary.id.to_string(),
                    glossary.code.as_str(),
                    glossary.author.trim(),
                    glossary.source_language_id,
                    glossary.target_language_id,
                    glossary.resource_id,
                    glossary.created_at,
                    glossary.updated_at,
                ],
            )
            .map_err(|err| match constraint_violation(&err) {
                Some(Constraint::Unique) => RepoError::conflict("glossary", &glossary.code),
                Some(Constraint::ForeignKey) => RepoError::not_found(
                    "language or resource",
                    format!(
                        "source={} target={} resource={}",
                        glossary.source_language_id,
                        glossary.target_language_id,
                        glossary.resource_id
                    ),
                ),
                None => err.into(),
            })?;

        Ok(glossary.id)
    }

    fn get_glossary(&self, id: GlossaryId) -> RepoResult<Option<Glossary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GLOSSARY_SELECT_SQL} WHERE id = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_glossary_row(row)))
            .optional()?
            .transpose()
    }

    fn get_glossary_by_code(&self, code: &str) -> RepoResult<Option<Glossary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GLOSSARY_SELECT_SQL} WHERE code = ?1;"))?;
        stmt.query_row([code.trim().to_lowercase()], |row| {
            Ok(parse_glossary_row(row))
        })
        .optional()?
        .transpose()
    }

    fn list_glossaries(&self) -> RepoResult<Vec<Glossary>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GLOSSARY_SELECT_SQL} ORDER BY updated_at DESC, code ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut glossaries = Vec::new();
        while let Some(row) = rows.next()? {
            glossaries.push(parse_glossary_row(row)?);
        }
        Ok(glossaries)
    }

    fn touch_glossary(&self, id: GlossaryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE glossaries
             SET updated_at = MAX(updated_at, strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("glossary", id));
        }
        Ok(())
    }

    fn delete_glossary(&self, id: GlossaryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM glossaries WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("glossary", id));
        }
        Ok(())
    }
}

fn parse_glossary_row(row: &Row<'_>) -> RepoResult<Glossary> {
    let id_text: String = row.get("id")?;
    let glossary = Glossary {
        id: parse_uuid(&id_text, "glossaries.id")?,
        code: row.get("code")?,
        author: row.get("author")?,
        source_language_id: row.get("source_language_id")?,
        target_language_id: row.get("target_language_id")?,
        resource_id: row.get("resource_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    glossary.validate()?;
    Ok(glossary)
}

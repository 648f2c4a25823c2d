//! Language data source.
//!
//! # Invariants
//! - `slug` is unique; upserts refresh names/direction/gateway in place and
//!   never change a language's row id.

use crate::model::language::{Language, LanguageId, NewLanguage, TextDirection};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Column list aliased so the same row parser serves joined queries.
pub(crate) const LANGUAGE_COLUMNS: &str = "languages.id AS language_id,
    languages.slug AS language_slug,
    languages.name AS language_name,
    languages.angle_name AS language_angle_name,
    languages.direction AS language_direction,
    languages.gateway AS language_gateway";

/// SQLite-backed language repository.
pub struct SqliteLanguageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLanguageRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts a language or refreshes the existing row with the same slug.
    pub fn upsert_language(&self, language: &NewLanguage) -> RepoResult<Language> {
        language.validate()?;
        self.conn.execute(
            "INSERT INTO languages (slug, name, angle_name, direction, gateway)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                angle_name = excluded.angle_name,
                direction = excluded.direction,
                gateway = excluded.gateway;",
            params![
                language.slug.as_str(),
                language.name.as_str(),
                language.angle_name.as_str(),
                language.direction.as_str(),
                bool_to_int(language.gateway),
            ],
        )?;

        self.get_language(&language.slug)?
            .ok_or_else(|| RepoError::not_found("language", &language.slug))
    }

    pub fn get_language(&self, slug: &str) -> RepoResult<Option<Language>> {
        self.query_one("WHERE languages.slug = ?1", slug)
    }

    pub fn get_language_by_id(&self, id: LanguageId) -> RepoResult<Option<Language>> {
        self.query_one("WHERE languages.id = ?1", id)
    }

    /// Lists all languages ordered by slug.
    pub fn list_languages(&self) -> RepoResult<Vec<Language>> {
        self.query_many("ORDER BY languages.slug ASC")
    }

    /// Lists gateway languages ordered by slug.
    pub fn list_gateway_languages(&self) -> RepoResult<Vec<Language>> {
        self.query_many("WHERE languages.gateway = 1 ORDER BY languages.slug ASC")
    }

    pub fn count_languages(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM languages;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn query_one(
        &self,
        clause: &str,
        key: impl rusqlite::ToSql,
    ) -> RepoResult<Option<Language>> {
        let sql = format!("SELECT {LANGUAGE_COLUMNS} FROM languages {clause};");
        let mut stmt = self.conn.prepare(&sql)?;
        let row = stmt
            .query_row([key], |row| Ok(parse_language_row(row)))
            .optional()?;
        row.transpose()
    }

    fn query_many(&self, clause: &str) -> RepoResult<Vec<Language>> {
        let sql = format!("SELECT {LANGUAGE_COLUMNS} FROM languages {clause};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut languages = Vec::new();
        while let Some(row) = rows.next()? {
            languages.push(parse_language_row(row)?);
        }
        Ok(languages)
    }
}

pub(crate) fn parse_language_row(row: &Row<'_>) -> RepoResult<Language> {
    let direction_text: String = row.get("language_direction")?;
    let direction = TextDirection::parse(&direction_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid direction `{direction_text}` in languages.direction"
        ))
    })?;

    Ok(Language {
        id: row.get("language_id")?,
        slug: row.get("language_slug")?,
        name: row.get("language_name")?,
        angle_name: row.get("language_angle_name")?,
        direction,
        gateway: int_to_bool(row.get("language_gateway")?, "languages.gateway")?,
    })
}

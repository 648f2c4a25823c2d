//! Resource data source.
//!
//! # Invariants
//! - `(language, type, version)` is unique.
//! - A resource referenced by a glossary or ref cannot be deleted.

use crate::model::resource::{NewResource, Resource, ResourceId};
use crate::repo::language_repo::{parse_language_row, LANGUAGE_COLUMNS};
use crate::repo::{constraint_violation, Constraint, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// SQLite-backed resource repository.
pub struct SqliteResourceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResourceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert_resource(&self, resource: &NewResource) -> RepoResult<Resource> {
        let key = format!(
            "language={} type={} version={}",
            resource.language_id, resource.kind, resource.version
        );
        self.conn
            .execute(
                "INSERT INTO resources (language_id, type, version, format, filename)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    resource.language_id,
                    resource.kind.as_str(),
                    resource.version.as_str(),
                    resource.format.as_str(),
                    resource.filename.as_str(),
                ],
            )
            .map_err(|err| match constraint_violation(&err) {
                Some(Constraint::Unique) => RepoError::conflict("resource", &key),
                Some(Constraint::ForeignKey) => {
                    RepoError::not_found("language", resource.language_id)
                }
                None => err.into(),
            })?;

        let id = self.conn.last_insert_rowid();
        self.get_resource(id)?
            .ok_or_else(|| RepoError::not_found("resource", id))
    }

    pub fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        let sql = format!("{} WHERE resources.id = ?1;", select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        stmt.query_row([id], |row| Ok(parse_resource_row(row)))
            .optional()?
            .transpose()
    }

    /// Finds a resource by its natural key.
    pub fn find_resource(
        &self,
        language_slug: &str,
        kind: &str,
        version: &str,
    ) -> RepoResult<Option<Resource>> {
        let sql = format!(
            "{} WHERE languages.slug = ?1 AND resources.type = ?2 AND resources.version = ?3;",
            select_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        stmt.query_row(params![language_slug, kind, version], |row| {
            Ok(parse_resource_row(row))
        })
        .optional()?
        .transpose()
    }

    /// Lists resources ordered by language slug, type and version.
    pub fn list_resources(&self) -> RepoResult<Vec<Resource>> {
        let sql = format!(
            "{} ORDER BY languages.slug ASC, resources.type ASC, resources.version ASC;",
            select_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut resources = Vec::new();
        while let Some(row) = rows.next()? {
            resources.push(parse_resource_row(row)?);
        }
        Ok(resources)
    }

    pub fn delete_resource(&self, id: ResourceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1;", [id])
            .map_err(|err| match constraint_violation(&err) {
                Some(Constraint::ForeignKey) => RepoError::conflict("resource reference", id),
                _ => err.into(),
            })?;
        if changed == 0 {
            return Err(RepoError::not_found("resource", id));
        }
        Ok(())
    }
}

fn select_sql() -> String {
    format!(
        "SELECT
            resources.id AS id,
            resources.type AS type,
            resources.version AS version,
            resources.format AS format,
            resources.filename AS filename,
            resources.created_at AS created_at,
            {LANGUAGE_COLUMNS}
         FROM resources
         JOIN languages ON languages.id = resources.language_id"
    )
}

fn parse_resource_row(row: &Row<'_>) -> RepoResult<Resource> {
    Ok(Resource {
        id: row.get("id")?,
        language: parse_language_row(row)?,
        kind: row.get("type")?,
        version: row.get("version")?,
        format: row.get("format")?,
        filename: row.get("filename")?,
        created_at: row.get("created_at")?,
    })
}

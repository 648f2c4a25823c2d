//! Schema migration steps for the glossary database.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order, starting at 1.
//! - Each step runs in its own transaction together with its
//!   `PRAGMA user_version` bump, so a failed step leaves earlier steps applied
//!   and the version pointing at the last good one.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "languages_resources_glossaries",
        sql: include_str!("0001_init.sql"),
    },
    Step {
        version: 2,
        name: "settings",
        sql: include_str!("0002_settings.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings the schema up to `latest_version()`.
///
/// Refuses databases written by a newer build instead of guessing.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let mut applied = 0;
    for step in STEPS.iter().filter(|step| step.version > from) {
        debug!(
            "event=db_migrate module=db status=start version={} name={}",
            step.version, step.name
        );
        run_step(conn, step).map_err(|source| DbError::Migration {
            version: step.version,
            source,
        })?;
        applied += 1;
    }

    if applied > 0 {
        info!(
            "event=db_migrate module=db status=ok from_version={from} to_version={latest} steps={applied}"
        );
    }
    Ok(())
}

fn run_step(conn: &mut Connection, step: &Step) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::{latest_version, STEPS};

    #[test]
    fn steps_are_contiguous_from_one() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), STEPS.len() as u32);
    }
}

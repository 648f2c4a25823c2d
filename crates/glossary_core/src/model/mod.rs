//! Domain records for glossaries and the scripture they point into.
//!
//! # Responsibility
//! - Define the plain data structures shared by repositories and services.
//! - Own field-level validation so every write path applies the same rules.
//!
//! # Invariants
//! - Glossaries and phrases are identified by UUIDs that survive export/import.
//! - Languages, resources and refs are identified by SQLite row ids.
//! - Timestamps are Unix epoch milliseconds.

pub mod glossary;
pub mod language;
pub mod phrase;
pub mod reference;
pub mod resource;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

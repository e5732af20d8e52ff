//! Record store: durable whole-table blobs over a key-value backend.
//!
//! # Responsibility
//! - Persist each entity table as one serialized array under a fixed key.
//! - Expose typed, indexed table projections to services.
//! - Commit staged table changes atomically and announce them on the bus.
//!
//! # Invariants
//! - Writes replace whole tables; there are no field-level writes.
//! - Corrupt or incompatible blobs read as empty tables on lenient paths.
//! - A commit whose tables moved on since they were loaded is rejected.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod keys;
mod kv;
mod record_store;
pub mod seed;
mod table;

pub use keys::{TableName, SESSION_KEY};
pub use kv::{KvEntry, KvStore, KvWrite, MemoryKvStore, SqliteKvStore};
pub use record_store::{BootstrapReport, ChangeSet, RecordStore};
pub use table::{Record, Table, UNREADABLE_REVISION};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Blob under `key` could not be (de)serialized.
    Serialization {
        key: String,
        source: serde_json::Error,
    },
    /// Another writer replaced `key` after it was loaded.
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },
    /// A staged insert collided with an existing id.
    DuplicateId { table: TableName, id: String },
    /// A backend lock was poisoned by a panicking writer.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization { key, source } => {
                write!(f, "invalid stored content under `{key}`: {source}")
            }
            Self::Conflict {
                key,
                expected,
                actual,
            } => write!(
                f,
                "`{key}` changed concurrently (expected revision {expected}, found {actual})"
            ),
            Self::DuplicateId { table, id } => write!(f, "id `{id}` already exists in `{table}`"),
            Self::Poisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
            Self::Conflict { .. } | Self::DuplicateId { .. } | Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

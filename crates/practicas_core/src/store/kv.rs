//! Key-value backends emulating the browser's local storage.
//!
//! # Responsibility
//! - Store one text blob per key together with a monotonically increasing
//!   revision.
//! - Apply batches of puts/deletes atomically, optionally guarded by the
//!   revision each write expects to replace.
//!
//! # Invariants
//! - An absent key has revision `0`; every put bumps the revision by one.
//! - A failed guard aborts the whole batch; nothing is written.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::store::{StoreError, StoreResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Stored blob plus the revision that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub value: String,
    pub revision: u64,
}

/// One mutation in a batch. `value: None` deletes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvWrite {
    pub key: String,
    pub value: Option<String>,
    pub expected_revision: Option<u64>,
}

impl KvWrite {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            expected_revision: None,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            expected_revision: None,
        }
    }

    /// Guards the write: it only applies while the key is still at `revision`.
    pub fn expecting(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Storage contract shared by the SQLite and in-memory backends.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<KvEntry>>;
    fn apply(&self, writes: &[KvWrite]) -> StoreResult<()>;
}

/// SQLite-backed store over the `kv_entries` table.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Wraps a connection that already went through `open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn with_conn<T>(&self, op: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        op(&mut guard)
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        self.with_conn(|conn| {
            let entry = conn
                .query_row(
                    "SELECT value, revision FROM kv_entries WHERE key = ?1;",
                    [key],
                    |row| {
                        Ok(KvEntry {
                            value: row.get(0)?,
                            revision: row.get::<_, i64>(1)?.max(0) as u64,
                        })
                    },
                )
                .optional()
                .map_err(DbError::from)?;
            Ok(entry)
        })
    }

    fn apply(&self, writes: &[KvWrite]) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(|err| log_busy(DbError::from(err)))?;
            for write in writes {
                apply_one(&tx, write)?;
            }
            tx.commit().map_err(|err| log_busy(DbError::from(err)))?;
            Ok(())
        })
    }
}

fn apply_one(tx: &Transaction<'_>, write: &KvWrite) -> StoreResult<()> {
    let current = tx
        .query_row(
            "SELECT revision FROM kv_entries WHERE key = ?1;",
            [write.key.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(DbError::from)?
        .map_or(0, |revision| revision.max(0) as u64);

    if let Some(expected) = write.expected_revision {
        if expected != current {
            return Err(StoreError::Conflict {
                key: write.key.clone(),
                expected,
                actual: current,
            });
        }
    }

    match write.value.as_deref() {
        Some(value) => {
            tx.execute(
                "INSERT INTO kv_entries (key, value, revision, updated_at)
                 VALUES (?1, ?2, 1, strftime('%s', 'now') * 1000)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    revision = kv_entries.revision + 1,
                    updated_at = excluded.updated_at;",
                params![write.key, value],
            )
            .map_err(DbError::from)?;
        }
        None => {
            tx.execute("DELETE FROM kv_entries WHERE key = ?1;", [write.key.as_str()])
                .map_err(DbError::from)?;
        }
    }
    Ok(())
}

fn log_busy(err: DbError) -> DbError {
    if err.is_busy() {
        warn!("event=kv_apply module=store status=busy error={err}");
    }
    err
}

/// Process-local store, handy for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, KvEntry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, writes: &[KvWrite]) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        for write in writes {
            let current = entries.get(&write.key).map_or(0, |entry| entry.revision);
            if let Some(expected) = write.expected_revision {
                if expected != current {
                    return Err(StoreError::Conflict {
                        key: write.key.clone(),
                        expected,
                        actual: current,
                    });
                }
            }
        }

        for write in writes {
            match &write.value {
                Some(value) => {
                    let revision = entries.get(&write.key).map_or(0, |entry| entry.revision) + 1;
                    entries.insert(
                        write.key.clone(),
                        KvEntry {
                            value: value.clone(),
                            revision,
                        },
                    );
                }
                None => {
                    entries.remove(&write.key);
                }
            }
        }
        Ok(())
    }
}

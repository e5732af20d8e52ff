//! Typed access to the persisted tables.

use crate::bus::{ChangeBus, ChangeEvent, ChangeKind};
use crate::clock::{format_timestamp, Clock, IdGenerator, SystemClock};
use crate::model::user::User;
use crate::model::RecordId;
use crate::store::kv::{KvEntry, KvStore, KvWrite, MemoryKvStore, SqliteKvStore};
use crate::store::seed::demo_users;
use crate::store::{Record, StoreError, StoreResult, Table, TableName, SESSION_KEY};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Tables staged for one atomic commit, with the events to announce after it.
#[derive(Debug, Default)]
pub struct ChangeSet {
    writes: Vec<(TableName, KvWrite)>,
    events: Vec<ChangeEvent>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `table` for writing and queues one event for `record_id`.
    ///
    /// Staging the same table twice keeps the latest content and both events.
    /// The write is guarded by the revision the table was loaded at.
    pub fn stage<T: Record>(
        &mut self,
        table: &Table<T>,
        kind: ChangeKind,
        record_id: &str,
    ) -> StoreResult<()> {
        let value = serialize_blob(T::TABLE.key(), table.rows())?;
        let write = KvWrite::put(T::TABLE.key(), value).expecting(table.revision());
        match self.writes.iter_mut().find(|(name, _)| *name == T::TABLE) {
            Some(slot) => slot.1 = write,
            None => self.writes.push((T::TABLE, write)),
        }
        self.events.push(ChangeEvent::new(
            T::TABLE,
            kind,
            Some(record_id.to_string()),
        ));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn tables(&self) -> Vec<TableName> {
        self.writes.iter().map(|(name, _)| *name).collect()
    }
}

/// What [`RecordStore::bootstrap`] had to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub seeded_demo_accounts: bool,
    pub initialized: Vec<TableName>,
}

/// Entry point for every read and write of portal data.
pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    bus: ChangeBus,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_clock(kv, Arc::new(SystemClock))
    }

    pub fn with_clock(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            bus: ChangeBus::new(),
            clock,
            ids: IdGenerator::new(),
        }
    }

    /// Opens (or creates) a SQLite-backed store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(Arc::new(SqliteKvStore::open(path)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKvStore::new()))
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current time in the stored timestamp format.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.clock.now())
    }

    pub fn next_id(&self) -> RecordId {
        self.ids.next_id(self.clock.now())
    }

    /// Reads a table strictly: `None` when never initialized, an error when
    /// the blob does not deserialize.
    pub fn read<T: Record>(&self) -> StoreResult<Option<Vec<T>>> {
        let key = T::TABLE.key();
        let Some(entry) = self.kv.get(key)? else {
            return Ok(None);
        };
        let rows = deserialize_blob(key, &entry.value)?;
        Ok(Some(rows))
    }

    /// Like [`RecordStore::read`] but indexed, and absent tables are empty.
    pub fn try_load<T: Record>(&self) -> StoreResult<Table<T>> {
        let key = T::TABLE.key();
        let Some(entry) = self.kv.get(key)? else {
            return Ok(Table::empty());
        };
        let rows = deserialize_blob(key, &entry.value)?;
        Ok(Table::from_rows(rows, entry.revision))
    }

    /// Reads a table for a view or a read-modify-write.
    ///
    /// Never fails: corrupt content or backend errors are logged and read as
    /// an empty table. Such a table never matches the stored revision, so a
    /// later commit cannot clobber content it never saw.
    pub fn load<T: Record>(&self) -> Table<T> {
        let key = T::TABLE.key();
        let entry = match self.kv.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Table::empty(),
            Err(err) => {
                warn!(
                    "event=table_load module=store status=fallback table={key} reason=backend error={err}"
                );
                return Table::empty();
            }
        };

        match deserialize_blob(key, &entry.value) {
            Ok(rows) => Table::from_rows(rows, entry.revision),
            Err(err) => {
                warn!(
                    "event=table_load module=store status=fallback table={} reason=corrupt revision={} error={}",
                    key, entry.revision, err
                );
                Table::unreadable()
            }
        }
    }

    /// Overwrites a whole table unconditionally and announces a reset.
    pub fn write<T: Record>(&self, rows: &[T]) -> StoreResult<()> {
        let key = T::TABLE.key();
        let value = serialize_blob(key, rows)?;
        self.kv.apply(&[KvWrite::put(key, value)])?;
        info!(
            "event=table_write module=store status=ok table={} rows={}",
            key,
            rows.len()
        );
        self.bus
            .publish(ChangeEvent::new(T::TABLE, ChangeKind::Reset, None));
        Ok(())
    }

    /// Writes every staged table in one atomic batch, then publishes the
    /// staged events in order. Nothing is published when the batch fails.
    pub fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let tables = join_tables(&changes.tables());
        let writes: Vec<KvWrite> = changes.writes.into_iter().map(|(_, write)| write).collect();
        if let Err(err) = self.kv.apply(&writes) {
            match err {
                StoreError::Conflict { .. } => warn!(
                    "event=store_commit module=store status=conflict tables={tables} error={err}"
                ),
                _ => error!(
                    "event=store_commit module=store status=error tables={tables} error={err}"
                ),
            }
            return Err(err);
        }

        info!(
            "event=store_commit module=store status=ok tables={} events={}",
            tables,
            changes.events.len()
        );
        for event in changes.events {
            self.bus.publish(event);
        }
        Ok(())
    }

    /// Initializes absent tables: demonstration accounts for `users` (when
    /// `seed_demo_accounts`), empty arrays for the rest. Existing tables are
    /// left untouched, so calling this repeatedly is harmless.
    pub fn bootstrap(&self, seed_demo_accounts: bool) -> StoreResult<BootstrapReport> {
        let mut report = BootstrapReport::default();
        let mut writes = Vec::new();

        for table in TableName::ALL {
            if self.kv.get(table.key())?.is_some() {
                continue;
            }
            let value = if table == TableName::Users && seed_demo_accounts {
                report.seeded_demo_accounts = true;
                serialize_blob(table.key(), &demo_users())?
            } else {
                "[]".to_string()
            };
            writes.push(KvWrite::put(table.key(), value).expecting(0));
            report.initialized.push(table);
        }

        self.kv.apply(&writes)?;
        info!(
            "event=store_bootstrap module=store status=ok seeded_demo_accounts={} initialized={}",
            report.seeded_demo_accounts,
            report.initialized.len()
        );
        for table in &report.initialized {
            self.bus
                .publish(ChangeEvent::new(*table, ChangeKind::Reset, None));
        }
        Ok(report)
    }

    /// Returns the logged-in user, or `None` when there is no readable session.
    pub fn session_user(&self) -> Option<User> {
        let entry = match self.kv.get(SESSION_KEY) {
            Ok(entry) => entry?,
            Err(err) => {
                warn!("event=session_load module=store status=fallback reason=backend error={err}");
                return None;
            }
        };
        match serde_json::from_str(&entry.value) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("event=session_load module=store status=fallback reason=corrupt error={err}");
                None
            }
        }
    }

    pub fn set_session_user(&self, user: &User) -> StoreResult<()> {
        let value = serialize_blob(SESSION_KEY, user)?;
        self.kv.apply(&[KvWrite::put(SESSION_KEY, value)])
    }

    /// Removes the session key only.
    pub fn clear_session(&self) -> StoreResult<()> {
        self.kv.apply(&[KvWrite::delete(SESSION_KEY)])
    }

    /// Raw blob under `key`, for diagnostics and tests.
    pub fn raw(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        self.kv.get(key)
    }
}

fn serialize_blob<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn deserialize_blob<T: Record>(key: &str, value: &str) -> StoreResult<Vec<T>> {
    serde_json::from_str(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn join_tables(tables: &[TableName]) -> String {
    tables
        .iter()
        .map(|table| table.key())
        .collect::<Vec<_>>()
        .join(",")
}

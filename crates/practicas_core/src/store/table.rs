//! Indexed in-memory projection of one persisted table.

use crate::store::TableName;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Binds an entity type to the table that stores it.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: TableName;

    fn id(&self) -> &str;
}

/// Rows in persisted order plus an id index.
///
/// When legacy data carries duplicate ids, lookups resolve to the first row,
/// matching a front-to-back scan.
#[derive(Debug, Clone)]
pub struct Table<T: Record> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
    revision: u64,
}

/// Revision carried by a table whose stored content could not be decoded.
/// No stored key ever reaches it, so a commit built on such a table fails.
pub const UNREADABLE_REVISION: u64 = u64::MAX;

impl<T: Record> Table<T> {
    pub fn empty() -> Self {
        Self::from_rows(Vec::new(), 0)
    }

    /// Empty stand-in for content that failed to decode.
    pub fn unreadable() -> Self {
        Self::from_rows(Vec::new(), UNREADABLE_REVISION)
    }

    pub fn from_rows(rows: Vec<T>, revision: u64) -> Self {
        let mut table = Self {
            rows,
            index: HashMap::new(),
            revision,
        };
        table.reindex();
        table
    }

    /// Store revision this table was loaded at; `0` when the key was absent,
    /// [`UNREADABLE_REVISION`] when its content did not decode.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&position| &self.rows[position])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let position = *self.index.get(id)?;
        self.rows.get_mut(position)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.rows.iter_mut()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.rows.iter().find(|row| predicate(row))
    }

    /// Clones every row matching `predicate`, keeping table order.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.rows
            .iter()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    /// Appends a row. Returns the row back when its id is already taken.
    pub fn insert(&mut self, row: T) -> Result<&T, T> {
        if self.index.contains_key(row.id()) {
            return Err(row);
        }
        let position = self.rows.len();
        self.index.insert(row.id().to_string(), position);
        self.rows.push(row);
        Ok(&self.rows[position])
    }

    /// Removes every row carrying `id`; returns the first one.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.index.get(id)?;
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in self.rows.drain(..) {
            if row.id() == id {
                if removed.is_none() {
                    removed = Some(row);
                }
            } else {
                kept.push(row);
            }
        }
        self.rows = kept;
        self.reindex();
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (position, row) in self.rows.iter().enumerate() {
            self.index.entry(row.id().to_string()).or_insert(position);
        }
    }
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T: Record> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, Table};
    use crate::store::TableName;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        label: String,
    }

    impl Record for Row {
        const TABLE: TableName = TableName::Companies;

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str, label: &str) -> Row {
        Row {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn duplicate_ids_resolve_to_first_row_and_remove_drops_all() {
        let mut table = Table::from_rows(
            vec![row("1", "first"), row("2", "other"), row("1", "shadow")],
            3,
        );
        assert_eq!(table.get("1").unwrap().label, "first");

        let removed = table.remove("1").unwrap();
        assert_eq!(removed.label, "first");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("2").unwrap().label, "other");
        assert_eq!(table.revision(), 3);
    }

    #[test]
    fn insert_rejects_taken_ids() {
        let mut table = Table::empty();
        table.insert(row("a", "one")).unwrap();
        let rejected = table.insert(row("a", "two")).unwrap_err();
        assert_eq!(rejected.label, "two");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut table = Table::from_rows(vec![row("a", "one")], 1);
        table.get_mut("a").unwrap().label = "changed".to_string();
        assert_eq!(table.rows()[0].label, "changed");
    }
}

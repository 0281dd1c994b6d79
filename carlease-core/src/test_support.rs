//! In-memory [`Store`] implementations used by unit and behaviour tests.

use std::{
    collections::BTreeMap,
    io,
    sync::{Mutex, MutexGuard},
};

use serde_json::Value;

use crate::{
    FindMany, Filter, MapName, Relation, StoreError, TableName, UniqueKey,
    store::{Document, KeyValueMap, Store, engine},
};

/// Converts a `json!` object literal into a [`Document`].
///
/// # Panics
///
/// Panics when `value` is not a JSON object.
pub fn document(value: Value) -> Document {
    match value {
        Value::Object(document) => document,
        other => panic!("expected a JSON object, found {other}"),
    }
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<TableName, Vec<Document>>,
    maps: BTreeMap<MapName, KeyValueMap>,
}

/// In-memory `Store` with the same semantics as the file and database
/// stores.
///
/// The store performs linear scans and is intended only for small datasets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a store holding `documents` in `table`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics when a value is not an object.
    pub fn with_table<I>(table: TableName, documents: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let store = Self::default();
        store.lock().tables.insert(
            table,
            documents.into_iter().map(document).collect(),
        );
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn snapshot(&self, table: TableName) -> Vec<Document> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn find_many(&self, table: TableName, query: &FindMany) -> Result<Vec<Document>, StoreError> {
        engine::validate_query(table, query)?;
        let mut selected = engine::select(self.snapshot(table), query);
        engine::attach_relations(self, &mut selected, &query.include)?;
        Ok(selected)
    }

    fn find_unique(
        &self,
        table: TableName,
        key: &UniqueKey,
        include: &[Relation],
    ) -> Result<Option<Document>, StoreError> {
        engine::validate_unique(table, key)?;
        engine::validate_relations(table, include)?;
        let mut found: Vec<Document> = engine::find_unique_in(self.snapshot(table), key)
            .into_iter()
            .collect();
        engine::attach_relations(self, &mut found, include)?;
        Ok(found.pop())
    }

    fn count(&self, table: TableName, filter: &Filter) -> Result<usize, StoreError> {
        engine::validate_filter(table, filter)?;
        let state = self.lock();
        Ok(state
            .tables
            .get(&table)
            .map_or(0, |documents| {
                documents.iter().filter(|doc| filter.matches(doc)).count()
            }))
    }

    fn insert(&self, table: TableName, document: Document) -> Result<Document, StoreError> {
        let mut state = self.lock();
        let documents = state.tables.entry(table).or_default();
        engine::check_insert(table, documents, &document)?;
        documents.push(document.clone());
        Ok(document)
    }

    fn update(
        &self,
        table: TableName,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut state = self.lock();
        let documents = state.tables.entry(table).or_default();
        let Some(index) = engine::position_of(documents, id) else {
            return Ok(None);
        };
        let Some(mut updated) = documents.get(index).cloned() else {
            return Ok(None);
        };
        engine::merge(table, &mut updated, changes)?;
        engine::ensure_unique_values(table, documents, &updated)?;
        if let Some(slot) = documents.get_mut(index) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    fn delete(&self, table: TableName, id: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let documents = state.tables.entry(table).or_default();
        let Some(index) = engine::position_of(documents, id) else {
            return Ok(false);
        };
        documents.remove(index);
        Ok(true)
    }

    fn replace_all(&self, table: TableName, documents: Vec<Document>) -> Result<(), StoreError> {
        let mut accepted = Vec::with_capacity(documents.len());
        for document in documents {
            engine::check_insert(table, &accepted, &document)?;
            accepted.push(document);
        }
        self.lock().tables.insert(table, accepted);
        Ok(())
    }

    fn load_map(&self, name: MapName) -> Result<KeyValueMap, StoreError> {
        Ok(self.lock().maps.get(&name).cloned().unwrap_or_default())
    }

    fn save_map(&self, name: MapName, entries: &KeyValueMap) -> Result<(), StoreError> {
        self.lock().maps.insert(name, entries.clone());
        Ok(())
    }
}

/// `Store` whose every operation fails, standing in for an unreachable
/// database.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn error() -> StoreError {
        StoreError::Read {
            path: "unavailable".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "store is unavailable"),
        }
    }
}

impl Store for UnavailableStore {
    fn find_many(&self, _: TableName, _: &FindMany) -> Result<Vec<Document>, StoreError> {
        Err(Self::error())
    }

    fn find_unique(
        &self,
        _: TableName,
        _: &UniqueKey,
        _: &[Relation],
    ) -> Result<Option<Document>, StoreError> {
        Err(Self::error())
    }

    fn count(&self, _: TableName, _: &Filter) -> Result<usize, StoreError> {
        Err(Self::error())
    }

    fn insert(&self, _: TableName, _: Document) -> Result<Document, StoreError> {
        Err(Self::error())
    }

    fn update(&self, _: TableName, _: &str, _: Document) -> Result<Option<Document>, StoreError> {
        Err(Self::error())
    }

    fn delete(&self, _: TableName, _: &str) -> Result<bool, StoreError> {
        Err(Self::error())
    }

    fn replace_all(&self, _: TableName, _: Vec<Document>) -> Result<(), StoreError> {
        Err(Self::error())
    }

    fn load_map(&self, _: MapName) -> Result<KeyValueMap, StoreError> {
        Err(Self::error())
    }

    fn save_map(&self, _: MapName, _: &KeyValueMap) -> Result<(), StoreError> {
        Err(Self::error())
    }
}

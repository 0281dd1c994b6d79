//! Storage strategies for catalog tables.
//!
//! The [`Store`] trait is the single seam between callers and persistence.
//! It speaks untyped JSON [`Document`]s so one trait object can serve every
//! table; [`crate::Table`] layers the typed records on top. Implementations
//! must produce identical results for identical data, which the shared
//! helpers in `engine` guarantee for the in-process backends and the SQL
//! translation in `sqlite` mirrors for the database backend.

use std::{collections::BTreeMap, fmt};

use serde_json::{Map, Value};

use crate::{FindMany, Filter, MapName, Relation, StoreError, TableName, UniqueKey};

pub(crate) mod engine;
mod json;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use json::JsonFileStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;

/// One persisted record: a JSON object with camelCase field names.
pub type Document = Map<String, Value>;

/// Flat string key-value document such as the site settings.
pub type KeyValueMap = BTreeMap<String, String>;

/// Query and mutation access to catalog tables.
///
/// Not-found conditions are signalled through `Option`/`bool`; errors are
/// reserved for corrupt storage, IO failures and caller misuse. Stores never
/// log.
///
/// # Examples
///
/// ```
/// use carlease_core::{FindMany, Filter, Store, TableName, test_support::MemoryStore};
/// use serde_json::json;
///
/// # fn main() -> Result<(), carlease_core::StoreError> {
/// let store = MemoryStore::default();
/// for (id, active) in [("a", true), ("b", false)] {
///     let doc = json!({"id": id, "question": "?", "isActive": active});
///     store.insert(TableName::Faqs, doc.as_object().cloned().unwrap_or_default())?;
/// }
/// let active = Filter::new().eq("isActive", true);
/// assert_eq!(store.count(TableName::Faqs, &active)?, 1);
/// let found = store.find_many(TableName::Faqs, &FindMany::new().with_filter(active))?;
/// assert_eq!(found[0]["id"], json!("a"));
/// # Ok(())
/// # }
/// ```
pub trait Store: fmt::Debug + Send + Sync {
    /// Records matching `query.filter`, ordered and with relations attached.
    fn find_many(&self, table: TableName, query: &FindMany) -> Result<Vec<Document>, StoreError>;

    /// First record whose unique field equals the key, with relations.
    fn find_unique(
        &self,
        table: TableName,
        key: &UniqueKey,
        include: &[Relation],
    ) -> Result<Option<Document>, StoreError>;

    /// Number of records matching `filter`. Relations are never resolved.
    fn count(&self, table: TableName, filter: &Filter) -> Result<usize, StoreError>;

    /// Appends a complete record and returns it as stored.
    fn insert(&self, table: TableName, document: Document) -> Result<Document, StoreError>;

    /// Shallow-merges `changes` into the record with `id`.
    ///
    /// Fields absent from `changes` keep their stored values; a field present
    /// with `null` is cleared. Returns `None` when no record has `id`.
    fn update(
        &self,
        table: TableName,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Removes the record with `id`, returning whether one existed.
    fn delete(&self, table: TableName, id: &str) -> Result<bool, StoreError>;

    /// Replaces the table's contents, keeping the given order.
    fn replace_all(&self, table: TableName, documents: Vec<Document>) -> Result<(), StoreError>;

    /// Loads a key-value document; a missing document is empty.
    fn load_map(&self, name: MapName) -> Result<KeyValueMap, StoreError>;

    /// Replaces a key-value document.
    fn save_map(&self, name: MapName, entries: &KeyValueMap) -> Result<(), StoreError>;
}

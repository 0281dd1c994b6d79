//! JSON-file store: one pretty-printed array per table under a data
//! directory.

use std::sync::{Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    FindMany, Filter, MapName, Relation, StoreError, TableName, UniqueKey,
    store::{Document, KeyValueMap, Store, engine},
};

const TABLE_COUNT: usize = TableName::ALL.len();
const MAP_COUNT: usize = MapName::ALL.len();

/// Store keeping each table in `<root>/<table>.json`.
///
/// Every call re-reads the table from disk, so edits made by other tools
/// are visible immediately. Every mutation rewrites the whole file through
/// an atomic rename. Writers to the same table are serialized by a per-table
/// lock; readers take no lock.
///
/// A missing or unreadable file reads as an empty table. Malformed JSON,
/// including bytes that are not UTF-8, is reported as [`StoreError::Corrupt`].
///
/// # Examples
///
/// ```
/// use carlease_core::{FindMany, JsonFileStore, Store, TableName};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = camino::Utf8PathBuf::try_from(dir.path().to_path_buf())?;
/// let store = JsonFileStore::open(root.join("data"));
/// assert!(store.find_many(TableName::Brands, &FindMany::new())?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    root: Utf8PathBuf,
    table_locks: [Mutex<()>; TABLE_COUNT],
    map_locks: [Mutex<()>; MAP_COUNT],
}

impl JsonFileStore {
    /// Creates a store rooted at `root`. The directory is created on the
    /// first write.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            table_locks: std::array::from_fn(|_| Mutex::new(())),
            map_locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Data directory holding the table files.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// File holding `table`.
    pub fn table_path(&self, table: TableName) -> Utf8PathBuf {
        self.root.join(table.file_name())
    }

    /// File holding the key-value document `name`.
    pub fn map_path(&self, name: MapName) -> Utf8PathBuf {
        self.root.join(name.file_name())
    }

    fn lock_table(&self, table: TableName) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.table_locks[table as usize]
            .lock()
            .map_err(|_| StoreError::LockPoisoned {
                table: table.as_str(),
            })
    }

    fn lock_map(&self, name: MapName) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.map_locks[name as usize]
            .lock()
            .map_err(|_| StoreError::LockPoisoned {
                table: name.as_str(),
            })
    }

    /// Loads a table for a query. IO failures read as an empty table.
    fn read_table(&self, table: TableName) -> Result<Vec<Document>, StoreError> {
        let path = self.table_path(table);
        match carlease_fs::read_optional_bytes(&path) {
            Ok(Some(bytes)) => engine::parse_table(table, path.as_str(), &bytes),
            Ok(None) | Err(_) => Ok(Vec::new()),
        }
    }

    /// Loads a table that is about to be rewritten. Only a missing file reads
    /// as empty; other IO failures would otherwise wipe the table.
    fn read_table_for_write(&self, table: TableName) -> Result<Vec<Document>, StoreError> {
        let path = self.table_path(table);
        match carlease_fs::read_optional_bytes(&path) {
            Ok(Some(bytes)) => engine::parse_table(table, path.as_str(), &bytes),
            Ok(None) => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn write_table(&self, table: TableName, documents: &[Document]) -> Result<(), StoreError> {
        let path = self.table_path(table);
        let text = serde_json::to_string_pretty(documents)
            .map_err(|source| StoreError::Encode { table, source })?;
        write_file(path, &text)
    }

    fn read_map(&self, name: MapName, for_write: bool) -> Result<KeyValueMap, StoreError> {
        let path = self.map_path(name);
        match carlease_fs::read_optional_bytes(&path) {
            Ok(Some(bytes)) => engine::parse_map(name, path.as_str(), &bytes),
            Ok(None) => Ok(KeyValueMap::new()),
            Err(source) if for_write => Err(StoreError::Read { path, source }),
            Err(_) => Ok(KeyValueMap::new()),
        }
    }
}

fn write_file(path: Utf8PathBuf, text: &str) -> Result<(), StoreError> {
    carlease_fs::write_atomic(&path, text.as_bytes())
        .map_err(|source| StoreError::Write { path, source })
}

impl Store for JsonFileStore {
    fn find_many(&self, table: TableName, query: &FindMany) -> Result<Vec<Document>, StoreError> {
        engine::validate_query(table, query)?;
        let mut selected = engine::select(self.read_table(table)?, query);
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
        let Some(found) = engine::find_unique_in(self.read_table(table)?, key) else {
            return Ok(None);
        };
        let mut found = [found];
        engine::attach_relations(self, &mut found, include)?;
        let [found] = found;
        Ok(Some(found))
    }

    fn count(&self, table: TableName, filter: &Filter) -> Result<usize, StoreError> {
        engine::validate_filter(table, filter)?;
        Ok(self
            .read_table(table)?
            .iter()
            .filter(|document| filter.matches(document))
            .count())
    }

    fn insert(&self, table: TableName, document: Document) -> Result<Document, StoreError> {
        let _guard = self.lock_table(table)?;
        let mut documents = self.read_table_for_write(table)?;
        engine::check_insert(table, &documents, &document)?;
        documents.push(document.clone());
        self.write_table(table, &documents)?;
        Ok(document)
    }

    fn update(
        &self,
        table: TableName,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        let _guard = self.lock_table(table)?;
        let mut documents = self.read_table_for_write(table)?;
        let Some(index) = engine::position_of(&documents, id) else {
            return Ok(None);
        };
        let Some(target) = documents.get(index) else {
            return Ok(None);
        };
        let mut updated = target.clone();
        engine::merge(table, &mut updated, changes)?;
        engine::ensure_unique_values(table, &documents, &updated)?;
        if let Some(slot) = documents.get_mut(index) {
            *slot = updated.clone();
        }
        self.write_table(table, &documents)?;
        Ok(Some(updated))
    }

    fn delete(&self, table: TableName, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock_table(table)?;
        let mut documents = self.read_table_for_write(table)?;
        let Some(index) = engine::position_of(&documents, id) else {
            return Ok(false);
        };
        documents.remove(index);
        self.write_table(table, &documents)?;
        Ok(true)
    }

    fn replace_all(&self, table: TableName, documents: Vec<Document>) -> Result<(), StoreError> {
        let mut accepted = Vec::with_capacity(documents.len());
        for document in documents {
            engine::check_insert(table, &accepted, &document)?;
            accepted.push(document);
        }
        let _guard = self.lock_table(table)?;
        self.write_table(table, &accepted)
    }

    fn load_map(&self, name: MapName) -> Result<KeyValueMap, StoreError> {
        self.read_map(name, false)
    }

    fn save_map(&self, name: MapName, entries: &KeyValueMap) -> Result<(), StoreError> {
        let _guard = self.lock_map(name)?;
        // Surface corruption instead of silently overwriting it.
        self.read_map(name, true)?;
        let path = self.map_path(name);
        let text = serde_json::to_string_pretty(entries)
            .map_err(|source| StoreError::EncodeMap { name, source })?;
        write_file(path, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderBy, test_support::document};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use std::{sync::Arc, thread};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: JsonFileStore,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("data")).expect("utf-8 temp dir");
        Fixture {
            _dir: dir,
            store: JsonFileStore::open(root),
        }
    }

    fn write_raw(store: &JsonFileStore, table: TableName, text: &str) {
        carlease_fs::write_atomic(&store.table_path(table), text.as_bytes()).expect("seed file");
    }

    fn read_raw(store: &JsonFileStore, table: TableName) -> Option<String> {
        carlease_fs::read_optional(&store.table_path(table)).expect("read file")
    }

    #[rstest]
    fn missing_directory_reads_as_empty(fixture: Fixture) {
        let found = fixture
            .store
            .find_many(TableName::Vehicles, &FindMany::new())
            .expect("query");
        assert!(found.is_empty());
        assert_eq!(
            fixture.store.load_map(MapName::Settings).expect("settings"),
            KeyValueMap::new()
        );
    }

    #[rstest]
    fn first_insert_creates_directory_and_pretty_file(fixture: Fixture) {
        fixture
            .store
            .insert(TableName::Faqs, document(json!({"id": "q1", "question": "How?"})))
            .expect("insert");
        let text = read_raw(&fixture.store, TableName::Faqs).expect("file exists");
        assert!(text.starts_with("[\n  {"), "pretty printed: {text}");
    }

    #[rstest]
    fn malformed_json_is_fatal(fixture: Fixture) {
        write_raw(&fixture.store, TableName::Brands, "[{\"id\": ");
        let err = fixture
            .store
            .find_many(TableName::Brands, &FindMany::new())
            .expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { table: "brands", .. }));
        let err = fixture
            .store
            .delete(TableName::Brands, "kia")
            .expect_err("corrupt on write path");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[rstest]
    fn non_utf8_file_is_corrupt_on_every_path(fixture: Fixture) {
        let bytes = b"[{\"id\":\"v1\",\"name\":\"\xff\xfe\"}]";
        carlease_fs::write_atomic(&fixture.store.table_path(TableName::Vehicles), bytes)
            .expect("seed file");

        let err = fixture
            .store
            .find_many(TableName::Vehicles, &FindMany::new())
            .expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { table: "vehicles", .. }));
        let err = fixture
            .store
            .count(TableName::Vehicles, &Filter::new())
            .expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { .. }));
        let err = fixture
            .store
            .delete(TableName::Vehicles, "v1")
            .expect_err("corrupt on write path");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[rstest]
    fn non_utf8_settings_are_corrupt(fixture: Fixture) {
        let path = fixture.store.map_path(MapName::Settings);
        carlease_fs::write_atomic(&path, b"{\"phone\": \"\xff\"}").expect("seed file");
        let err = fixture
            .store
            .load_map(MapName::Settings)
            .expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { table: "settings", .. }));
    }

    #[rstest]
    fn deleting_missing_id_leaves_file_untouched(fixture: Fixture) {
        let seeded = "[\n{\"id\":\"kia\",\"name\":\"Kia\"}\n]";
        write_raw(&fixture.store, TableName::Brands, seeded);
        let removed = fixture
            .store
            .delete(TableName::Brands, "nope")
            .expect("delete");
        assert!(!removed);
        assert_eq!(
            read_raw(&fixture.store, TableName::Brands).as_deref(),
            Some(seeded)
        );
    }

    #[rstest]
    fn external_edits_are_visible_without_reopening(fixture: Fixture) {
        write_raw(&fixture.store, TableName::Faqs, r#"[{"id": "a"}]"#);
        assert_eq!(
            fixture.store.count(TableName::Faqs, &Filter::new()).expect("count"),
            1
        );
        write_raw(&fixture.store, TableName::Faqs, r#"[{"id": "a"}, {"id": "b"}]"#);
        assert_eq!(
            fixture.store.count(TableName::Faqs, &Filter::new()).expect("count"),
            2
        );
    }

    #[rstest]
    fn concurrent_updates_to_different_fields_both_survive() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let store = Arc::new(JsonFileStore::open(root));
        store
            .insert(
                TableName::Brands,
                document(json!({"id": "kia", "name": "Kia", "sortOrder": 0})),
            )
            .expect("seed");

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for round in 0..10 {
                        let mut changes = Document::new();
                        changes.insert(format!("counter{worker}"), json!(round));
                        store
                            .update(TableName::Brands, "kia", changes)
                            .expect("update");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker finished");
        }

        let stored = store
            .find_unique(TableName::Brands, &UniqueKey::id("kia"), &[])
            .expect("query")
            .expect("brand exists");
        for worker in 0..8 {
            assert_eq!(stored.get(&format!("counter{worker}")), Some(&json!(9)));
        }
    }

    #[rstest]
    fn settings_round_trip_as_flat_object(fixture: Fixture) {
        let mut entries = KeyValueMap::new();
        entries.insert("siteName".into(), "Car Lease".into());
        fixture
            .store
            .save_map(MapName::Settings, &entries)
            .expect("save");
        let text = carlease_fs::read_optional(&fixture.store.map_path(MapName::Settings))
            .expect("read")
            .expect("file exists");
        let value: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value, json!({"siteName": "Car Lease"}));
        assert_eq!(
            fixture.store.load_map(MapName::Settings).expect("load"),
            entries
        );
    }

    #[rstest]
    fn ordering_on_unknown_field_fails_fast(fixture: Fixture) {
        let query = FindMany::new().ordered_by(OrderBy::asc("colour"));
        let err = fixture
            .store
            .find_many(TableName::Vehicles, &query)
            .expect_err("unknown field");
        assert!(matches!(err, StoreError::UnknownField { .. }));
    }
}

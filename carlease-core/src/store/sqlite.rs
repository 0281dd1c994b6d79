//! SQLite-backed store used in database mode.
//!
//! Each record table maps to a SQLite table holding the record as a JSON
//! `body` next to its `id`. Filters and ordering run in SQL through
//! `json_type`/`json_extract` with the same semantics as the in-process
//! engine: strict type matching, null-first ordering and the insertion
//! sequence as the tie-breaker.

use std::{
    fmt,
    sync::{Mutex, MutexGuard},
};

use camino::Utf8Path;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value as SqlValue};
use serde_json::Value;

use crate::{
    FieldValue, Filter, FindMany, MapName, Relation, StoreError, TableName, UniqueKey,
    store::{Document, KeyValueMap, Store, engine},
};

const KV_TABLE: &str = "kv";

/// Store persisting every table in one SQLite database.
pub struct SqliteStore {
    connection: Mutex<Connection>,
    location: String,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (creating when missing) the database at `path` and ensures the
    /// schema exists.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        carlease_fs::ensure_parent_dir(path).map_err(|source| StoreError::Write {
            path: path.to_owned(),
            source,
        })?;
        let connection = Connection::open(path).map_err(|source| StoreError::OpenDatabase {
            path: path.to_owned(),
            source,
        })?;
        Self::with_connection(connection, path.as_str())
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| StoreError::OpenDatabase {
                path: ":memory:".into(),
                source,
            })?;
        Self::with_connection(connection, ":memory:")
    }

    fn with_connection(connection: Connection, location: &str) -> Result<Self, StoreError> {
        for table in TableName::ALL {
            connection.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    body TEXT NOT NULL
                )"
            ))?;
        }
        connection.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {KV_TABLE} (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )"
        ))?;
        Ok(Self {
            connection: Mutex::new(connection),
            location: location.to_owned(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::LockPoisoned { table: "database" })
    }

    fn select(
        &self,
        connection: &Connection,
        table: TableName,
        filter: &Filter,
        order: Option<&crate::OrderBy>,
        limit_one: bool,
    ) -> Result<Vec<Document>, StoreError> {
        let (mut sql, mut params) = where_clause(filter);
        sql.insert_str(0, &format!("SELECT id, body FROM {table}"));
        match order {
            Some(order_by) => {
                sql.push_str(&format!(
                    " ORDER BY json_extract(body, ?) {}, seq ASC",
                    order_by.direction.as_sql()
                ));
                params.push(json_path(&order_by.field));
            }
            None => sql.push_str(" ORDER BY seq ASC"),
        }
        if limit_one {
            sql.push_str(" LIMIT 1");
        }
        let mut statement = connection.prepare(&sql)?;
        let rows = statement
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, body)| self.parse_body(table, &id, &body))
            .collect()
    }

    fn parse_body(&self, table: TableName, id: &str, body: &str) -> Result<Document, StoreError> {
        let location = format!("{}#{table}/{id}", self.location);
        match serde_json::from_str(body) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(StoreError::UnexpectedShape {
                table: table.as_str(),
                location,
                expected: "a JSON object",
            }),
            Err(source) => Err(StoreError::Corrupt {
                table: table.as_str(),
                location,
                source,
            }),
        }
    }

    /// Rejects `document` when it clashes on a unique field other than `id`.
    fn check_unique_values(
        &self,
        connection: &Connection,
        table: TableName,
        document: &Document,
    ) -> Result<(), StoreError> {
        if table.unique_fields().len() <= 1 {
            return Ok(());
        }
        let existing = self.select(connection, table, &Filter::new(), None, false)?;
        engine::ensure_unique_values(table, &existing, document)
    }
}

fn json_path(field: &str) -> SqlValue {
    SqlValue::Text(format!("$.\"{field}\""))
}

/// Translates a filter into a `WHERE` clause and its positional parameters.
fn where_clause(filter: &Filter) -> (String, Vec<SqlValue>) {
    let mut predicates = Vec::with_capacity(filter.conditions().len());
    let mut params = Vec::new();
    for condition in filter.conditions() {
        let path = json_path(&condition.field);
        match &condition.value {
            FieldValue::Null => {
                predicates.push(
                    "(json_type(body, ?) IS NULL OR json_type(body, ?) = 'null')".to_owned(),
                );
                params.extend([path.clone(), path]);
            }
            FieldValue::Bool(flag) => {
                predicates.push(format!("json_type(body, ?) = '{flag}'"));
                params.push(path);
            }
            FieldValue::Int(number) => {
                predicates.push(
                    "(json_type(body, ?) = 'integer' AND json_extract(body, ?) = ?)".to_owned(),
                );
                params.extend([path.clone(), path, SqlValue::Integer(*number)]);
            }
            FieldValue::Text(text) => {
                predicates
                    .push("(json_type(body, ?) = 'text' AND json_extract(body, ?) = ?)".to_owned());
                params.extend([path.clone(), path, SqlValue::Text(text.clone())]);
            }
        }
    }
    if predicates.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", predicates.join(" AND ")), params)
    }
}

fn encode(table: TableName, document: &Document) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|source| StoreError::Encode { table, source })
}

impl Store for SqliteStore {
    fn find_many(&self, table: TableName, query: &FindMany) -> Result<Vec<Document>, StoreError> {
        engine::validate_query(table, query)?;
        let mut documents = {
            let connection = self.lock()?;
            self.select(
                &connection,
                table,
                &query.filter,
                query.order_by.as_ref(),
                false,
            )?
        };
        engine::attach_relations(self, &mut documents, &query.include)?;
        Ok(documents)
    }

    fn find_unique(
        &self,
        table: TableName,
        key: &UniqueKey,
        include: &[Relation],
    ) -> Result<Option<Document>, StoreError> {
        engine::validate_unique(table, key)?;
        engine::validate_relations(table, include)?;
        let filter = Filter::new().eq(key.field.clone(), key.value.clone());
        let mut documents = {
            let connection = self.lock()?;
            self.select(&connection, table, &filter, None, true)?
        };
        engine::attach_relations(self, &mut documents, include)?;
        Ok(documents.pop())
    }

    fn count(&self, table: TableName, filter: &Filter) -> Result<usize, StoreError> {
        engine::validate_filter(table, filter)?;
        let (clause, params) = where_clause(filter);
        let connection = self.lock()?;
        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(*) FROM {table}{clause}"),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn insert(&self, table: TableName, document: Document) -> Result<Document, StoreError> {
        let id = engine::document_id(table, &document)?.to_owned();
        let body = encode(table, &document)?;
        let connection = self.lock()?;
        let taken = connection
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(StoreError::DuplicateId { table, id });
        }
        self.check_unique_values(&connection, table, &document)?;
        connection.execute(
            &format!("INSERT INTO {table} (id, body) VALUES (?1, ?2)"),
            params![id, body],
        )?;
        Ok(document)
    }

    fn update(
        &self,
        table: TableName,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        let stored: Option<String> = transaction
            .query_row(
                &format!("SELECT body FROM {table} WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(body) = stored else {
            return Ok(None);
        };
        let mut updated = self.parse_body(table, id, &body)?;
        engine::merge(table, &mut updated, changes)?;
        self.check_unique_values(&transaction, table, &updated)?;
        transaction.execute(
            &format!("UPDATE {table} SET body = ?1 WHERE id = ?2"),
            params![encode(table, &updated)?, id],
        )?;
        transaction.commit()?;
        Ok(Some(updated))
    }

    fn delete(&self, table: TableName, id: &str) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let removed =
            connection.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        Ok(removed > 0)
    }

    fn replace_all(&self, table: TableName, documents: Vec<Document>) -> Result<(), StoreError> {
        let mut rows = Vec::with_capacity(documents.len());
        let mut accepted = Vec::with_capacity(documents.len());
        for document in documents {
            engine::check_insert(table, &accepted, &document)?;
            let id = engine::document_id(table, &document)?.to_owned();
            rows.push((id, encode(table, &document)?));
            accepted.push(document);
        }
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        transaction.execute(&format!("DELETE FROM {table}"), [])?;
        {
            let mut statement =
                transaction.prepare(&format!("INSERT INTO {table} (id, body) VALUES (?1, ?2)"))?;
            for (id, body) in &rows {
                statement.execute(params![id, body])?;
            }
        }
        transaction.commit()?;
        Ok(())
    }

    fn load_map(&self, name: MapName) -> Result<KeyValueMap, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(&format!(
            "SELECT key, value FROM {KV_TABLE} WHERE namespace = ?1 ORDER BY key"
        ))?;
        let entries = statement
            .query_map(params![name.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<KeyValueMap, _>>()?;
        Ok(entries)
    }

    fn save_map(&self, name: MapName, entries: &KeyValueMap) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        transaction.execute(
            &format!("DELETE FROM {KV_TABLE} WHERE namespace = ?1"),
            params![name.as_str()],
        )?;
        {
            let mut statement = transaction.prepare(&format!(
                "INSERT INTO {KV_TABLE} (namespace, key, value) VALUES (?1, ?2, ?3)"
            ))?;
            for (key, value) in entries {
                statement.execute(params![name.as_str(), key, value])?;
            }
        }
        transaction.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderBy, test_support::document};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    #[fixture]
    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open in-memory database")
    }

    fn ids(documents: &[Document]) -> Vec<String> {
        documents
            .iter()
            .filter_map(|document| document.get("id").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    #[rstest]
    fn filters_are_type_strict(store: SqliteStore) {
        for (id, order) in [("int", json!(1)), ("text", json!("1")), ("real", json!(1.0))] {
            store
                .insert(TableName::Faqs, document(json!({"id": id, "sortOrder": order})))
                .expect("insert");
        }
        let query = FindMany::new().with_filter(Filter::new().eq("sortOrder", 1_i64));
        assert_eq!(ids(&store.find_many(TableName::Faqs, &query).expect("query")), ["int"]);
        let query = FindMany::new().with_filter(Filter::new().eq("sortOrder", "1"));
        assert_eq!(ids(&store.find_many(TableName::Faqs, &query).expect("query")), ["text"]);
    }

    #[rstest]
    fn null_filter_matches_missing_and_null_fields(store: SqliteStore) {
        for value in [json!({"id": "a", "logo": null}), json!({"id": "b"}), json!({"id": "c", "logo": "c.png"})] {
            store.insert(TableName::Brands, document(value)).expect("insert");
        }
        let filter = Filter::new().eq("logo", FieldValue::Null);
        assert_eq!(store.count(TableName::Brands, &filter).expect("count"), 2);
    }

    #[rstest]
    fn descending_order_keeps_insertion_order_for_ties(store: SqliteStore) {
        for (id, order) in [("a", 1), ("b", 2), ("c", 1), ("d", 2)] {
            store
                .insert(TableName::Faqs, document(json!({"id": id, "sortOrder": order})))
                .expect("insert");
        }
        let query = FindMany::new().ordered_by(OrderBy::desc("sortOrder"));
        assert_eq!(
            ids(&store.find_many(TableName::Faqs, &query).expect("query")),
            ["b", "d", "a", "c"]
        );
    }

    #[rstest]
    fn update_merges_inside_the_stored_body(store: SqliteStore) {
        store
            .insert(
                TableName::Brands,
                document(json!({"id": "kia", "name": "Kia", "logo": "kia.png"})),
            )
            .expect("insert");
        let updated = store
            .update(TableName::Brands, "kia", document(json!({"name": "KIA"})))
            .expect("update")
            .expect("record exists");
        assert_eq!(
            Value::Object(updated),
            json!({"id": "kia", "name": "KIA", "logo": "kia.png"})
        );
        assert!(
            store
                .update(TableName::Brands, "nope", Document::new())
                .expect("update")
                .is_none()
        );
    }

    #[rstest]
    fn duplicate_admin_email_is_rejected(store: SqliteStore) {
        store
            .insert(
                TableName::Admins,
                document(json!({"id": "1", "email": "ops@example.com"})),
            )
            .expect("insert");
        let err = store
            .insert(
                TableName::Admins,
                document(json!({"id": "2", "email": "ops@example.com"})),
            )
            .expect_err("duplicate email");
        assert!(matches!(err, StoreError::DuplicateValue { .. }));
    }

    #[rstest]
    fn corrupt_body_is_reported_with_its_row(store: SqliteStore) {
        {
            let connection = store.lock().expect("lock");
            connection
                .execute(
                    "INSERT INTO faqs (id, body) VALUES ('broken', '{not json')",
                    [],
                )
                .expect("insert raw row");
        }
        let err = store
            .find_many(TableName::Faqs, &FindMany::new())
            .expect_err("corrupt row");
        match err {
            StoreError::Corrupt { location, .. } => assert!(location.ends_with("faqs/broken")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn data_survives_reopening_the_file() {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("db/carlease.db"))
            .expect("utf-8 temp dir");
        {
            let store = SqliteStore::open(&path).expect("open");
            store
                .insert(TableName::Faqs, document(json!({"id": "q1"})))
                .expect("insert");
            let mut settings = KeyValueMap::new();
            settings.insert("phone".into(), "1588-0000".into());
            store.save_map(MapName::Settings, &settings).expect("save");
        }
        let store = SqliteStore::open(&path).expect("reopen");
        assert_eq!(store.count(TableName::Faqs, &Filter::new()).expect("count"), 1);
        assert_eq!(
            store
                .load_map(MapName::Settings)
                .expect("load")
                .get("phone")
                .map(String::as_str),
            Some("1588-0000")
        );
    }
}

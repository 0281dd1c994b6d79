//! Serving reads from local files when the primary store fails.

use std::sync::Arc;

use carlease_core::{
    Document, Filter, FindMany, KeyValueMap, MapName, Relation, Store, StoreError, TableName,
    UniqueKey,
};
use log::warn;

/// A store whose reads fall back to a second store on failure.
///
/// Writes only ever go to the primary so the fallback copy is never
/// silently diverged from. Errors caused by the query itself (unknown
/// fields, non-unique keys, undeclared relations) are returned as-is.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    primary: Arc<dyn Store>,
    fallback: Arc<dyn Store>,
}

impl FallbackStore {
    /// Wraps `primary`, reading from `fallback` when it fails.
    #[must_use]
    pub const fn new(primary: Arc<dyn Store>, fallback: Arc<dyn Store>) -> Self {
        Self { primary, fallback }
    }

    /// The store receiving writes.
    #[must_use]
    pub const fn primary(&self) -> &Arc<dyn Store> {
        &self.primary
    }

    fn read<T>(
        &self,
        what: &dyn std::fmt::Display,
        read: impl Fn(&dyn Store) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match read(self.primary.as_ref()) {
            Err(err) if !is_query_error(&err) => {
                warn!("Reading {what} from the primary store failed, using local data: {err}");
                read(self.fallback.as_ref())
            }
            result => result,
        }
    }
}

const fn is_query_error(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::UnknownField { .. }
            | StoreError::NotUnique { .. }
            | StoreError::UnknownRelation { .. }
    )
}

impl Store for FallbackStore {
    fn find_many(&self, table: TableName, query: &FindMany) -> Result<Vec<Document>, StoreError> {
        self.read(&table, |store| store.find_many(table, query))
    }

    fn find_unique(
        &self,
        table: TableName,
        key: &UniqueKey,
        include: &[Relation],
    ) -> Result<Option<Document>, StoreError> {
        self.read(&table, |store| store.find_unique(table, key, include))
    }

    fn count(&self, table: TableName, filter: &Filter) -> Result<usize, StoreError> {
        self.read(&table, |store| store.count(table, filter))
    }

    fn insert(&self, table: TableName, document: Document) -> Result<Document, StoreError> {
        self.primary.insert(table, document)
    }

    fn update(
        &self,
        table: TableName,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        self.primary.update(table, id, changes)
    }

    fn delete(&self, table: TableName, id: &str) -> Result<bool, StoreError> {
        self.primary.delete(table, id)
    }

    fn replace_all(&self, table: TableName, documents: Vec<Document>) -> Result<(), StoreError> {
        self.primary.replace_all(table, documents)
    }

    fn load_map(&self, name: MapName) -> Result<KeyValueMap, StoreError> {
        self.read(&name, |store| store.load_map(name))
    }

    fn save_map(&self, name: MapName, entries: &KeyValueMap) -> Result<(), StoreError> {
        self.primary.save_map(name, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carlease_core::test_support::{MemoryStore, UnavailableStore, document};
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn local() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_table(
            TableName::Faqs,
            [json!({"id": "f1", "question": "Who pays tax?", "isActive": true})],
        ))
    }

    #[rstest]
    fn reads_fall_back_when_primary_fails(local: Arc<MemoryStore>) {
        let store = FallbackStore::new(Arc::new(UnavailableStore), local);
        let faqs = store
            .find_many(TableName::Faqs, &FindMany::new())
            .expect("fallback read");
        assert_eq!(faqs.len(), 1);
        assert_eq!(store.count(TableName::Faqs, &Filter::new()).expect("count"), 1);
        assert!(
            store
                .find_unique(TableName::Faqs, &UniqueKey::id("f1"), &[])
                .expect("lookup")
                .is_some()
        );
    }

    #[rstest]
    fn primary_answers_when_healthy(local: Arc<MemoryStore>) {
        let store = FallbackStore::new(Arc::new(MemoryStore::default()), local);
        let faqs = store
            .find_many(TableName::Faqs, &FindMany::new())
            .expect("primary read");
        assert!(faqs.is_empty());
    }

    #[rstest]
    fn writes_never_reach_the_fallback(local: Arc<MemoryStore>) {
        let fallback: Arc<dyn Store> = local.clone();
        let store = FallbackStore::new(Arc::new(UnavailableStore), fallback);
        let err = store
            .insert(TableName::Faqs, document(json!({"id": "f2"})))
            .expect_err("primary is down");
        assert!(matches!(err, StoreError::Read { .. }));
        assert_eq!(local.count(TableName::Faqs, &Filter::new()).expect("count"), 1);
    }

    #[rstest]
    fn query_errors_are_not_retried(local: Arc<MemoryStore>) {
        let store = FallbackStore::new(Arc::new(MemoryStore::default()), local);
        let err = store
            .count(TableName::Faqs, &Filter::new().eq("colour", "red"))
            .expect_err("unknown field");
        assert!(matches!(err, StoreError::UnknownField { .. }));
    }
}

//! Every backend must answer the same queries with the same records.
#![cfg(feature = "store-sqlite")]

use std::sync::Arc;

use camino::Utf8PathBuf;
use carlease_core::{
    Document, FieldValue, Filter, FindMany, JsonFileStore, MapName, OrderBy, Relation,
    SqliteStore, Store, StoreError, TableName, UniqueKey,
    test_support::{MemoryStore, document},
};
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
enum Backend {
    Json,
    Sqlite,
    Memory,
}

struct Harness {
    _dir: TempDir,
    store: Arc<dyn Store>,
}

impl Harness {
    fn open(backend: Backend) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let store: Arc<dyn Store> = match backend {
            Backend::Json => Arc::new(JsonFileStore::open(root.join("data"))),
            Backend::Sqlite => {
                Arc::new(SqliteStore::open(&root.join("carlease.db")).expect("open database"))
            }
            Backend::Memory => Arc::new(MemoryStore::default()),
        };
        let harness = Self { _dir: dir, store };
        harness.seed();
        harness
    }

    fn seed(&self) {
        let brands = [
            json!({"id": "kia", "name": "Kia", "isActive": true, "sortOrder": 2}),
            json!({"id": "hyundai", "name": "Hyundai", "logo": null, "isActive": true, "sortOrder": 1}),
        ];
        let vehicles = [
            json!({"id": "kia-sd-k5", "brandId": "kia", "name": "K5", "category": "sedan", "basePrice": 28_000_000, "isActive": true, "sortOrder": 3}),
            json!({"id": "kia-suv-ev9", "brandId": "kia", "name": "EV9", "category": "suv", "basePrice": 73_000_000, "isActive": true, "sortOrder": 1}),
            json!({"id": "hyundai-sd-avante", "brandId": "hyundai", "name": "Avante", "category": "sedan", "basePrice": 20_000_000, "isActive": false, "sortOrder": 1}),
            json!({"id": "ghost-suv-x", "brandId": "ghost", "name": "X", "category": "suv", "isActive": true, "sortOrder": 2}),
        ];
        let trims = [
            json!({"id": "t-gt", "vehicleId": "kia-suv-ev9", "name": "GT-Line", "price": 900, "sortOrder": 2}),
            json!({"id": "t-air", "vehicleId": "kia-suv-ev9", "name": "Air", "price": 0, "sortOrder": 1}),
            json!({"id": "t-k5", "vehicleId": "kia-sd-k5", "name": "Prestige", "price": 0, "sortOrder": 1}),
        ];
        for (table, rows) in [
            (TableName::Brands, brands.to_vec()),
            (TableName::Vehicles, vehicles.to_vec()),
            (TableName::Trims, trims.to_vec()),
        ] {
            for row in rows {
                self.store.insert(table, document(row)).expect("seed row");
            }
        }
    }

    fn ids(&self, table: TableName, query: &FindMany) -> Vec<String> {
        self.store
            .find_many(table, query)
            .expect("query")
            .iter()
            .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_owned))
            .collect()
    }
}

fn related_ids(document: &Document, relation: &str) -> Vec<String> {
    document
        .get(relation)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[rstest]
fn filters_combine_with_and(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let query = FindMany::new().with_filter(
        Filter::new()
            .eq("category", "sedan")
            .eq("isActive", true),
    );
    assert_eq!(harness.ids(TableName::Vehicles, &query), ["kia-sd-k5"]);
}

#[rstest]
fn ordering_puts_missing_values_first(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let query = FindMany::new().ordered_by(OrderBy::asc("basePrice"));
    assert_eq!(
        harness.ids(TableName::Vehicles, &query),
        ["ghost-suv-x", "hyundai-sd-avante", "kia-sd-k5", "kia-suv-ev9"]
    );
}

#[rstest]
fn descending_ties_keep_insertion_order(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let query = FindMany::new().ordered_by(OrderBy::desc("sortOrder"));
    assert_eq!(
        harness.ids(TableName::Vehicles, &query),
        ["kia-sd-k5", "ghost-suv-x", "kia-suv-ev9", "hyundai-sd-avante"]
    );
}

#[rstest]
fn null_matches_explicit_and_missing_values(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let filter = Filter::new().eq("logo", FieldValue::Null);
    assert_eq!(harness.store.count(TableName::Brands, &filter).expect("count"), 2);
}

#[rstest]
fn includes_attach_brand_and_ordered_trims(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let query = FindMany::new()
        .with_filter(Filter::new().eq("isActive", true))
        .ordered_by(OrderBy::asc("sortOrder"))
        .including(Relation::Brand)
        .including(Relation::Trims);
    let found = harness
        .store
        .find_many(TableName::Vehicles, &query)
        .expect("query");
    let [ev9, ghost, k5] = found.as_slice() else {
        panic!("expected three active vehicles, found {}", found.len());
    };
    assert_eq!(ev9["brand"]["name"], json!("Kia"));
    assert_eq!(related_ids(ev9, "trims"), ["t-air", "t-gt"]);
    assert_eq!(ghost["brand"], Value::Null);
    assert_eq!(related_ids(ghost, "trims"), Vec::<String>::new());
    assert_eq!(related_ids(k5, "trims"), ["t-k5"]);
}

#[rstest]
fn brand_includes_its_vehicles(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let kia = harness
        .store
        .find_unique(TableName::Brands, &UniqueKey::id("kia"), &[Relation::Vehicles])
        .expect("query")
        .expect("kia exists");
    assert_eq!(related_ids(&kia, "vehicles"), ["kia-suv-ev9", "kia-sd-k5"]);
}

#[rstest]
fn count_ignores_relations_and_matches_find_many(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let filter = Filter::new().eq("brandId", "kia");
    let listed = harness.ids(TableName::Vehicles, &FindMany::new().with_filter(filter.clone()));
    let counted = harness.store.count(TableName::Vehicles, &filter).expect("count");
    assert_eq!(counted, listed.len());
}

#[rstest]
fn repeated_reads_are_identical(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let first = harness
        .store
        .find_many(TableName::Vehicles, &FindMany::new())
        .expect("first read");
    let second = harness
        .store
        .find_many(TableName::Vehicles, &FindMany::new())
        .expect("second read");
    assert_eq!(first, second);
}

#[rstest]
fn update_keeps_position_and_other_fields(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    let updated = harness
        .store
        .update(
            TableName::Vehicles,
            "kia-sd-k5",
            document(json!({"name": "The New K5"})),
        )
        .expect("update")
        .expect("exists");
    assert_eq!(updated["basePrice"], json!(28_000_000));
    assert_eq!(updated["sortOrder"], json!(3));
    assert_eq!(
        harness.ids(TableName::Vehicles, &FindMany::new()),
        ["kia-sd-k5", "kia-suv-ev9", "hyundai-sd-avante", "ghost-suv-x"]
    );
}

#[rstest]
fn misuse_fails_fast(#[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend) {
    let harness = Harness::open(backend);
    let unknown_field = harness
        .store
        .count(TableName::Vehicles, &Filter::new().eq("colour", "red"))
        .expect_err("unknown field");
    assert!(matches!(unknown_field, StoreError::UnknownField { .. }));
    let duplicate = harness
        .store
        .insert(TableName::Brands, document(json!({"id": "kia"})))
        .expect_err("duplicate id");
    assert!(matches!(duplicate, StoreError::DuplicateId { .. }));
    let missing_id = harness
        .store
        .insert(TableName::Brands, document(json!({"name": "Nameless"})))
        .expect_err("missing id");
    assert!(matches!(missing_id, StoreError::MissingId { .. }));
}

#[rstest]
fn replace_all_and_maps_round_trip(
    #[values(Backend::Json, Backend::Sqlite, Backend::Memory)] backend: Backend,
) {
    let harness = Harness::open(backend);
    harness
        .store
        .replace_all(
            TableName::Faqs,
            vec![document(json!({"id": "b"})), document(json!({"id": "a"}))],
        )
        .expect("replace");
    assert_eq!(harness.ids(TableName::Faqs, &FindMany::new()), ["b", "a"]);

    let entries = [("address".to_owned(), "Seoul".to_owned())].into_iter().collect();
    harness
        .store
        .save_map(MapName::CompanyInfo, &entries)
        .expect("save");
    assert_eq!(
        harness.store.load_map(MapName::CompanyInfo).expect("load"),
        entries
    );
    assert!(
        harness
            .store
            .load_map(MapName::Settings)
            .expect("load")
            .is_empty()
    );
}

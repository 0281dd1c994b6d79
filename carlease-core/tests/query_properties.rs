//! Property-based tests for the query engine.
//!
//! Tables are generated as short lists of FAQ rows with a random active flag
//! and a small (often repeated, sometimes missing) sort order, so that ties
//! and null values show up in most cases.
//!
//! # Invariants tested
//!
//! - **Filter exactness:** every returned row matches the filter and no
//!   matching row is dropped; the survivors keep their stored order.
//! - **Stable ordering:** sorting in either direction is stable, so equal
//!   keys keep their stored order.
//! - **Count agreement:** `count` equals the length of the unordered result.
//! - **Backend parity:** SQLite returns the same ids in the same order as the
//!   in-memory engine for every filter and ordering.
#![cfg(feature = "store-sqlite")]

use carlease_core::{
    Direction, Filter, FindMany, OrderBy, SqliteStore, Store, TableName,
    test_support::{MemoryStore, document},
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone)]
struct Row {
    active: bool,
    sort_order: Option<i64>,
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (any::<bool>(), proptest::option::of(0_i64..4)).prop_map(|(active, sort_order)| Row {
        active,
        sort_order,
    })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::vec(row_strategy(), 0..12)
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Asc), Just(Direction::Desc)]
}

fn to_documents(rows: &[Row]) -> Vec<Map<String, Value>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let mut doc = document(json!({
                "id": format!("faq-{index:02}"),
                "question": format!("Question {index}"),
                "isActive": row.active,
            }));
            if let Some(sort_order) = row.sort_order {
                doc.insert("sortOrder".to_owned(), json!(sort_order));
            }
            doc
        })
        .collect()
}

fn ids(documents: &[Map<String, Value>]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

fn expected_active(rows: &[Row], active: bool) -> Vec<String> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.active == active)
        .map(|(index, _)| format!("faq-{index:02}"))
        .collect()
}

/// Reference ordering: a stable sort on the optional key, missing first.
fn expected_order(rows: &[Row], direction: Direction) -> Vec<String> {
    let mut indexed: Vec<(usize, Option<i64>)> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (index, row.sort_order))
        .collect();
    match direction {
        Direction::Asc => indexed.sort_by(|a, b| a.1.cmp(&b.1)),
        Direction::Desc => indexed.sort_by(|a, b| b.1.cmp(&a.1)),
    }
    indexed
        .into_iter()
        .map(|(index, _)| format!("faq-{index:02}"))
        .collect()
}

fn memory_store(rows: &[Row]) -> MemoryStore {
    MemoryStore::with_table(
        TableName::Faqs,
        to_documents(rows).into_iter().map(Value::Object),
    )
}

fn sqlite_store(rows: &[Row]) -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("open in-memory database");
    for doc in to_documents(rows) {
        store.insert(TableName::Faqs, doc).expect("insert row");
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: filtering returns exactly the matching rows in stored order.
    #[test]
    fn filter_is_exact_and_order_preserving(rows in rows_strategy(), active in any::<bool>()) {
        let store = memory_store(&rows);
        let query = FindMany::new().with_filter(Filter::new().eq("isActive", active));
        let found = store.find_many(TableName::Faqs, &query).expect("query");
        prop_assert_eq!(ids(&found), expected_active(&rows, active));
    }

    /// Property: ordering is a stable sort in both directions.
    #[test]
    fn ordering_is_stable(rows in rows_strategy(), direction in direction_strategy()) {
        let store = memory_store(&rows);
        let query = FindMany::new().ordered_by(OrderBy {
            field: "sortOrder".into(),
            direction,
        });
        let found = store.find_many(TableName::Faqs, &query).expect("query");
        prop_assert_eq!(ids(&found), expected_order(&rows, direction));
    }

    /// Property: `count` agrees with the number of rows `find_many` returns.
    #[test]
    fn count_matches_find_many(rows in rows_strategy(), active in any::<bool>()) {
        let store = memory_store(&rows);
        let filter = Filter::new().eq("isActive", active);
        let counted = store.count(TableName::Faqs, &filter).expect("count");
        let listed = store
            .find_many(TableName::Faqs, &FindMany::new().with_filter(filter))
            .expect("query");
        prop_assert_eq!(counted, listed.len());
    }

    /// Property: SQLite and the in-memory engine agree on filtered, ordered
    /// results.
    #[test]
    fn sqlite_matches_memory(
        rows in rows_strategy(),
        active in proptest::option::of(any::<bool>()),
        direction in proptest::option::of(direction_strategy()),
    ) {
        let memory = memory_store(&rows);
        let sqlite = sqlite_store(&rows);
        let mut query = FindMany::new();
        if let Some(active) = active {
            query = query.with_filter(Filter::new().eq("isActive", active));
        }
        if let Some(direction) = direction {
            query = query.ordered_by(OrderBy {
                field: "sortOrder".into(),
                direction,
            });
        }
        let from_memory = memory.find_many(TableName::Faqs, &query).expect("memory query");
        let from_sqlite = sqlite.find_many(TableName::Faqs, &query).expect("sqlite query");
        prop_assert_eq!(ids(&from_sqlite), ids(&from_memory));
        prop_assert_eq!(from_sqlite, from_memory);
    }
}

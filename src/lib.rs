//! Facade crate for the car lease catalog.
//!
//! This crate re-exports the typed records and store backends from
//! `carlease-core` together with the catalog rules, store selection and
//! synchronisation from `carlease-data`. The SQLite backend sits behind the
//! `store-sqlite` feature, enabled by default.

#![forbid(unsafe_code)]

pub use carlease_core::{
    Admin, Brand, Color, Condition, Direction, Faq, FieldValue, Filter, FindMany, JsonFileStore,
    KeyValues, MapName, OrderBy, Record, Relation, Store, StoreError, Table, TableName, Tables,
    Trim, Vehicle, VehicleCategory, VehicleOption,
};

#[cfg(feature = "store-sqlite")]
pub use carlease_core::SqliteStore;

pub use carlease_data::{
    Catalog, CatalogError, DataSource, FallbackStore, Step, StoreConfig, SyncReport, open_store,
    sync_tables,
};

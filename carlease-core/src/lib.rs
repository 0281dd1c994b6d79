//! Core data layer for the car lease catalog.
//!
//! The catalog is a handful of small tables (brands, vehicles and the trims,
//! colours and extras owned by each vehicle, FAQs and admin accounts) plus
//! two flat key-value documents. This crate defines the typed records, a
//! small query model (equality filters, one ordering field, relation
//! includes) and the [`Store`] strategy with two interchangeable backends:
//!
//! - [`JsonFileStore`] keeps one JSON file per table and re-reads it on every
//!   call;
//! - `SqliteStore` (feature `store-sqlite`) keeps the same documents in
//!   SQLite and runs filters and ordering in SQL.
//!
//! Both return identical results for identical data. [`Table`] wraps either
//! one with typed create/update/delete and query operations.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use carlease_core::{
//!     FaqDraft, Filter, FindMany, OrderBy, Tables, test_support::MemoryStore,
//! };
//!
//! # fn main() -> Result<(), carlease_core::StoreError> {
//! let tables = Tables::new(Arc::new(MemoryStore::default()));
//! for (question, active) in [("Who pays insurance?", true), ("Draft", false)] {
//!     tables.faqs.create(FaqDraft {
//!         question: Some(question.into()),
//!         is_active: Some(active),
//!         ..FaqDraft::default()
//!     })?;
//! }
//! let active = FindMany::new()
//!     .with_filter(Filter::new().eq("isActive", true))
//!     .ordered_by(OrderBy::asc("sortOrder"));
//! let faqs = tables.faqs.find_many(&active)?;
//! assert_eq!(faqs.len(), 1);
//! # Ok(())
//! # }
//! ```

mod admin;
mod brand;
mod error;
mod faq;
mod ids;
mod parts;
mod patch;
mod query;
mod record;
mod store;
mod table;
mod vehicle;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use admin::{Admin, AdminDraft, AdminPatch};
pub use brand::{Brand, BrandDraft, BrandPatch};
pub use error::StoreError;
pub use faq::{Faq, FaqDraft, FaqPatch};
pub use ids::{generate_id, slugify};
pub use parts::{
    Color, ColorDraft, ColorPatch, ColorType, Trim, TrimDraft, TrimPatch, VehicleOption,
    VehicleOptionDraft, VehicleOptionPatch,
};
pub use query::{
    Condition, Direction, FieldValue, Filter, FindMany, Link, OrderBy, Relation, UniqueKey,
};
pub use record::{
    DEFAULT_SORT_ORDER, MapName, Ordered, ParseNameError, Record, SORT_ORDER_FIELD, TableName,
};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteStore;
pub use store::{Document, JsonFileStore, KeyValueMap, Store};
pub use table::{KeyValues, Table, Tables};
pub use vehicle::{
    DriveType, FuelType, PriceMatrix, PricePatch, Vehicle, VehicleCategory, VehicleDraft,
    VehiclePatch, vehicle_id,
};

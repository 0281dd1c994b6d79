//! Calling-layer services for the car lease catalog.
//!
//! Responsibilities:
//! - Pick the backing store once at startup from the mode flag
//!   ([`DataSource`], [`open_store`]).
//! - Enforce the rules that span tables ([`Catalog`]): brands in use are not
//!   deleted, vehicles take their parts with them, display order moves one
//!   step at a time.
//! - Keep the site readable when the database is down ([`FallbackStore`]).
//! - Copy the catalog between stores ([`sync_tables`]).
//!
//! Boundaries:
//! - Query semantics live in `carlease-core`; nothing here filters or sorts
//!   records itself.
//! - This crate logs through the `log` facade; the stores never do.

mod catalog;
mod error;
mod fallback;
mod source;
mod sync;

pub use catalog::{Catalog, ParseStepError, Step};
pub use error::CatalogError;
pub use fallback::FallbackStore;
pub use source::{DataSource, ParseDataSourceError, StoreConfig, open_backend, open_store};
pub use sync::{SyncReport, SyncedCollection, sync_tables};

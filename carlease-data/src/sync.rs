//! Copying the whole catalog from one store to another.

use carlease_core::{FindMany, MapName, Store, TableName};
use log::info;
use serde::Serialize;

use crate::CatalogError;

/// Number of entries copied for one table or key-value document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedCollection {
    /// Table or document name.
    pub name: &'static str,
    /// Records (tables) or keys (documents) copied.
    pub entries: usize,
}

/// Outcome of [`sync_tables`], in copy order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// One entry per table.
    pub tables: Vec<SyncedCollection>,
    /// One entry per key-value document.
    pub documents: Vec<SyncedCollection>,
}

impl SyncReport {
    /// Total number of records and keys copied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tables
            .iter()
            .chain(&self.documents)
            .map(|collection| collection.entries)
            .sum()
    }
}

/// Replaces every table and key-value document in `to` with the contents of
/// `from`, keeping storage order.
///
/// Tables are copied one at a time; a failure part-way leaves the tables
/// already copied in place.
///
/// # Errors
///
/// Returns the first read or write failure.
pub fn sync_tables(from: &dyn Store, to: &dyn Store) -> Result<SyncReport, CatalogError> {
    let mut report = SyncReport::default();
    for table in TableName::ALL {
        let documents = from.find_many(table, &FindMany::new())?;
        let entries = documents.len();
        to.replace_all(table, documents)?;
        info!("Synced {entries} record(s) into {table}");
        report.tables.push(SyncedCollection {
            name: table.as_str(),
            entries,
        });
    }
    for name in MapName::ALL {
        let map = from.load_map(name)?;
        to.save_map(name, &map)?;
        info!("Synced {} key(s) into {name}", map.len());
        report.documents.push(SyncedCollection {
            name: name.as_str(),
            entries: map.len(),
        });
    }
    Ok(report)
}

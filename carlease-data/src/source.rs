//! Selecting and opening the backing store from the mode flag.

use std::{fmt, str::FromStr, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
#[cfg(feature = "store-sqlite")]
use carlease_core::SqliteStore;
use carlease_core::{JsonFileStore, Store};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CatalogError, FallbackStore};

/// Which backend serves the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// One JSON file per table under the data directory.
    #[default]
    File,
    /// A SQLite database.
    Database,
}

impl DataSource {
    /// Name used in configuration and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode flag is neither `file` nor `database`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data source {value:?} (expected `file` or `database`)")]
pub struct ParseDataSourceError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for DataSource {
    type Err = ParseDataSourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "local" | "json" => Ok(Self::File),
            "database" | "db" | "sqlite" => Ok(Self::Database),
            _ => Err(ParseDataSourceError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Where the stores live and which one is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Active backend.
    pub source: DataSource,
    /// Directory holding the JSON table files.
    pub data_dir: Utf8PathBuf,
    /// SQLite database file.
    pub database: Utf8PathBuf,
    /// In database mode, serve reads from the JSON files when the database
    /// fails.
    pub fallback_to_files: bool,
}

impl StoreConfig {
    /// Default data directory, relative to the working directory.
    pub const DEFAULT_DATA_DIR: &'static str = "data";
    /// Default database file name inside the data directory.
    pub const DEFAULT_DATABASE: &'static str = "carlease.db";

    /// File mode rooted at `data_dir`, with the database beside the files.
    #[must_use]
    pub fn new(data_dir: impl Into<Utf8PathBuf>) -> Self {
        let root: Utf8PathBuf = data_dir.into();
        Self {
            source: DataSource::File,
            database: root.join(Self::DEFAULT_DATABASE),
            data_dir: root,
            fallback_to_files: true,
        }
    }

    /// Same paths, different backend.
    #[must_use]
    pub const fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DATA_DIR)
    }
}

/// Opens the store selected by `config`.
///
/// In database mode with `fallback_to_files` set, the database is wrapped in
/// a [`FallbackStore`] whose reads fall back to the JSON files.
///
/// # Errors
///
/// Returns [`CatalogError::Store`] when the database cannot be opened and
/// [`CatalogError::MissingFeature`] when database support was compiled out.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn Store>, CatalogError> {
    let primary = open_backend(config, config.source)?;
    if config.source == DataSource::Database && config.fallback_to_files {
        let files: Arc<dyn Store> = Arc::new(JsonFileStore::open(config.data_dir.clone()));
        return Ok(Arc::new(FallbackStore::new(primary, files)));
    }
    Ok(primary)
}

/// Opens the raw backend for `source` without any fallback.
///
/// # Errors
///
/// As for [`open_store`].
pub fn open_backend(
    config: &StoreConfig,
    source: DataSource,
) -> Result<Arc<dyn Store>, CatalogError> {
    match source {
        DataSource::File => Ok(Arc::new(JsonFileStore::open(config.data_dir.clone()))),
        DataSource::Database => open_database(&config.database),
    }
}

#[cfg(feature = "store-sqlite")]
fn open_database(path: &Utf8Path) -> Result<Arc<dyn Store>, CatalogError> {
    Ok(Arc::new(SqliteStore::open(path)?))
}

#[cfg(not(feature = "store-sqlite"))]
fn open_database(_path: &Utf8Path) -> Result<Arc<dyn Store>, CatalogError> {
    Err(CatalogError::MissingFeature {
        feature: "store-sqlite",
        action: "opening the database",
    })
}

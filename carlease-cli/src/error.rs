//! Error types emitted by the carlease CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use carlease_core::{StoreError, TableName};
use carlease_data::{CatalogError, DataSource};
use thiserror::Error;

/// Errors emitted by the carlease CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Option name as written on the command line.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// `sync` was asked to copy a store onto itself.
    #[error("cannot sync the {store} store into itself")]
    SameSource {
        /// The store named by both `--from` and `--to`.
        store: DataSource,
    },
    /// `get` needs either an id or an email.
    #[error("get needs an id or --email")]
    MissingKey,
    /// `move` was used on a table without display order.
    #[error("{table} records have no display order")]
    NotOrdered {
        /// The table that was named.
        table: TableName,
    },
    /// No record matched the given key.
    #[error("no record in {table} matches {key}")]
    NotFound {
        /// The table that was searched.
        table: TableName,
        /// The key as given on the command line.
        key: String,
    },
    /// A create or update payload did not fit the table's record shape.
    #[error("invalid {table} payload: {source}")]
    InvalidPayload {
        /// The table the payload was meant for.
        table: TableName,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A catalog rule rejected the operation, or the catalog's store failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

//! Errors raised by stores and the typed table layer.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::{MapName, Relation, TableName};

/// Error raised when reading, querying or mutating persisted records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A persisted document was not valid JSON.
    #[error("{location} holds malformed JSON for {table}: {source}")]
    Corrupt {
        /// Table or key-value document the data belongs to.
        table: &'static str,
        /// File path or database row the data was read from.
        location: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A persisted document was valid JSON of the wrong shape.
    #[error("{location} should hold {expected} for {table}")]
    UnexpectedShape {
        /// Table or key-value document the data belongs to.
        table: &'static str,
        /// File path or database row the data was read from.
        location: String,
        /// Description of the expected top-level shape.
        expected: &'static str,
    },
    /// Reading a data file before rewriting it failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// Writing a data file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// A record could not be encoded as a JSON object.
    #[error("failed to encode {table} record: {source}")]
    Encode {
        /// Table the record belongs to.
        table: TableName,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A key-value document could not be encoded as JSON.
    #[error("failed to encode the {name} document: {source}")]
    EncodeMap {
        /// Document being saved.
        name: MapName,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored record did not match its typed model.
    #[error("{table} record {id} does not match its model: {source}")]
    Decode {
        /// Table the record belongs to.
        table: TableName,
        /// Identifier of the offending record, or `?` when absent.
        id: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A filter or ordering named a field the table does not expose.
    #[error("{table} has no queryable field `{field}`")]
    UnknownField {
        /// Queried table.
        table: TableName,
        /// Rejected field name.
        field: String,
    },
    /// A unique lookup used a field that is not declared unique.
    #[error("`{field}` is not a unique field of {table}")]
    NotUnique {
        /// Queried table.
        table: TableName,
        /// Rejected field name.
        field: String,
    },
    /// An include named a relation the table does not have.
    #[error("{table} has no relation `{relation}`")]
    UnknownRelation {
        /// Queried table.
        table: TableName,
        /// Rejected relation.
        relation: Relation,
    },
    /// A record without an `id` was inserted.
    #[error("{table} record has no string `id`")]
    MissingId {
        /// Target table.
        table: TableName,
    },
    /// An insert reused an existing identifier.
    #[error("{table} already holds a record with id {id}")]
    DuplicateId {
        /// Target table.
        table: TableName,
        /// Colliding identifier.
        id: String,
    },
    /// A write would give two records the same value in a unique field.
    #[error("{table} already holds a record with {field} {value}")]
    DuplicateValue {
        /// Target table.
        table: TableName,
        /// Unique field.
        field: &'static str,
        /// Colliding value.
        value: String,
    },
    /// An update tried to change a record's identifier.
    #[error("{table} record {id} cannot change its id")]
    ImmutableId {
        /// Target table.
        table: TableName,
        /// Identifier of the updated record.
        id: String,
    },
    /// A writer panicked while holding a table lock.
    #[error("write lock for {table} was poisoned")]
    LockPoisoned {
        /// Table or key-value document guarded by the lock.
        table: &'static str,
    },
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Generic SQLite error.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn map_corrupt(
        name: MapName,
        location: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Corrupt {
            table: name.as_str(),
            location: location.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn map_encoding_failures_name_the_document() {
        let source = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let err = StoreError::EncodeMap {
            name: MapName::CompanyInfo,
            source,
        };
        let message = err.to_string();
        assert!(
            message.starts_with("failed to encode the company-info document"),
            "unexpected message: {message}"
        );
    }
}

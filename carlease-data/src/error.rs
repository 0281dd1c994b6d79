use carlease_core::{StoreError, TableName};
use thiserror::Error;

/// Failures raised by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A brand cannot be deleted while vehicles still reference it.
    #[error("brand {brand_id} is still used by {vehicles} vehicle(s)")]
    BrandInUse {
        /// Brand that was to be deleted.
        brand_id: String,
        /// Number of vehicles referencing it.
        vehicles: usize,
    },
    /// The record addressed by the operation does not exist.
    #[error("no record with id {id} in {table}")]
    NotFound {
        /// Table that was searched.
        table: TableName,
        /// Identifier that was not found.
        id: String,
    },
    /// The operation needs a backend that was compiled out.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature that provides the backend.
        feature: &'static str,
        /// What the caller was trying to do.
        action: &'static str,
    },
}

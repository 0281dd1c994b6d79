//! Serde helpers for partial-update payloads.
//!
//! A nullable field in a patch is an `Option<Option<T>>`: `None` leaves the
//! stored value alone, `Some(None)` clears it and `Some(Some(v))` replaces it.
//! Serialization skips `None`, so only supplied fields reach the store.

use serde::{Deserialize, Deserializer};

/// Deserializes a present field (including an explicit `null`) as `Some`.
///
/// Use together with `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) const fn default_true() -> bool {
    true
}

pub(crate) const fn default_sort_order() -> u32 {
    crate::DEFAULT_SORT_ORDER
}

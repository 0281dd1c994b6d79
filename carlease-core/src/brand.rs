use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_SORT_ORDER, Ordered, Record, TableName, Vehicle,
    patch::{default_sort_order, default_true, present},
};

pub(crate) const FIELDS: &[&str] = &[
    "id",
    "name",
    "nameEn",
    "logo",
    "isDomestic",
    "isActive",
    "sortOrder",
];

/// A vehicle manufacturer.
///
/// # Examples
///
/// ```
/// use carlease_core::{Brand, BrandDraft, Record};
///
/// let brand = Brand::from_draft("kia".into(), BrandDraft::default());
/// assert!(brand.is_active);
/// assert_eq!(brand.sort_order, 999);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    /// Stable unique identifier.
    pub id: String,
    /// Display name in the site language.
    pub name: String,
    /// English display name.
    #[serde(default)]
    pub name_en: Option<String>,
    /// Logo image reference.
    #[serde(default)]
    pub logo: Option<String>,
    /// Domestic manufacturer rather than an import.
    #[serde(default)]
    pub is_domestic: bool,
    /// Shown on the public site.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Manual display position.
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
    /// The brand's vehicles, present when included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicles: Option<Vec<Vehicle>>,
}

/// Creation payload for [`Brand`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandDraft {
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub logo: Option<String>,
    pub is_domestic: Option<bool>,
    pub is_active: Option<bool>,
    pub sort_order: Option<u32>,
}

/// Partial update for [`Brand`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub logo: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_domestic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Record for Brand {
    const TABLE: TableName = TableName::Brands;
    type Draft = BrandDraft;
    type Patch = BrandPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: BrandDraft) -> Self {
        Self {
            id,
            name: draft.name.unwrap_or_default(),
            name_en: draft.name_en,
            logo: draft.logo,
            is_domestic: draft.is_domestic.unwrap_or(false),
            is_active: draft.is_active.unwrap_or(true),
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
            vehicles: None,
        }
    }
}

impl Ordered for Brand {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> BrandPatch {
        BrandPatch {
            sort_order: Some(sort_order),
            ..BrandPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn patch_serializes_only_supplied_fields() {
        let patch = BrandPatch {
            name: Some("Hyundai".into()),
            logo: Some(None),
            ..BrandPatch::default()
        };
        let encoded = serde_json::to_value(&patch).expect("encode patch");
        assert_eq!(encoded, json!({"name": "Hyundai", "logo": null}));
    }

    #[rstest]
    fn patch_distinguishes_null_from_absent() {
        let patch: BrandPatch =
            serde_json::from_value(json!({"logo": null})).expect("decode patch");
        assert_eq!(patch.logo, Some(None));
        assert_eq!(patch.name_en, None);
    }

    #[rstest]
    fn stored_brand_without_flags_gets_defaults() {
        let brand: Brand =
            serde_json::from_value(json!({"id": "kia", "name": "Kia"})).expect("decode brand");
        assert!(brand.is_active);
        assert!(!brand.is_domestic);
        assert_eq!(brand.sort_order, DEFAULT_SORT_ORDER);
    }
}

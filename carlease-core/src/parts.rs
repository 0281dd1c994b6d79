//! Records owned by exactly one vehicle: trims, colours and optional extras.

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_SORT_ORDER, Filter, Ordered, Record, TableName,
    patch::{default_sort_order, present},
};

pub(crate) const TRIM_FIELDS: &[&str] =
    &["id", "vehicleId", "name", "price", "description", "sortOrder"];
pub(crate) const COLOR_FIELDS: &[&str] = &[
    "id",
    "vehicleId",
    "name",
    "type",
    "hexCode",
    "price",
    "sortOrder",
];
pub(crate) const OPTION_FIELDS: &[&str] =
    &["id", "vehicleId", "name", "price", "description", "sortOrder"];

const VEHICLE_ID_FIELD: &str = "vehicleId";

/// A trim level of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trim {
    pub id: String,
    pub vehicle_id: String,
    pub name: String,
    /// Surcharge over the vehicle's base price.
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
}

/// Creation payload for [`Trim`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimDraft {
    pub vehicle_id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

/// Partial update for [`Trim`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Record for Trim {
    const TABLE: TableName = TableName::Trims;
    type Draft = TrimDraft;
    type Patch = TrimPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: TrimDraft) -> Self {
        Self {
            id,
            vehicle_id: draft.vehicle_id,
            name: draft.name,
            price: draft.price.unwrap_or_default(),
            description: draft.description,
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
        }
    }
}

impl Ordered for Trim {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> TrimPatch {
        TrimPatch {
            sort_order: Some(sort_order),
            ..TrimPatch::default()
        }
    }

    fn ordering_scope(&self) -> Filter {
        Filter::new().eq(VEHICLE_ID_FIELD, self.vehicle_id.as_str())
    }
}

/// Where a colour applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorType {
    #[default]
    Exterior,
    Interior,
}

/// A paint or upholstery colour of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: String,
    pub vehicle_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub color_type: ColorType,
    /// CSS hex colour such as `#1b1b1b`.
    pub hex_code: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
}

/// Creation payload for [`Color`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorDraft {
    pub vehicle_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub color_type: Option<ColorType>,
    #[serde(default)]
    pub hex_code: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

/// Partial update for [`Color`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub color_type: Option<ColorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Record for Color {
    const TABLE: TableName = TableName::Colors;
    type Draft = ColorDraft;
    type Patch = ColorPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: ColorDraft) -> Self {
        Self {
            id,
            vehicle_id: draft.vehicle_id,
            name: draft.name,
            color_type: draft.color_type.unwrap_or_default(),
            hex_code: draft.hex_code.unwrap_or_else(|| "#000000".to_owned()),
            price: draft.price.unwrap_or_default(),
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
        }
    }
}

impl Ordered for Color {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> ColorPatch {
        ColorPatch {
            sort_order: Some(sort_order),
            ..ColorPatch::default()
        }
    }

    fn ordering_scope(&self) -> Filter {
        Filter::new().eq(VEHICLE_ID_FIELD, self.vehicle_id.as_str())
    }
}

/// An optional extra that can be added to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOption {
    pub id: String,
    pub vehicle_id: String,
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
}

/// Creation payload for [`VehicleOption`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOptionDraft {
    pub vehicle_id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

/// Partial update for [`VehicleOption`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Record for VehicleOption {
    const TABLE: TableName = TableName::Options;
    type Draft = VehicleOptionDraft;
    type Patch = VehicleOptionPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: VehicleOptionDraft) -> Self {
        Self {
            id,
            vehicle_id: draft.vehicle_id,
            name: draft.name,
            price: draft.price.unwrap_or_default(),
            description: draft.description,
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
        }
    }
}

impl Ordered for VehicleOption {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> VehicleOptionPatch {
        VehicleOptionPatch {
            sort_order: Some(sort_order),
            ..VehicleOptionPatch::default()
        }
    }

    fn ordering_scope(&self) -> Filter {
        Filter::new().eq(VEHICLE_ID_FIELD, self.vehicle_id.as_str())
    }
}

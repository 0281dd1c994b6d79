//! Vehicle records and their rental price matrix.

use serde::{Deserialize, Serialize};

use crate::{
    Brand, Color, DEFAULT_SORT_ORDER, Ordered, Record, TableName, Trim, VehicleOption,
    patch::{default_sort_order, default_true, present},
    slugify,
};

pub(crate) const FIELDS: &[&str] = &[
    "id",
    "brandId",
    "name",
    "category",
    "seatingMin",
    "seatingMax",
    "basePrice",
    "price36_0",
    "price36_10",
    "price36_20",
    "price36_30",
    "price48_0",
    "price48_10",
    "price48_20",
    "price48_30",
    "price60_0",
    "price60_10",
    "price60_20",
    "price60_30",
    "thumbnail",
    "isPopular",
    "isNew",
    "isActive",
    "sortOrder",
];

/// Body style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    #[default]
    Sedan,
    Suv,
    Hatchback,
    Mpv,
    Van,
    Truck,
    Coupe,
    Wagon,
}

impl VehicleCategory {
    /// Short code used inside vehicle identifiers.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Sedan => "sd",
            Self::Suv => "suv",
            Self::Hatchback => "hb",
            Self::Mpv => "mpv",
            Self::Van => "van",
            Self::Truck => "trk",
            Self::Coupe => "cp",
            Self::Wagon => "wg",
        }
    }
}

/// Fuel or energy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
    Lpg,
    Hydrogen,
}

/// Driven wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveType {
    #[serde(rename = "fwd")]
    FrontWheel,
    #[serde(rename = "rwd")]
    RearWheel,
    #[serde(rename = "awd")]
    AllWheel,
    #[serde(rename = "4wd")]
    FourWheel,
}

/// Monthly rent keyed by contract term (months) and down payment (percent).
///
/// Cells are nullable: a vehicle need not be offered for every combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceMatrix {
    pub price36_0: Option<i64>,
    pub price36_10: Option<i64>,
    pub price36_20: Option<i64>,
    pub price36_30: Option<i64>,
    pub price48_0: Option<i64>,
    pub price48_10: Option<i64>,
    pub price48_20: Option<i64>,
    pub price48_30: Option<i64>,
    pub price60_0: Option<i64>,
    pub price60_10: Option<i64>,
    pub price60_20: Option<i64>,
    pub price60_30: Option<i64>,
}

impl PriceMatrix {
    /// Contract terms in months.
    pub const TERMS: [u32; 3] = [36, 48, 60];
    /// Down payments in percent of the vehicle price.
    pub const DOWN_PAYMENTS: [u32; 4] = [0, 10, 20, 30];

    /// Monthly rent for a term and down payment, if offered.
    ///
    /// # Examples
    ///
    /// ```
    /// use carlease_core::PriceMatrix;
    ///
    /// let prices = PriceMatrix { price48_10: Some(612_000), ..PriceMatrix::default() };
    /// assert_eq!(prices.get(48, 10), Some(612_000));
    /// assert_eq!(prices.get(48, 20), None);
    /// assert_eq!(prices.get(12, 0), None);
    /// ```
    pub const fn get(&self, term: u32, down_payment: u32) -> Option<i64> {
        match (term, down_payment) {
            (36, 0) => self.price36_0,
            (36, 10) => self.price36_10,
            (36, 20) => self.price36_20,
            (36, 30) => self.price36_30,
            (48, 0) => self.price48_0,
            (48, 10) => self.price48_10,
            (48, 20) => self.price48_20,
            (48, 30) => self.price48_30,
            (60, 0) => self.price60_0,
            (60, 10) => self.price60_10,
            (60, 20) => self.price60_20,
            (60, 30) => self.price60_30,
            _ => None,
        }
    }

    /// Cheapest offered monthly rent, used for "from" prices.
    pub fn lowest(&self) -> Option<i64> {
        Self::TERMS
            .iter()
            .flat_map(|term| {
                Self::DOWN_PAYMENTS
                    .iter()
                    .map(move |down| self.get(*term, *down))
            })
            .flatten()
            .min()
    }
}

/// Partial update for a [`PriceMatrix`]; `Some(None)` clears a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePatch {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price36_0: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price36_10: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price36_20: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price36_30: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price48_0: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price48_10: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price48_20: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price48_30: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price60_0: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price60_10: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price60_20: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price60_30: Option<Option<i64>>,
}

/// A vehicle model offered for long-term rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    /// Owning brand. Not checked by the stores.
    pub brand_id: String,
    pub name: String,
    pub category: VehicleCategory,
    #[serde(default)]
    pub fuel_types: Vec<FuelType>,
    #[serde(default)]
    pub drive_types: Vec<DriveType>,
    #[serde(default)]
    pub seating_min: u8,
    #[serde(default)]
    pub seating_max: u8,
    /// Purchase price the rent is calculated from.
    #[serde(default)]
    pub base_price: i64,
    #[serde(flatten)]
    pub prices: PriceMatrix,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
    /// Present when the brand relation is included; `None` also when the
    /// referenced brand no longer exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trims: Option<Vec<Trim>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<VehicleOption>>,
}

/// Creation payload for [`Vehicle`]. Brand, name and category are required
/// because they make up the identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub brand_id: String,
    pub name: String,
    pub category: VehicleCategory,
    #[serde(default)]
    pub fuel_types: Vec<FuelType>,
    #[serde(default)]
    pub drive_types: Vec<DriveType>,
    #[serde(default)]
    pub seating_min: Option<u8>,
    #[serde(default)]
    pub seating_max: Option<u8>,
    #[serde(default)]
    pub base_price: Option<i64>,
    #[serde(flatten)]
    pub prices: PriceMatrix,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_popular: Option<bool>,
    #[serde(default)]
    pub is_new: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

/// Partial update for [`Vehicle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<VehicleCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_types: Option<Vec<FuelType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_types: Option<Vec<DriveType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_min: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_max: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<i64>,
    #[serde(flatten)]
    pub prices: PricePatch,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_popular: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

/// Builds the human-legible vehicle identifier
/// `{brand}-{category code}-{name}`.
///
/// # Examples
///
/// ```
/// use carlease_core::{VehicleCategory, vehicle_id};
///
/// assert_eq!(vehicle_id("Kia", VehicleCategory::Suv, "EV9 GT-Line"), "kia-suv-ev9-gt-line");
/// ```
pub fn vehicle_id(brand_id: &str, category: VehicleCategory, name: &str) -> String {
    let name = slugify(name);
    let name = if name.is_empty() { "vehicle".to_owned() } else { name };
    format!("{}-{}-{name}", slugify(brand_id), category.code())
}

impl Record for Vehicle {
    const TABLE: TableName = TableName::Vehicles;
    type Draft = VehicleDraft;
    type Patch = VehiclePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn proposed_id(draft: &VehicleDraft) -> String {
        vehicle_id(&draft.brand_id, draft.category, &draft.name)
    }

    fn from_draft(id: String, draft: VehicleDraft) -> Self {
        Self {
            id,
            brand_id: draft.brand_id,
            name: draft.name,
            category: draft.category,
            fuel_types: draft.fuel_types,
            drive_types: draft.drive_types,
            seating_min: draft.seating_min.unwrap_or(5),
            seating_max: draft.seating_max.unwrap_or(5),
            base_price: draft.base_price.unwrap_or_default(),
            prices: draft.prices,
            thumbnail: draft.thumbnail,
            images: draft.images,
            is_popular: draft.is_popular.unwrap_or(false),
            is_new: draft.is_new.unwrap_or(false),
            is_active: draft.is_active.unwrap_or(true),
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
            brand: None,
            trims: None,
            colors: None,
            options: None,
        }
    }
}

impl Ordered for Vehicle {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> VehiclePatch {
        VehiclePatch {
            sort_order: Some(sort_order),
            ..VehiclePatch::default()
        }
    }
}

//! Catalog operations that span more than one table.
//!
//! The stores never check references between tables. The rules the back
//! office relies on live here instead: a brand cannot be deleted while
//! vehicles use it, deleting a vehicle removes the parts it owns, and
//! "move up/down" swaps display positions with the adjacent record.

use std::{fmt, str::FromStr};

use carlease_core::{
    Brand, Faq, Filter, FindMany, OrderBy, Ordered, Record, Relation, SORT_ORDER_FIELD,
    StoreError, Table, Tables, UniqueKey, Vehicle,
};
use log::info;
use thiserror::Error;

use crate::CatalogError;

/// Direction for [`Catalog::move_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Towards the start of the list.
    Up,
    /// Towards the end of the list.
    Down,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// Error returned when a step is neither `up` nor `down`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step {value:?} (expected `up` or `down`)")]
pub struct ParseStepError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for Step {
    type Err = ParseStepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ParseStepError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Catalog services over a set of repositories.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use carlease_core::{BrandDraft, Tables, test_support::MemoryStore};
/// use carlease_data::Catalog;
///
/// # fn main() -> Result<(), carlease_data::CatalogError> {
/// let catalog = Catalog::new(Tables::new(Arc::new(MemoryStore::default())));
/// let brand = catalog.tables().brands.create(BrandDraft {
///     name: Some("Genesis".into()),
///     ..BrandDraft::default()
/// })?;
/// assert!(catalog.delete_brand(&brand.id)?);
/// assert!(!catalog.delete_brand(&brand.id)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Tables,
}

impl Catalog {
    /// Wraps the repositories.
    #[must_use]
    pub const fn new(tables: Tables) -> Self {
        Self { tables }
    }

    /// The underlying repositories.
    #[must_use]
    pub const fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Deletes a brand that no vehicle references.
    ///
    /// Returns `false` when no brand has `id`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::BrandInUse`] while vehicles reference the brand, or a
    /// store failure.
    pub fn delete_brand(&self, id: &str) -> Result<bool, CatalogError> {
        let vehicles = self.tables.vehicles.count(&Filter::new().eq("brandId", id))?;
        if vehicles > 0 {
            return Err(CatalogError::BrandInUse {
                brand_id: id.to_owned(),
                vehicles,
            });
        }
        let removed = self.tables.brands.delete(id)?;
        if removed {
            info!("Deleted brand {id}");
        }
        Ok(removed)
    }

    /// Deletes a vehicle together with its trims, colours and options.
    ///
    /// The parts are removed first, one table at a time; a failure part-way
    /// leaves whatever was already deleted gone. Returns `false` when no
    /// vehicle has `id`, without touching the part tables.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub fn delete_vehicle(&self, id: &str) -> Result<bool, CatalogError> {
        if self.tables.vehicles.find_unique(&UniqueKey::id(id))?.is_none() {
            return Ok(false);
        }
        let owned = Filter::new().eq("vehicleId", id);
        let trims = delete_matching(&self.tables.trims, &owned)?;
        let colors = delete_matching(&self.tables.colors, &owned)?;
        let options = delete_matching(&self.tables.options, &owned)?;
        let removed = self.tables.vehicles.delete(id)?;
        info!(
            "Deleted vehicle {id} with {trims} trim(s), {colors} colour(s) and {options} option(s)"
        );
        Ok(removed)
    }

    /// Moves a record one place up or down among the records it is ordered
    /// against.
    ///
    /// The record swaps `sortOrder` with its neighbour. When both share the
    /// same value (new records all start at the same placeholder) the whole
    /// group is renumbered from zero in its current order with the two
    /// swapped, so the move is always visible. Returns `false` when the
    /// record is already first (up) or last (down).
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when no record has `id`, or a store failure.
    pub fn move_record<R: Ordered>(
        &self,
        table: &Table<R>,
        id: &str,
        step: Step,
    ) -> Result<bool, CatalogError> {
        let not_found = || CatalogError::NotFound {
            table: R::TABLE,
            id: id.to_owned(),
        };
        let record = table.find_unique(&UniqueKey::id(id))?.ok_or_else(not_found)?;
        let siblings = table.find_many(
            &FindMany::new()
                .with_filter(record.ordering_scope())
                .ordered_by(OrderBy::asc(SORT_ORDER_FIELD)),
        )?;
        let position = siblings
            .iter()
            .position(|sibling| sibling.id() == id)
            .ok_or_else(not_found)?;
        let adjacent = match step {
            Step::Up => position.checked_sub(1),
            Step::Down => position.checked_add(1),
        };
        let Some((current, neighbour, target)) = adjacent.and_then(|index| {
            Some((siblings.get(position)?, siblings.get(index)?, index))
        }) else {
            return Ok(false);
        };

        if current.sort_order() == neighbour.sort_order() {
            let mut order: Vec<&R> = siblings.iter().collect();
            order.swap(position, target);
            renumber(table, &order)?;
        } else {
            table.update(current.id(), &R::reorder_patch(neighbour.sort_order()))?;
            table.update(neighbour.id(), &R::reorder_patch(current.sort_order()))?;
        }
        info!("Moved {} {id} {step}", R::TABLE);
        Ok(true)
    }

    /// Active vehicles in display order, each with its brand attached.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub fn active_vehicles(&self) -> Result<Vec<Vehicle>, CatalogError> {
        let query = displayed()
            .with_filter(active())
            .including(Relation::Brand);
        Ok(self.tables.vehicles.find_many(&query)?)
    }

    /// Active vehicles flagged as popular, in display order.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub fn popular_vehicles(&self) -> Result<Vec<Vehicle>, CatalogError> {
        let query = displayed()
            .with_filter(active().eq("isPopular", true))
            .including(Relation::Brand);
        Ok(self.tables.vehicles.find_many(&query)?)
    }

    /// One vehicle with its brand, trims, colours and options.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub fn vehicle_detail(&self, id: &str) -> Result<Option<Vehicle>, CatalogError> {
        Ok(self.tables.vehicles.find_unique_with(
            &UniqueKey::id(id),
            &[
                Relation::Brand,
                Relation::Trims,
                Relation::Colors,
                Relation::Options,
            ],
        )?)
    }

    /// Active brands in display order.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub fn active_brands(&self) -> Result<Vec<Brand>, CatalogError> {
        Ok(self
            .tables
            .brands
            .find_many(&displayed().with_filter(active()))?)
    }

    /// Active FAQs in display order.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub fn active_faqs(&self) -> Result<Vec<Faq>, CatalogError> {
        Ok(self
            .tables
            .faqs
            .find_many(&displayed().with_filter(active()))?)
    }
}

fn active() -> Filter {
    Filter::new().eq("isActive", true)
}

fn displayed() -> FindMany {
    FindMany::new().ordered_by(OrderBy::asc(SORT_ORDER_FIELD))
}

fn delete_matching<R: Record>(table: &Table<R>, filter: &Filter) -> Result<usize, StoreError> {
    let mut removed = 0;
    for record in table.find_many(&FindMany::new().with_filter(filter.clone()))? {
        if table.delete(record.id())? {
            removed += 1;
        }
    }
    Ok(removed)
}

fn renumber<R: Ordered>(table: &Table<R>, order: &[&R]) -> Result<(), StoreError> {
    for (position, record) in (0_u32..).zip(order) {
        if record.sort_order() != position {
            table.update(record.id(), &R::reorder_patch(position))?;
        }
    }
    Ok(())
}

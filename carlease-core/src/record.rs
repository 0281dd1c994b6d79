//! Table identities and the traits binding record types to their tables.
//!
//! Each table is a named collection of same-shaped records persisted as one
//! unit. [`TableName`] carries the static facts every store needs to answer
//! a query: the persisted file name, the fields that may be filtered or
//! sorted on, the fields declared unique and the relations that may be
//! included.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{Filter, Relation, ids};

/// Default `sortOrder` given to records created without one, so new rows
/// sort after the manually ordered ones.
pub const DEFAULT_SORT_ORDER: u32 = 999;

/// Name of the field carrying the manual display order.
pub const SORT_ORDER_FIELD: &str = "sortOrder";

/// The record tables of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
    /// Vehicle manufacturers.
    Brands,
    /// Vehicle models offered for rental.
    Vehicles,
    /// Trim levels owned by a vehicle.
    Trims,
    /// Exterior and interior colours owned by a vehicle.
    Colors,
    /// Optional extras owned by a vehicle.
    Options,
    /// Frequently asked questions.
    Faqs,
    /// Back-office accounts.
    Admins,
}

impl TableName {
    /// Every table, in dependency order (referenced tables first).
    pub const ALL: [Self; 7] = [
        Self::Brands,
        Self::Vehicles,
        Self::Trims,
        Self::Colors,
        Self::Options,
        Self::Faqs,
        Self::Admins,
    ];

    /// Lowercase table name, also used as the SQLite table name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::Vehicles => "vehicles",
            Self::Trims => "trims",
            Self::Colors => "colors",
            Self::Options => "options",
            Self::Faqs => "faqs",
            Self::Admins => "admins",
        }
    }

    /// File holding the table inside the data directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Brands => "brands.json",
            Self::Vehicles => "vehicles.json",
            Self::Trims => "trims.json",
            Self::Colors => "colors.json",
            Self::Options => "options.json",
            Self::Faqs => "faqs.json",
            Self::Admins => "admins.json",
        }
    }

    /// Fields that may appear in a filter or an ordering.
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Brands => crate::brand::FIELDS,
            Self::Vehicles => crate::vehicle::FIELDS,
            Self::Trims => crate::parts::TRIM_FIELDS,
            Self::Colors => crate::parts::COLOR_FIELDS,
            Self::Options => crate::parts::OPTION_FIELDS,
            Self::Faqs => crate::faq::FIELDS,
            Self::Admins => crate::admin::FIELDS,
        }
    }

    /// Fields whose values identify at most one record.
    pub const fn unique_fields(self) -> &'static [&'static str] {
        match self {
            Self::Admins => &["id", "email"],
            _ => &["id"],
        }
    }

    /// Relations that may be included when querying this table.
    pub const fn relations(self) -> &'static [Relation] {
        match self {
            Self::Brands => &[Relation::Vehicles],
            Self::Vehicles => &[
                Relation::Brand,
                Relation::Trims,
                Relation::Colors,
                Relation::Options,
            ],
            _ => &[],
        }
    }

    /// Returns `true` when `field` may be filtered or sorted on.
    pub fn has_field(self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown table or document name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{name}`")]
pub struct ParseNameError {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub name: String,
}

impl FromStr for TableName {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseNameError {
                kind: "table",
                name: s.to_owned(),
            })
    }
}

/// Flat key-value documents stored next to the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapName {
    /// Site-wide settings.
    Settings,
    /// Company details shown in the site footer.
    CompanyInfo,
}

impl MapName {
    /// Every key-value document.
    pub const ALL: [Self; 2] = [Self::Settings, Self::CompanyInfo];

    /// Document name, also used as the SQLite namespace.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::CompanyInfo => "company-info",
        }
    }

    /// File holding the document inside the data directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Settings => "settings.json",
            Self::CompanyInfo => "company-info.json",
        }
    }
}

impl fmt::Display for MapName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapName {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseNameError {
                kind: "document",
                name: s.to_owned(),
            })
    }
}

/// A typed record persisted in one [`TableName`].
///
/// `Draft` is the creation payload: omitted optional fields receive their
/// defaults in [`Record::from_draft`]. `Patch` is the partial-update payload;
/// it must serialize only the fields that were supplied.
pub trait Record:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Table the record lives in.
    const TABLE: TableName;

    /// Creation payload.
    type Draft: DeserializeOwned + fmt::Debug;

    /// Partial-update payload.
    type Patch: Serialize + DeserializeOwned + fmt::Debug;

    /// Stable unique identifier.
    fn id(&self) -> &str;

    /// Identifier to try first when creating a record from `draft`.
    ///
    /// Most tables use a timestamp with a random suffix; tables with
    /// human-legible identifiers override this.
    fn proposed_id(_draft: &Self::Draft) -> String {
        ids::generate_id()
    }

    /// Builds the full record, applying defaults for omitted fields.
    fn from_draft(id: String, draft: Self::Draft) -> Self;
}

/// Records carrying an admin-controlled `sortOrder`.
pub trait Ordered: Record {
    /// Current display position.
    fn sort_order(&self) -> u32;

    /// Patch that only changes the display position.
    fn reorder_patch(sort_order: u32) -> Self::Patch;

    /// Records this one is ordered against.
    ///
    /// Parts owned by a vehicle are only ordered against their siblings.
    fn ordering_scope(&self) -> Filter {
        Filter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("brands", TableName::Brands)]
    #[case("Vehicles", TableName::Vehicles)]
    #[case("OPTIONS", TableName::Options)]
    fn parses_table_names(#[case] input: &str, #[case] expected: TableName) {
        assert_eq!(input.parse::<TableName>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_table() {
        let err = "settings".parse::<TableName>().expect_err("not a table");
        assert_eq!(err.name, "settings");
    }

    #[rstest]
    fn every_table_filters_on_id_and_declares_it_unique() {
        for table in TableName::ALL {
            assert!(table.has_field("id"), "{table} should expose id");
            assert!(table.unique_fields().contains(&"id"));
        }
    }

    #[rstest]
    fn parses_company_info_document() {
        assert_eq!("company-info".parse::<MapName>(), Ok(MapName::CompanyInfo));
    }
}

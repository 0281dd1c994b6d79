//! Query model shared by every store.
//!
//! A query is deliberately small: equality predicates joined by AND, at most
//! one ordering field and a list of relations to attach. Stores must agree on
//! the exact semantics so callers can switch backends without noticing:
//!
//! - a missing field equals [`FieldValue::Null`];
//! - values of different JSON types never compare equal;
//! - ordering puts null first, then numbers (booleans count as `0`/`1`),
//!   then text compared byte-wise;
//! - records with equal sort keys keep their storage order in both
//!   directions.

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::{ParseNameError, TableName, store::Document};

/// A scalar value a field can be compared against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// JSON `null` or an absent field.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Int(i64),
    /// JSON string.
    Text(String),
}

impl FieldValue {
    /// Converts a JSON scalar. Arrays, objects and non-integral numbers have
    /// no equality semantics and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number.as_i64().map(Self::Int),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parses command-line input: JSON scalars first, bare text otherwise.
    pub fn parse_lenient(input: &str) -> Self {
        serde_json::from_str::<Value>(input)
            .ok()
            .and_then(|value| Self::from_json(&value))
            .unwrap_or_else(|| Self::Text(input.to_owned()))
    }

    /// Returns `true` when the stored `value` equals this one.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Self::Null, None | Some(Value::Null)) => true,
            (Self::Bool(expected), Some(Value::Bool(actual))) => expected == actual,
            (Self::Int(expected), Some(Value::Number(actual))) => {
                actual.as_i64() == Some(*expected)
            }
            (Self::Text(expected), Some(Value::String(actual))) => expected == actual,
            _ => false,
        }
    }

    /// JSON rendering of the value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Int(number) => Value::from(*number),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One equality predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Field name as persisted (camelCase).
    pub field: String,
    /// Value the field must equal.
    pub value: FieldValue,
}

impl FromStr for Condition {
    type Err = String;

    /// Parses `field=value`, reading the value with
    /// [`FieldValue::parse_lenient`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected field=value, found `{s}`"))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(format!("missing field name in `{s}`"));
        }
        Ok(Self {
            field: field.to_owned(),
            value: FieldValue::parse_lenient(value.trim()),
        })
    }
}

/// Conjunction of equality predicates. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the predicate `field == value`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Predicates in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns `true` when the filter has no predicates.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns `true` when `document` satisfies every predicate.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.value.matches(document.get(&condition.field)))
    }
}

impl FromIterator<Condition> for Filter {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// SQL keyword for the direction.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

/// Ordering on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name as persisted (camelCase).
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

impl FromStr for OrderBy {
    type Err = String;

    /// Parses `field` or `field:asc|desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, Direction::Asc),
        };
        if field.is_empty() {
            return Err(format!("missing field name in `{s}`"));
        }
        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }
}

/// How a relation is resolved against its target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// The owning record stores the target id in `local_key`.
    ToOne {
        /// Foreign-key field on the owning record.
        local_key: &'static str,
    },
    /// Target records store the owner id in `foreign_key`.
    ToMany {
        /// Foreign-key field on the target records.
        foreign_key: &'static str,
    },
}

/// Related records that can be attached to query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// A vehicle's brand.
    Brand,
    /// A brand's vehicles.
    Vehicles,
    /// A vehicle's trims.
    Trims,
    /// A vehicle's colours.
    Colors,
    /// A vehicle's optional extras.
    Options,
}

impl Relation {
    const ALL: [Self; 5] = [
        Self::Brand,
        Self::Vehicles,
        Self::Trims,
        Self::Colors,
        Self::Options,
    ];

    /// Field the related record(s) are attached under.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Vehicles => "vehicles",
            Self::Trims => "trims",
            Self::Colors => "colors",
            Self::Options => "options",
        }
    }

    /// Table holding the related records.
    pub const fn target(self) -> TableName {
        match self {
            Self::Brand => TableName::Brands,
            Self::Vehicles => TableName::Vehicles,
            Self::Trims => TableName::Trims,
            Self::Colors => TableName::Colors,
            Self::Options => TableName::Options,
        }
    }

    /// Join description.
    pub const fn link(self) -> Link {
        match self {
            Self::Brand => Link::ToOne {
                local_key: "brandId",
            },
            Self::Vehicles => Link::ToMany {
                foreign_key: "brandId",
            },
            Self::Trims | Self::Colors | Self::Options => Link::ToMany {
                foreign_key: "vehicleId",
            },
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for Relation {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.field_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseNameError {
                kind: "relation",
                name: s.to_owned(),
            })
    }
}

/// Arguments of a `find_many` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindMany {
    /// Records must satisfy every predicate.
    pub filter: Filter,
    /// Optional ordering; storage order otherwise.
    pub order_by: Option<OrderBy>,
    /// Relations to attach to each result.
    pub include: Vec<Relation>,
}

impl FindMany {
    /// Query returning every record in storage order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn ordered_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Adds a relation to attach.
    #[must_use]
    pub fn including(mut self, relation: Relation) -> Self {
        self.include.push(relation);
        self
    }
}

/// Lookup by a field declared unique for the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    /// Unique field name.
    pub field: String,
    /// Value to look up.
    pub value: FieldValue,
}

impl UniqueKey {
    /// Lookup by primary id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::new("id", id.into())
    }

    /// Lookup by another unique field, such as an admin's email.
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, found {other}"),
        }
    }

    #[rstest]
    #[case(FieldValue::Bool(true), json!(true), true)]
    #[case(FieldValue::Bool(true), json!(1), false)]
    #[case(FieldValue::Int(1), json!(1), true)]
    #[case(FieldValue::Int(1), json!("1"), false)]
    #[case(FieldValue::Int(3), json!(3.0), false)]
    #[case(FieldValue::Text("suv".into()), json!("suv"), true)]
    #[case(FieldValue::Null, json!(null), true)]
    #[case(FieldValue::Null, json!(""), false)]
    fn values_only_match_their_own_json_type(
        #[case] expected: FieldValue,
        #[case] stored: Value,
        #[case] matches: bool,
    ) {
        assert_eq!(expected.matches(Some(&stored)), matches);
    }

    #[rstest]
    fn null_matches_absent_field() {
        assert!(FieldValue::Null.matches(None));
        assert!(!FieldValue::Bool(false).matches(None));
    }

    #[rstest]
    fn filter_requires_every_condition() {
        let doc = document(json!({"brandId": "kia", "isActive": true}));
        let both = Filter::new().eq("brandId", "kia").eq("isActive", true);
        let mismatch = Filter::new().eq("brandId", "kia").eq("isActive", false);
        assert!(both.matches(&doc));
        assert!(!mismatch.matches(&doc));
        assert!(Filter::new().matches(&doc));
    }

    #[rstest]
    #[case("isActive=true", "isActive", FieldValue::Bool(true))]
    #[case("sortOrder=3", "sortOrder", FieldValue::Int(3))]
    #[case("brandId=kia", "brandId", FieldValue::Text("kia".into()))]
    #[case("brandId=\"42\"", "brandId", FieldValue::Text("42".into()))]
    #[case("logo=null", "logo", FieldValue::Null)]
    fn parses_conditions(#[case] input: &str, #[case] field: &str, #[case] value: FieldValue) {
        let condition: Condition = input.parse().expect("valid condition");
        assert_eq!(condition.field, field);
        assert_eq!(condition.value, value);
    }

    #[rstest]
    #[case("isActive")]
    #[case("=true")]
    fn rejects_malformed_conditions(#[case] input: &str) {
        assert!(input.parse::<Condition>().is_err());
    }

    #[rstest]
    #[case("sortOrder", OrderBy::asc("sortOrder"))]
    #[case("basePrice:desc", OrderBy::desc("basePrice"))]
    #[case("name:ASC", OrderBy::asc("name"))]
    fn parses_orderings(#[case] input: &str, #[case] expected: OrderBy) {
        assert_eq!(input.parse::<OrderBy>(), Ok(expected));
    }

    #[rstest]
    fn relation_round_trips_through_its_field_name() {
        for relation in Relation::ALL {
            assert_eq!(relation.field_name().parse::<Relation>(), Ok(relation));
        }
    }
}

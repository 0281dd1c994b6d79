//! Query semantics shared by the in-process stores.
//!
//! Both the file store and the in-memory fake hold whole tables as
//! `Vec<Document>` in storage order; these helpers validate queries, select
//! and order records and resolve relations the same way for both.

use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value;

use crate::{
    Direction, FindMany, Filter, Link, OrderBy, Relation, SORT_ORDER_FIELD, StoreError, TableName,
    UniqueKey,
    store::{Document, KeyValueMap, Store},
};

const ID_FIELD: &str = "id";

/// Rejects filters on fields the table does not expose.
pub(crate) fn validate_filter(table: TableName, filter: &Filter) -> Result<(), StoreError> {
    for condition in filter.conditions() {
        validate_field(table, &condition.field)?;
    }
    Ok(())
}

/// Rejects unknown filter or sort fields and undeclared relations.
pub(crate) fn validate_query(table: TableName, query: &FindMany) -> Result<(), StoreError> {
    validate_filter(table, &query.filter)?;
    if let Some(order_by) = &query.order_by {
        validate_field(table, &order_by.field)?;
    }
    validate_relations(table, &query.include)
}

pub(crate) fn validate_relations(table: TableName, include: &[Relation]) -> Result<(), StoreError> {
    match include
        .iter()
        .find(|relation| !table.relations().contains(*relation))
    {
        Some(relation) => Err(StoreError::UnknownRelation {
            table,
            relation: *relation,
        }),
        None => Ok(()),
    }
}

/// Rejects lookups on fields that are not declared unique.
pub(crate) fn validate_unique(table: TableName, key: &UniqueKey) -> Result<(), StoreError> {
    if table.unique_fields().contains(&key.field.as_str()) {
        Ok(())
    } else {
        Err(StoreError::NotUnique {
            table,
            field: key.field.clone(),
        })
    }
}

fn validate_field(table: TableName, field: &str) -> Result<(), StoreError> {
    if table.has_field(field) {
        Ok(())
    } else {
        Err(StoreError::UnknownField {
            table,
            field: field.to_owned(),
        })
    }
}

/// Filters `documents` and applies the ordering, keeping storage order
/// between equal sort keys.
pub(crate) fn select(documents: Vec<Document>, query: &FindMany) -> Vec<Document> {
    let mut selected: Vec<Document> = documents
        .into_iter()
        .filter(|document| query.filter.matches(document))
        .collect();
    if let Some(order_by) = &query.order_by {
        sort_stable(&mut selected, order_by);
    }
    selected
}

fn sort_stable(documents: &mut Vec<Document>, order_by: &OrderBy) {
    let mut keyed: Vec<(SortKey, Document)> = documents
        .drain(..)
        .map(|document| (SortKey::of(document.get(&order_by.field)), document))
        .collect();
    // `sort_by` is stable; reversing the comparison instead of the output
    // keeps ties in storage order for descending sorts too.
    keyed.sort_by(|(a, _), (b, _)| match order_by.direction {
        Direction::Asc => a.compare(b),
        Direction::Desc => b.compare(a),
    });
    documents.extend(keyed.into_iter().map(|(_, document)| document));
}

/// Position of a JSON value in the cross-type ordering: null, then numbers,
/// then text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl SortKey {
    pub(crate) fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Null,
            Some(Value::Bool(flag)) => Self::Int(i64::from(*flag)),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Real))
                .unwrap_or(Self::Null),
            Some(Value::String(text)) => Self::Text(text.clone()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Real(_) => 1,
            Self::Text(_) => 2,
        }
    }

    /// Mixed integer and real keys compare as floats, as SQLite does.
    pub(crate) fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Int(a), Self::Real(b)) => (*a as f64).total_cmp(b),
            (Self::Real(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Real(a), Self::Real(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// First record whose unique field equals the key.
pub(crate) fn find_unique_in(documents: Vec<Document>, key: &UniqueKey) -> Option<Document> {
    documents
        .into_iter()
        .find(|document| key.value.matches(document.get(&key.field)))
}

/// The record's string identifier.
pub(crate) fn document_id(table: TableName, document: &Document) -> Result<&str, StoreError> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or(StoreError::MissingId { table })
}

/// Position of the record with `id` in storage order.
pub(crate) fn position_of(documents: &[Document], id: &str) -> Option<usize> {
    documents
        .iter()
        .position(|document| document.get(ID_FIELD).and_then(Value::as_str) == Some(id))
}

/// Checks that `document` can join `existing` without a clash on any unique
/// field.
pub(crate) fn check_insert(
    table: TableName,
    existing: &[Document],
    document: &Document,
) -> Result<(), StoreError> {
    let id = document_id(table, document)?;
    if position_of(existing, id).is_some() {
        return Err(StoreError::DuplicateId {
            table,
            id: id.to_owned(),
        });
    }
    ensure_unique_values(table, existing, document)
}

/// Rejects `candidate` when another record (by id) shares one of its
/// non-null unique values.
pub(crate) fn ensure_unique_values(
    table: TableName,
    existing: &[Document],
    candidate: &Document,
) -> Result<(), StoreError> {
    let candidate_id = candidate.get(ID_FIELD);
    for field in table.unique_fields().iter().copied() {
        if field == ID_FIELD {
            continue;
        }
        let Some(value) = candidate.get(field).filter(|value| !value.is_null()) else {
            continue;
        };
        let clash = existing
            .iter()
            .filter(|other| other.get(ID_FIELD) != candidate_id)
            .any(|other| other.get(field) == Some(value));
        if clash {
            return Err(StoreError::DuplicateValue {
                table,
                field,
                value: display_value(value),
            });
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToOwned::to_owned)
}

/// Shallow-merges `changes` into `target`. The id may be repeated but not
/// changed.
pub(crate) fn merge(
    table: TableName,
    target: &mut Document,
    changes: Document,
) -> Result<(), StoreError> {
    let id = document_id(table, target)?;
    if let Some(requested) = changes.get(ID_FIELD) {
        if requested.as_str() != Some(id) {
            return Err(StoreError::ImmutableId {
                table,
                id: id.to_owned(),
            });
        }
    }
    target.extend(changes);
    Ok(())
}

/// Parses a persisted table: a JSON array of objects.
pub(crate) fn parse_table(
    table: TableName,
    location: &str,
    bytes: &[u8],
) -> Result<Vec<Document>, StoreError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        table: table.as_str(),
        location: location.to_owned(),
        source,
    })?;
    let shape_error = || StoreError::UnexpectedShape {
        table: table.as_str(),
        location: location.to_owned(),
        expected: "an array of objects",
    };
    let Value::Array(items) = value else {
        return Err(shape_error());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(document) => Ok(document),
            _ => Err(shape_error()),
        })
        .collect()
}

/// Parses a persisted key-value document: a flat object of strings.
pub(crate) fn parse_map(
    name: crate::MapName,
    location: &str,
    bytes: &[u8],
) -> Result<KeyValueMap, StoreError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|source| StoreError::map_corrupt(name, location, source))?;
    let shape_error = || StoreError::UnexpectedShape {
        table: name.as_str(),
        location: location.to_owned(),
        expected: "an object of strings",
    };
    let Value::Object(entries) = value else {
        return Err(shape_error());
    };
    entries
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key, text)),
            _ => Err(shape_error()),
        })
        .collect()
}

/// Attaches each requested relation to every document.
///
/// Related records are fetched once per relation through `store`, so the
/// same code serves every backend. To-many relations are ordered by
/// `sortOrder`; a dangling to-one reference attaches `null`.
pub(crate) fn attach_relations(
    store: &dyn Store,
    documents: &mut [Document],
    include: &[Relation],
) -> Result<(), StoreError> {
    if documents.is_empty() {
        return Ok(());
    }
    for relation in include.iter().copied() {
        match relation.link() {
            Link::ToOne { local_key } => attach_one(store, documents, relation, local_key)?,
            Link::ToMany { foreign_key } => attach_many(store, documents, relation, foreign_key)?,
        }
    }
    Ok(())
}

fn attach_one(
    store: &dyn Store,
    documents: &mut [Document],
    relation: Relation,
    local_key: &str,
) -> Result<(), StoreError> {
    let targets: HashMap<String, Document> = store
        .find_many(relation.target(), &FindMany::new())?
        .into_iter()
        .filter_map(|target| {
            let id = target.get(ID_FIELD)?.as_str()?.to_owned();
            Some((id, target))
        })
        .collect();
    for document in documents.iter_mut() {
        let related = document
            .get(local_key)
            .and_then(Value::as_str)
            .and_then(|key| targets.get(key))
            .cloned()
            .map_or(Value::Null, Value::Object);
        document.insert(relation.field_name().to_owned(), related);
    }
    Ok(())
}

fn attach_many(
    store: &dyn Store,
    documents: &mut [Document],
    relation: Relation,
    foreign_key: &str,
) -> Result<(), StoreError> {
    let query = FindMany::new().ordered_by(OrderBy::asc(SORT_ORDER_FIELD));
    let mut groups: HashMap<String, Vec<Value>> = HashMap::new();
    for target in store.find_many(relation.target(), &query)? {
        if let Some(owner) = target.get(foreign_key).and_then(Value::as_str) {
            groups
                .entry(owner.to_owned())
                .or_default()
                .push(Value::Object(target));
        }
    }
    for document in documents.iter_mut() {
        let related = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .and_then(|id| groups.remove(id))
            .unwrap_or_default();
        document.insert(relation.field_name().to_owned(), Value::Array(related));
    }
    Ok(())
}

//! Command implementations. Each one opens the configured store, runs one
//! operation and writes pretty JSON.

use std::io::Write;

use clap::{Args, Parser};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::json;

use carlease_core::{
    Condition, Filter, FindMany, MapName, OrderBy, Relation, TableName, Tables, UniqueKey,
};
use carlease_data::{Catalog, DataSource, Step, StoreConfig, open_backend, open_store, sync_tables};

use crate::{ARG_SYNC_FROM, ARG_SYNC_TO, CliError, ENV_SYNC_FROM, ENV_SYNC_TO, write_json};

/// Runs `$body` with `$table` bound to the typed repository for `$name`.
macro_rules! with_table {
    ($tables:expr, $name:expr, |$table:ident| $body:expr) => {
        match $name {
            TableName::Brands => {
                let $table = &$tables.brands;
                $body
            }
            TableName::Vehicles => {
                let $table = &$tables.vehicles;
                $body
            }
            TableName::Trims => {
                let $table = &$tables.trims;
                $body
            }
            TableName::Colors => {
                let $table = &$tables.colors;
                $body
            }
            TableName::Options => {
                let $table = &$tables.options;
                $body
            }
            TableName::Faqs => {
                let $table = &$tables.faqs;
                $body
            }
            TableName::Admins => {
                let $table = &$tables.admins;
                $body
            }
        }
    };
}

/// Arguments for `list`.
#[derive(Debug, Clone, Args)]
pub(crate) struct ListArgs {
    /// Table to read.
    pub(crate) table: TableName,
    /// Equality filter as `field=value`; repeat to combine.
    #[arg(long = "where", value_name = "field=value")]
    pub(crate) conditions: Vec<Condition>,
    /// Ordering as `field` or `field:desc`.
    #[arg(long = "order-by", value_name = "field[:asc|desc]")]
    pub(crate) order_by: Option<OrderBy>,
    /// Relation to attach; repeat for several.
    #[arg(long = "include", value_name = "relation")]
    pub(crate) include: Vec<Relation>,
}

/// Arguments for `get`.
#[derive(Debug, Clone, Args)]
pub(crate) struct GetArgs {
    /// Table to read.
    pub(crate) table: TableName,
    /// Record id.
    #[arg(required_unless_present = "email")]
    pub(crate) id: Option<String>,
    /// Look an admin up by email instead of id.
    #[arg(long, conflicts_with = "id")]
    pub(crate) email: Option<String>,
    /// Relation to attach; repeat for several.
    #[arg(long = "include", value_name = "relation")]
    pub(crate) include: Vec<Relation>,
}

/// Arguments for `count`.
#[derive(Debug, Clone, Args)]
pub(crate) struct CountArgs {
    /// Table to count.
    pub(crate) table: TableName,
    /// Equality filter as `field=value`; repeat to combine.
    #[arg(long = "where", value_name = "field=value")]
    pub(crate) conditions: Vec<Condition>,
}

/// Arguments for `create`.
#[derive(Debug, Clone, Args)]
pub(crate) struct CreateArgs {
    /// Table to write.
    pub(crate) table: TableName,
    /// Record fields as a JSON object (camelCase names).
    pub(crate) payload: String,
}

/// Arguments for `update`.
#[derive(Debug, Clone, Args)]
pub(crate) struct UpdateArgs {
    /// Table to write.
    pub(crate) table: TableName,
    /// Record id.
    pub(crate) id: String,
    /// Fields to change as a JSON object; `null` clears a nullable field.
    pub(crate) payload: String,
}

/// Arguments for `delete`.
#[derive(Debug, Clone, Args)]
pub(crate) struct DeleteArgs {
    /// Table to write.
    pub(crate) table: TableName,
    /// Record id.
    pub(crate) id: String,
}

/// Arguments for `move`.
#[derive(Debug, Clone, Args)]
pub(crate) struct MoveArgs {
    /// Table to reorder.
    pub(crate) table: TableName,
    /// Record id.
    pub(crate) id: String,
    /// `up` or `down`.
    pub(crate) step: Step,
}

/// Arguments for `sync`.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Copy every table and settings document from one store to \
                 the other, replacing what the target holds. Use it to move \
                 the JSON files into the database or to take a local copy.",
    about = "Copy the catalog between stores"
)]
#[ortho_config(prefix = "CARLEASE")]
pub(crate) struct SyncArgs {
    /// Store to read from: `file` or `database`.
    #[arg(long = ARG_SYNC_FROM, value_name = "mode")]
    #[serde(default)]
    pub(crate) from: Option<DataSource>,
    /// Store to replace: `file` or `database`.
    #[arg(long = ARG_SYNC_TO, value_name = "mode")]
    #[serde(default)]
    pub(crate) to: Option<DataSource>,
}

/// Resolved `sync` direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncPlan {
    pub(crate) from: DataSource,
    pub(crate) to: DataSource,
}

impl SyncArgs {
    fn into_plan(self) -> Result<SyncPlan, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SyncPlan::try_from(merged)
    }
}

impl TryFrom<SyncArgs> for SyncPlan {
    type Error = CliError;

    fn try_from(args: SyncArgs) -> Result<Self, Self::Error> {
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_SYNC_FROM,
            env: ENV_SYNC_FROM,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_SYNC_TO,
            env: ENV_SYNC_TO,
        })?;
        if from == to {
            return Err(CliError::SameSource { store: from });
        }
        Ok(Self { from, to })
    }
}

/// Arguments for `settings`.
#[derive(Debug, Clone, Args)]
pub(crate) struct SettingsArgs {
    /// Setting to show or change; omit to show every setting.
    pub(crate) key: Option<String>,
    /// New value for `key`.
    pub(crate) value: Option<String>,
    /// Read the company details document instead of the site settings.
    #[arg(long)]
    pub(crate) company: bool,
    /// Remove `key` instead of showing it.
    #[arg(long, requires = "key", conflicts_with = "value")]
    pub(crate) remove: bool,
}

fn open_tables(config: &StoreConfig) -> Result<Tables, CliError> {
    Ok(Tables::new(open_store(config)?))
}

fn filter_from(conditions: &[Condition]) -> Filter {
    conditions.iter().cloned().collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, CliError> {
    serde_json::to_value(value).map_err(CliError::SerializeOutput)
}

fn decode<T: serde::de::DeserializeOwned>(table: TableName, payload: &str) -> Result<T, CliError> {
    serde_json::from_str(payload).map_err(|source| CliError::InvalidPayload { table, source })
}

pub(crate) fn list(
    config: &StoreConfig,
    args: &ListArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let tables = open_tables(config)?;
    let mut query = FindMany::new().with_filter(filter_from(&args.conditions));
    if let Some(order_by) = &args.order_by {
        query = query.ordered_by(order_by.clone());
    }
    for relation in &args.include {
        query = query.including(*relation);
    }
    let records = with_table!(tables, args.table, |table| to_json(&table.find_many(&query)?)?);
    write_json(writer, &records)
}

pub(crate) fn get(
    config: &StoreConfig,
    args: &GetArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let (key, shown) = match (&args.email, &args.id) {
        (Some(email), _) => (UniqueKey::new("email", email.as_str()), email.clone()),
        (None, Some(id)) => (UniqueKey::id(id.as_str()), id.clone()),
        (None, None) => return Err(CliError::MissingKey),
    };
    let tables = open_tables(config)?;
    let record = with_table!(tables, args.table, |table| {
        to_json(&table.find_unique_with(&key, &args.include)?)?
    });
    if record.is_null() {
        return Err(CliError::NotFound {
            table: args.table,
            key: shown,
        });
    }
    write_json(writer, &record)
}

pub(crate) fn count(
    config: &StoreConfig,
    args: &CountArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let tables = open_tables(config)?;
    let filter = filter_from(&args.conditions);
    let total = with_table!(tables, args.table, |table| table.count(&filter)?);
    write_json(writer, &json!({ "count": total }))
}

pub(crate) fn create(
    config: &StoreConfig,
    args: &CreateArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let tables = open_tables(config)?;
    let created = with_table!(tables, args.table, |table| {
        let draft = decode(args.table, &args.payload)?;
        to_json(&table.create(draft)?)?
    });
    write_json(writer, &created)
}

pub(crate) fn update(
    config: &StoreConfig,
    args: &UpdateArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let tables = open_tables(config)?;
    let updated = with_table!(tables, args.table, |table| {
        let patch = decode(args.table, &args.payload)?;
        to_json(&table.update(&args.id, &patch)?)?
    });
    if updated.is_null() {
        return Err(CliError::NotFound {
            table: args.table,
            key: args.id.clone(),
        });
    }
    write_json(writer, &updated)
}

/// Deletes through the catalog so brands in use are kept and vehicles take
/// their parts with them.
pub(crate) fn delete(
    config: &StoreConfig,
    args: &DeleteArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let catalog = Catalog::new(open_tables(config)?);
    let deleted = match args.table {
        TableName::Brands => catalog.delete_brand(&args.id)?,
        TableName::Vehicles => catalog.delete_vehicle(&args.id)?,
        other => with_table!(catalog.tables(), other, |table| table.delete(&args.id)?),
    };
    write_json(writer, &json!({ "deleted": deleted }))
}

pub(crate) fn move_record(
    config: &StoreConfig,
    args: &MoveArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let catalog = Catalog::new(open_tables(config)?);
    let tables = catalog.tables();
    let id = args.id.as_str();
    let moved = match args.table {
        TableName::Brands => catalog.move_record(&tables.brands, id, args.step)?,
        TableName::Vehicles => catalog.move_record(&tables.vehicles, id, args.step)?,
        TableName::Trims => catalog.move_record(&tables.trims, id, args.step)?,
        TableName::Colors => catalog.move_record(&tables.colors, id, args.step)?,
        TableName::Options => catalog.move_record(&tables.options, id, args.step)?,
        TableName::Faqs => catalog.move_record(&tables.faqs, id, args.step)?,
        TableName::Admins => return Err(CliError::NotOrdered { table: args.table }),
    };
    write_json(writer, &json!({ "moved": moved }))
}

pub(crate) fn sync(
    config: &StoreConfig,
    args: SyncArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let plan = args.into_plan()?;
    let from = open_backend(config, plan.from)?;
    let to = open_backend(config, plan.to)?;
    let report = sync_tables(from.as_ref(), to.as_ref())?;
    write_json(writer, &report)
}

pub(crate) fn settings(
    config: &StoreConfig,
    args: &SettingsArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let tables = open_tables(config)?;
    let name = if args.company {
        MapName::CompanyInfo
    } else {
        MapName::Settings
    };
    let document = tables.key_values(name);
    match (&args.key, &args.value) {
        (Some(key), _) if args.remove => {
            let removed = document.remove(key)?;
            write_json(writer, &json!({ "removed": removed }))
        }
        (Some(key), Some(value)) => {
            document.set(key, value)?;
            write_json(writer, &document.all()?)
        }
        (Some(key), None) => write_json(writer, &document.get(key)?),
        (None, _) => write_json(writer, &document.all()?),
    }
}

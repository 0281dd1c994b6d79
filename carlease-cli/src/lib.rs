//! Command-line interface for the car lease catalog.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use carlease_data::{DataSource, StoreConfig};

mod commands;
mod error;

pub use error::CliError;

use commands::{
    CountArgs, CreateArgs, DeleteArgs, GetArgs, ListArgs, MoveArgs, SettingsArgs, SyncArgs,
    UpdateArgs,
};

const ARG_DATA_DIR: &str = "data-dir";
const ARG_DATABASE: &str = "database";
const ARG_MODE: &str = "mode";
const ARG_SYNC_FROM: &str = "from";
const ARG_SYNC_TO: &str = "to";
const ENV_SYNC_FROM: &str = "CARLEASE_CMDS_SYNC_FROM";
const ENV_SYNC_TO: &str = "CARLEASE_CMDS_SYNC_TO";

/// Run the carlease CLI with the current process arguments and environment,
/// writing results to stdout.
///
/// # Errors
///
/// Returns any parsing, configuration, store or output failure.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

fn run_with(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = cli.store.into_config()?;
    match cli.command {
        Command::List(args) => commands::list(&config, &args, writer),
        Command::Get(args) => commands::get(&config, &args, writer),
        Command::Count(args) => commands::count(&config, &args, writer),
        Command::Create(args) => commands::create(&config, &args, writer),
        Command::Update(args) => commands::update(&config, &args, writer),
        Command::Delete(args) => commands::delete(&config, &args, writer),
        Command::Move(args) => commands::move_record(&config, &args, writer),
        Command::Sync(args) => commands::sync(&config, args, writer),
        Command::Settings(args) => commands::settings(&config, &args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "carlease",
    about = "Query and maintain the car lease catalog data",
    version
)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List records, optionally filtered, ordered and with relations.
    List(ListArgs),
    /// Show one record by id (or an admin by email).
    Get(GetArgs),
    /// Count records matching the filters.
    Count(CountArgs),
    /// Create a record from a JSON payload.
    Create(CreateArgs),
    /// Apply a partial JSON update to a record.
    Update(UpdateArgs),
    /// Delete a record.
    Delete(DeleteArgs),
    /// Move a record one place up or down in display order.
    Move(MoveArgs),
    /// Copy every table from one store to the other.
    Sync(SyncArgs),
    /// Show or change site settings.
    Settings(SettingsArgs),
}

/// Options selecting the backing store, shared by every command.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "store", about = "Select the catalog store")]
#[ortho_config(prefix = "CARLEASE")]
struct StoreArgs {
    /// Directory holding the JSON table files.
    #[arg(long = ARG_DATA_DIR, value_name = "dir", global = true)]
    #[serde(default)]
    data_dir: Option<Utf8PathBuf>,
    /// SQLite database file (defaults to `carlease.db` in the data directory).
    #[arg(long = ARG_DATABASE, value_name = "path", global = true)]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Which store serves the catalog: `file` or `database`.
    #[arg(long = ARG_MODE, value_name = "mode", global = true)]
    #[serde(default)]
    mode: Option<DataSource>,
    /// In database mode, do not fall back to the JSON files when a read fails.
    #[arg(long, global = true)]
    #[serde(default)]
    no_fallback: bool,
}

impl StoreArgs {
    fn into_config(self) -> Result<StoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(StoreConfig::from(merged))
    }
}

impl From<StoreArgs> for StoreConfig {
    fn from(args: StoreArgs) -> Self {
        let base = args.data_dir.map_or_else(Self::default, Self::new);
        Self {
            source: args.mode.unwrap_or_default(),
            database: args.database.unwrap_or(base.database),
            data_dir: base.data_dir,
            fallback_to_files: !args.no_fallback,
        }
    }
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;

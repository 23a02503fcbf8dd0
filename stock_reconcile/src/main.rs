//! Stock Reconcile - command-line front end
//!
//! Runs one reconciliation request against the local inventory database and
//! prints the result as JSON.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use stock_reconcile::io::{read_import_csv, read_want_list};
use stock_reconcile::pagination::START_CURSOR;
use stock_reconcile::{
    CardFilter, ImportLine, InventoryService, ReconcileError, Result, SqliteStore,
};

/// MTG inventory reconciliation against a SQLite stock database
#[derive(Parser, Debug)]
#[command(name = "stock_reconcile")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a want-list ("<qty> <name>" per line) against stock
    WantList { file: PathBuf },
    /// Insert the new entries of an import CSV
    Import { file: PathBuf },
    /// Import, prune and deduplicate against a canonical CSV
    Sync { file: PathBuf },
    /// Remove rows the canonical CSV no longer reflects
    Prune {
        file: PathBuf,
        /// Only list the stale rows
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Remove redundant duplicate rows
    Dedupe {
        /// Only list the duplicates
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// List one page of the inventory
    List {
        /// Last id of the previous page (0 to start)
        #[arg(long, default_value_t = START_CURSOR)]
        cursor: i64,
        #[arg(long, default_value_t = 50)]
        page_size: usize,
        /// Case-insensitive name substring
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color_identity: Option<String>,
        #[arg(long)]
        type_line: Option<String>,
        #[arg(long)]
        commander: Option<bool>,
        #[arg(long)]
        cmc: Option<f64>,
    },
    /// List rows still waiting for card catalog data
    Unsynced,
}

/// Returns the default database path: ~/.local/share/stock_reconcile/inventory.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stock_reconcile")
        .join("inventory.db")
        .to_string_lossy()
        .to_string()
}

fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=stock_reconcile=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let db_path = PathBuf::from(&args.database);
    ensure_parent_dir(&db_path)?;
    let mut service = InventoryService::new(SqliteStore::open(&db_path)?);

    match args.command {
        Command::WantList { file } => {
            let wants = read_want_list(&file)?;
            print_json(&service.compare_want_list(Some(wants.as_slice()))?)
        }
        Command::Import { file } => {
            let batch = read_import_csv(&file)?;
            print_json(&service.import(&batch)?)
        }
        Command::Sync { file } => {
            let canonical = require_entries(read_import_csv(&file)?, &file)?;
            print_json(&service.sync_canonical(&canonical)?)
        }
        Command::Prune { file, dry_run } => {
            let canonical = read_import_csv(&file)?;
            if dry_run {
                print_json(&service.stale(&canonical)?)
            } else {
                let canonical = require_entries(canonical, &file)?;
                print_json(&service.prune(&canonical)?)
            }
        }
        Command::Dedupe { dry_run } => {
            if dry_run {
                print_json(&service.duplicates()?)
            } else {
                print_json(&service.deduplicate()?)
            }
        }
        Command::List {
            cursor,
            page_size,
            name,
            color_identity,
            type_line,
            commander,
            cmc,
        } => {
            let filter = CardFilter {
                name,
                color_identity,
                type_line,
                is_commander: commander,
                cmc,
            };
            print_json(&service.list(cursor, page_size, &filter)?)
        }
        Command::Unsynced => print_json(&service.unsynced()?),
    }
}

/// Refuses an empty canonical import, which would prune the whole inventory.
fn require_entries(canonical: Vec<ImportLine>, file: &Path) -> Result<Vec<ImportLine>> {
    if canonical.is_empty() {
        return Err(ReconcileError::InvalidInput(format!(
            "{} contains no import entries",
            file.display()
        )));
    }
    Ok(canonical)
}

fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            log::info!("Created directory: {}", parent.display());
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, StorageBackend, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{
    AddArgs, ClearArgs, DeleteArgs, EditArgs, ExportArgs, ImportArgs, ListArgs, RangeArgs,
    SeedArgs, StatsArgs, TimelineArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "sleeplog",
    version,
    about = "Sleep journal that groups entries by night (20:00 to 20:00)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over SLEEPLOG_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over SLEEPLOG_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep entries in memory only; nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a sleep period
    Add(AddArgs),
    /// Change fields of an existing entry
    Edit(EditArgs),
    /// Remove an entry
    Delete(DeleteArgs),
    /// Show entries grouped by night, most recent first (default)
    List(ListArgs),
    /// Show entries whose recorded date lies in a range
    Range(RangeArgs),
    /// Daily totals, moving average and distributions
    Stats(StatsArgs),
    /// Sleep periods per night on a 20:00 to 20:00 axis
    Timeline(TimelineArgs),
    /// Insert generated sample entries
    Seed(SeedArgs),
    /// Delete every entry
    Clear(ClearArgs),
    /// Write all entries as JSON
    Export(ExportArgs),
    /// Load entries from a JSON export
    Import(ImportArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let paths = loader.paths().clone();
    let mut config = loader.load_or_init()?;
    if cli.ephemeral {
        config.storage.backend = StorageBackend::Memory;
    }
    let store = storage::init(&paths, &config.storage)?;

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::List(ListArgs::default()));
    match command {
        Commands::Add(args) => commands::add_entry(&config, store.as_ref(), args),
        Commands::Edit(args) => commands::edit_entry(&config, store.as_ref(), args),
        Commands::Delete(args) => commands::delete_entry(store.as_ref(), args),
        Commands::List(args) => commands::list_nights(&config, store.as_ref(), args),
        Commands::Range(args) => commands::list_range(&config, store.as_ref(), args),
        Commands::Stats(args) => commands::show_stats(&config, store.as_ref(), args),
        Commands::Timeline(args) => commands::show_timeline(&config, store.as_ref(), args),
        Commands::Seed(args) => commands::seed_entries(store.as_ref(), args),
        Commands::Clear(args) => commands::clear_entries(store.as_ref(), args),
        Commands::Export(args) => commands::export_entries(store.as_ref(), args),
        Commands::Import(args) => commands::import_entries(store.as_ref(), args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}

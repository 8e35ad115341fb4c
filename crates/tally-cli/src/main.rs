use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{entries, queries, records, sync};
use tally_cli::{Cli, Commands, Config};
use tally_core::TimeEntryService;
use tally_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    config.validate()?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (db, config) = open_database(cli.config.as_deref())?;
    let mut service = TimeEntryService::new(db).with_config(config.engine);
    let now = Utc::now();
    let mut stdout = io::stdout().lock();
    let out = &mut stdout;

    match command {
        Commands::Create(args) => entries::create(out, &mut service, args, &config, now)?,
        Commands::Start(args) => entries::start(out, &mut service, args, &config, now)?,
        Commands::Stop(args) => entries::stop(out, &mut service, args, &config, now)?,
        Commands::Update(args) => entries::update(out, &mut service, args, &config, now)?,
        Commands::Delete(args) => entries::delete(out, &mut service, args, &config, now)?,
        Commands::Tag(args) => entries::tag(out, &mut service, args, &config, now)?,
        Commands::Show(args) => queries::show(out, &service, args, &config)?,
        Commands::Running(args) => queries::running(out, &service, args, &config)?,
        Commands::Range(args) => queries::range(out, &service, args, &config, now)?,
        Commands::Dash(args) => queries::dash(out, &service, *args, &config, now)?,
        Commands::Sync(target) => sync::run(out, &mut service, target, now)?,
        Commands::Tasks(action) => {
            records::tasks(out, service.store_mut(), action, &config, now)?;
        }
        Commands::Projects(action) => {
            records::projects(out, service.store_mut(), action, &config, now)?;
        }
    }

    stdout.flush()?;
    Ok(())
}

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{admin, entry, export, group, period, report, task, timer};
use att_cli::{Cli, Commands, Config};
use att_core::Tracker;
use att_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

fn open_tracker(config: &Config) -> Result<Tracker<Database>> {
    let db = open_database(config)?;
    Tracker::with_system_clock(db).context("failed to recover timer state")
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
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Group(action) => group::run(&mut out, &open_tracker(&config)?, action)?,
        Commands::Task(action) => task::run(&mut out, &open_tracker(&config)?, action)?,
        Commands::Period(action) => period::run(&mut out, &open_tracker(&config)?, action)?,
        Commands::Entry(action) => entry::run(&mut out, &open_tracker(&config)?, action)?,
        Commands::Start { task_id } => timer::start(&mut out, &open_tracker(&config)?, *task_id)?,
        Commands::Stop { note } => timer::stop(&mut out, &open_tracker(&config)?, note.as_deref())?,
        Commands::Toggle { task_id, note } => {
            timer::toggle(&mut out, &open_tracker(&config)?, *task_id, note.as_deref())?;
        }
        Commands::Status => timer::status(&mut out, &open_tracker(&config)?)?,
        Commands::Report(args) => report::run(&mut out, &open_tracker(&config)?, args)?,
        Commands::Export { path } => export::run(&mut out, &open_tracker(&config)?, path)?,
        Commands::Backup => {
            let db = open_database(&config)?;
            admin::backup(&mut out, &db, &config)?;
        }
        // Restore must run without a handle on the live database.
        Commands::Restore { file } => admin::restore(&mut out, file, &config)?,
    }

    out.flush()?;
    Ok(())
}

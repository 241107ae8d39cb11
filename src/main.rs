//! # todo - Terminal To-do List
//!
//! A single-user to-do list with an interactive terminal user interface.
//!
//! ## Key Features
//!
//! - **Task list**: name, description, completion state, priority and country per task,
//!   with colour-coded priorities and a done/not-done marker
//! - **Add and edit forms**: edits go to a working copy and reach the list only on save
//! - **Country selector**: the list of countries is fetched from a remote endpoint each
//!   time a form opens, without blocking the interface
//! - **Filter**: show all tasks, only finished ones or only open ones
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch with the three sample tasks
//! todo
//!
//! # Start empty, showing open tasks, with debug logs
//! todo --no-seed --filter not-done -v
//!
//! # Point the country selector at another endpoint
//! TODO_COUNTRY_URL=http://localhost:8080/api/getLands todo
//! ```
//!
//! Tasks are kept in memory for the session only. Logs go to `todo.log` in the
//! system temp directory unless `--log-file` is given.

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod cli;
pub mod country;
pub mod error;
pub mod fields;
pub mod filter;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod countries;
    pub mod detail;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::{Cli, Config};
use error::AppError;
use store::TaskStore;
use tui::{app::App, countries::CountryLoader, run::run_tui};

/// Route `tracing` output to the log file. `RUST_LOG` overrides the default level.
fn init_logging(config: &Config) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| AppError::Logging(format!("{}: {e}", config.log_file.display())))?;

    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if config.verbose {
        EnvFilter::new("todo=debug,warn")
    } else {
        EnvFilter::new("todo=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

fn run(config: Config) -> Result<(), AppError> {
    init_logging(&config)?;
    info!(url = %config.country_url, filter = config.filter.label(), seed = config.seed, "starting");

    let runtime = Runtime::new().map_err(AppError::Runtime)?;
    let loader = CountryLoader::new(runtime.handle().clone(), &config.country_url, config.timeout);
    let store = if config.seed {
        TaskStore::seeded()
    } else {
        TaskStore::new()
    };

    let mut app = App::new(store, loader, config.filter);
    run_tui(&mut app)?;

    info!(tasks = app.store().len(), "exiting");
    Ok(())
}

fn main() {
    let config = Config::from_cli(Cli::parse());
    if let Err(e) = run(config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

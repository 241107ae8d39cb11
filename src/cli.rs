use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::{country::DEFAULT_COUNTRY_URL, fields::TaskFilter};

pub const DEFAULT_LOG_FILE: &str = "todo.log";

/// Single-user terminal to-do list.
/// Tasks live in memory for the session; the country list is fetched on demand.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Terminal to-do list")]
pub struct Cli {
    /// Endpoint serving the country list.
    #[arg(long, env = "TODO_COUNTRY_URL", default_value = DEFAULT_COUNTRY_URL)]
    pub country_url: String,

    /// Request timeout for the country lookup, in seconds.
    #[arg(long, env = "TODO_HTTP_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Filter applied to the list at startup.
    #[arg(long, value_enum, default_value_t = TaskFilter::All)]
    pub filter: TaskFilter,

    /// Start with an empty list instead of the three sample tasks.
    #[arg(long)]
    pub no_seed: bool,

    /// Log file. The terminal is owned by the UI, so logs never go to stdout.
    #[arg(long, env = "TODO_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Runtime settings resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub country_url: String,
    pub timeout: Option<Duration>,
    pub filter: TaskFilter,
    pub seed: bool,
    pub log_file: PathBuf,
    pub verbose: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        Config {
            country_url: cli.country_url,
            timeout: cli.timeout_secs.filter(|&s| s > 0).map(Duration::from_secs),
            filter: cli.filter,
            seed: !cli.no_seed,
            log_file: cli
                .log_file
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_FILE)),
            verbose: cli.verbose,
        }
    }
}

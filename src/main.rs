use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use suimon::config::{Network, SuimonConfig};
use suimon::monitor::{run_dynamic, run_static};
use suimon::ui::Theme;
use suimon::TableType;

#[derive(Parser, Debug)]
#[command(name = "suimon")]
#[command(about = "Monitor Sui nodes, validators, RPC endpoints and peers")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the config file (defaults to $SUIMON_CONFIG_PATH or ~/.suimon/suimon.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network whose public RPC endpoint is used when no RPC hosts are configured
    #[arg(short, long, global = true, value_enum)]
    network: Option<Network>,

    /// Log filter, e.g. "info" or "suimon=debug" (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Write logs to this file (the dashboard logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every host once and print tables
    Static {
        /// Tables to print, in order (defaults to the ones enabled in the config)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        tables: Vec<TableType>,
    },
    /// Live dashboard of the configured node
    Dynamic,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dashboard = matches!(args.command, Command::Dynamic);
    init_logging(&args.log_level, args.log_file.as_ref(), dashboard)?;

    let config = SuimonConfig::load(args.config.as_deref())?.with_network(args.network);
    let theme = Theme::auto_detect();

    match args.command {
        Command::Static { tables } => {
            let tables = if tables.is_empty() {
                config.monitors.enabled_tables()
            } else {
                tables
            };
            run_static(&config, &tables, theme)
        }
        Command::Dynamic => run_dynamic(&config, theme),
    }
}

/// Static reports log to stderr; the dashboard owns the terminal, so it only
/// logs to a file.
fn init_logging(level: &str, file: Option<&PathBuf>, dashboard: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if !dashboard => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }

    Ok(())
}

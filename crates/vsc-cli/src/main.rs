//! VSC CLI
//!
//! Command-line client that pushes the current directory tree to a
//! file-storage server, pulls trees back, and lists what is stored.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vsc_core::{Config, ConfigError, ErrorCategory, SyncError, TransferError};

mod commands;
mod output;

use output::{Output, OutputFormat};

/// Bad arguments, unknown command, missing configuration
const EXIT_USAGE: u8 = 1;
/// Network, transfer or filesystem failure
const EXIT_FAILURE: u8 = 2;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "VSC_LOG";

#[derive(Parser)]
#[command(name = "vsc")]
#[command(about = "VSC - push and pull directory trees to a file-storage server")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// File holding the server address (default: ./address.txt)
    #[arg(long, global = true, value_name = "PATH")]
    address_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the address of the server to send data to
    Set {
        /// Server host, e.g. example.com:8080
        address: String,
    },
    /// Send the current folder to the server
    Push {
        /// Stop at the first directory that fails to send
        #[arg(long)]
        fail_fast: bool,
    },
    /// Get the specified folder from the server into the current folder
    Pull {
        /// Name of the folder on the server
        name: String,
    },
    /// Get the names of all folders stored on the server
    All,
    /// Show the available commands
    Info,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    init_logging(cli.verbose);
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let Some(command) = cli.command else {
        output.error(
            "You didn't specify the command",
            Some("Try `vsc info` to see the available commands"),
        );
        return ExitCode::from(EXIT_USAGE);
    };

    match run(command, cli.address_file, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e), recovery_suggestion(&e));
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(command: Commands, address_file: Option<PathBuf>, output: &Output) -> Result<()> {
    match command {
        Commands::Info => {
            commands::info::info();
            Ok(())
        }
        Commands::Set { address } => {
            let config = load_config(address_file)?;
            commands::set::set(&config, &address, output)
        }
        Commands::Push { fail_fast } => {
            let config = load_config(address_file)?;
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            commands::push::push(&config, &cwd, fail_fast, output).await
        }
        Commands::Pull { name } => {
            let config = load_config(address_file)?;
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            commands::pull::pull(&config, &name, &cwd, output).await
        }
        Commands::All => commands::list::all(&load_config(address_file)?, output).await,
    }
}

/// Environment overrides first, then `--address-file` on top
fn load_config(address_file: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(path) = address_file {
        config = config.with_address_file(path);
    }
    tracing::debug!("Using address file {:?}", config.address_file);
    Ok(config)
}

/// Category of the first typed error in the chain
fn category(err: &anyhow::Error) -> Option<ErrorCategory> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SyncError>() {
            Some(e.category())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.category())
        } else {
            cause.downcast_ref::<TransferError>().map(|e| e.category())
        }
    })
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match category(err) {
        Some(ErrorCategory::Usage) => EXIT_USAGE,
        Some(ErrorCategory::Transfer) | Some(ErrorCategory::Filesystem) | None => EXIT_FAILURE,
    }
}

fn recovery_suggestion(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SyncError>() {
            e.recovery_suggestion()
        } else {
            cause
                .downcast_ref::<ConfigError>()
                .and_then(|e| e.recovery_suggestion())
        }
    })
}

/// Log level for a `-v` count
fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `VSC_LOG` takes precedence over `-v`
fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = log_level(verbosity);
        EnvFilter::new(format!("vsc_core={},vsc_cli={}", level, level))
    })
}

/// Initialize stderr logging
fn init_logging(verbosity: u8) {
    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

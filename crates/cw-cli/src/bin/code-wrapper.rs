//! Code wrapper CLI binary
//!
//! Extracts structural declarations from Go package units and turns them into
//! binding descriptors for target-language emitters.
//!
//! # Usage
//!
//! ```bash
//! # Binding descriptors for one or more files
//! code-wrapper extract shapes.go --output shapes.json
//!
//! # Diagnostics only
//! code-wrapper check src/*.go
//!
//! # Definition or doc comment of one declaration
//! code-wrapper lookup code.go Struct1.method1 --docs
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use cw_cli::{
    commands::{self, check::CheckArgs, extract::ExtractArgs, lookup::LookupArgs},
    config::WrapperConfig,
    diagnostics::setup_error_reporting,
    Result,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "code-wrapper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract Go declarations into binding descriptors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit binding descriptors as JSON
    Extract(ExtractArgs),

    /// Report diagnostics without emitting descriptors
    Check(CheckArgs),

    /// Print the definition or documentation of a declaration
    Lookup(LookupArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    setup_error_reporting()?;
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(cw_cli::CliError::Io)?;
    }

    let config = WrapperConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract(args) => commands::extract_command(args, &config),
        Commands::Check(args) => commands::check_command(args, &config),
        Commands::Lookup(args) => commands::lookup_command(args, &config),
    }?;

    if cli.verbose > 0 {
        info!("Command completed successfully");
    }
    Ok(())
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let installed = match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .try_init()
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .try_init()
        }
    };
    installed.map_err(|e| cw_cli::CliError::Config(format!("Failed to set up logging: {}", e)))
}

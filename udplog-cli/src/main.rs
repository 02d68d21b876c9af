//! udplog: UDP log daemon and producer tools.
//!
//! # Usage
//!
//! ```text
//! udplog daemon [--bind ADDR] [--store PATH] [--headless]
//! udplog dump [--store PATH] [--min-level LEVEL] [--no-color]
//! udplog emit --level LEVEL [--program P] [--function F] [--line N] MESSAGE
//! ```
//!
//! Every subcommand reads `--config <file>` (or `UDPLOG_CONFIG`), falling
//! back to `<config_dir>/udplog/config.yaml`; flags override file values.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{daemon::DaemonArgs, dump::DumpArgs, emit::EmitArgs};
use udplog_core::config::load_config;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "udplog",
    version,
    about = "Collect log records over UDP and steer producer log levels",
    long_about = None,
)]
struct Cli {
    /// YAML config file with `daemon:` and `client:` sections.
    #[arg(long, global = true, env = "UDPLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Emit diagnostics as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the log daemon with the interactive operator menu.
    Daemon(DaemonArgs),

    /// Print the log store.
    Dump(DumpArgs),

    /// Send log records as a producer.
    Emit(EmitArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    udplog_daemon::init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref()).context("failed to load udplog config")?;
    match cli.command {
        Commands::Daemon(args) => args.run(config.daemon),
        Commands::Dump(args) => args.run(config.daemon),
        Commands::Emit(args) => args.run(config.client),
    }
}

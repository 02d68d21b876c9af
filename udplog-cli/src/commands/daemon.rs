//! `udplog daemon`: run the collector and its operator menu.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use udplog_core::{DaemonConfig, LogLevel};
use udplog_daemon::{Daemon, DaemonError};

use super::{block_on, dump::print_lines, interrupt_signal};

#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Listening endpoint.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Log store file.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Receive timeout in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Skip the menu and run until Ctrl-C.
    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    SetLevel,
    DumpLog,
    Status,
    ShutDown,
}

impl MenuChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::SetLevel),
            "2" => Some(MenuChoice::DumpLog),
            "3" => Some(MenuChoice::Status),
            "0" => Some(MenuChoice::ShutDown),
            _ => None,
        }
    }
}

type OperatorInput = Lines<BufReader<Stdin>>;

impl DaemonArgs {
    pub fn run(self, mut config: DaemonConfig) -> Result<()> {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(store) = self.store {
            config.store_path = store;
        }
        if let Some(poll) = self.poll_interval_ms {
            config.poll_interval_ms = poll;
        }
        block_on(serve(config, self.headless))?
    }
}

async fn serve(config: DaemonConfig, headless: bool) -> Result<()> {
    let daemon = Daemon::start(config)
        .await
        .context("log server: cannot start daemon")?;
    let mut interrupt = interrupt_signal();

    let outcome = if headless {
        let _ = interrupt.recv().await;
        Ok(())
    } else {
        operator_menu(&daemon, &mut interrupt).await
    };

    daemon
        .shutdown()
        .await
        .context("log server: shutdown failed")?;
    outcome
}

async fn operator_menu(daemon: &Daemon, interrupt: &mut broadcast::Receiver<()>) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_main_menu();
        let Some(line) = next_input(&mut input, interrupt).await? else {
            break;
        };

        match MenuChoice::parse(&line) {
            Some(MenuChoice::SetLevel) => {
                print_severity_menu();
                let Some(line) = next_input(&mut input, interrupt).await? else {
                    break;
                };
                let Some(level) = parse_severity(&line) else {
                    println!("ERROR: Please enter a valid numerical option");
                    continue;
                };
                match daemon.set_level(level).await {
                    Ok(peer) => println!("Log level set to {level} for {peer}"),
                    Err(DaemonError::NoPeer) => {
                        println!("No producer has sent a log record yet; level not sent")
                    }
                    Err(err) => return Err(err).context("log server: cannot send log level"),
                }
            }
            Some(MenuChoice::DumpLog) => {
                let lines = daemon
                    .dump()
                    .await
                    .context("log server: cannot read log file")?;
                print_lines(&lines, None);
            }
            Some(MenuChoice::Status) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&daemon.stats())
                        .context("failed to render daemon status JSON")?
                );
            }
            Some(MenuChoice::ShutDown) => break,
            None => println!("ERROR: Please enter a valid numerical option"),
        }
    }

    Ok(())
}

/// Next operator line; `None` on Ctrl-C or end of input.
async fn next_input(
    input: &mut OperatorInput,
    interrupt: &mut broadcast::Receiver<()>,
) -> Result<Option<String>> {
    tokio::select! {
        _ = interrupt.recv() => Ok(None),
        line = input.next_line() => line.context("failed to read operator input"),
    }
}

fn parse_severity(input: &str) -> Option<LogLevel> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(LogLevel::from_menu_choice)
}

fn print_main_menu() {
    println!();
    println!("___________________LOG SERVER___________________");
    println!("Please enter a number to select an option");
    println!();
    println!("1 - Set log level");
    println!("2 - Dump log file");
    println!("3 - Show status");
    println!("0 - Shut down");
}

fn print_severity_menu() {
    println!("_____________________SET SEVERITY___________________");
    println!("Please enter a number to set log severity level");
    println!();
    println!("1 - Debug");
    println!("2 - Warning");
    println!("3 - Error");
    println!("4 - Critical");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_choices() {
        assert_eq!(MenuChoice::parse("1\n"), Some(MenuChoice::SetLevel));
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::DumpLog));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Status));
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::ShutDown));
        assert_eq!(MenuChoice::parse("4"), None);
        assert_eq!(MenuChoice::parse("shutdown"), None);
    }

    #[test]
    fn severity_choices_map_to_wire_levels() {
        assert_eq!(parse_severity("1"), Some(LogLevel::Debug));
        assert_eq!(parse_severity("3"), Some(LogLevel::Error));
        assert_eq!(parse_severity("4"), Some(LogLevel::Critical));
        assert_eq!(parse_severity("0"), None);
        assert_eq!(parse_severity("x"), None);
    }
}

//! `udplog dump`: pretty-print the log store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use udplog_core::{DaemonConfig, LogLevel};

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Log store to read (defaults to the daemon's configured store).
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Only print records at or above this level.
    #[arg(long)]
    pub min_level: Option<LogLevel>,

    /// Disable coloured level tokens.
    #[arg(long)]
    pub no_color: bool,
}

impl DumpArgs {
    pub fn run(self, config: DaemonConfig) -> Result<()> {
        if self.no_color {
            colored::control::set_override(false);
        }
        let path = self.store.unwrap_or(config.store_path);
        let raw = std::fs::read(&path)
            .with_context(|| format!("cannot read log file {}", path.display()))?;
        let contents = String::from_utf8_lossy(&raw);
        let lines: Vec<&str> = contents.lines().collect();
        print_lines(&lines, self.min_level);
        Ok(())
    }
}

/// Print store lines, colouring the level token and applying an optional
/// minimum level. Lines without a recognizable level are always printed.
pub(crate) fn print_lines<S: AsRef<str>>(lines: &[S], min_level: Option<LogLevel>) {
    for line in lines {
        let line = line.as_ref();
        let level = line_level(line);
        if let (Some(min), Some(level)) = (min_level, level) {
            if level < min {
                continue;
            }
        }
        println!("{}", render_line(line, level));
    }
}

/// Level token of a stored record: the sixth whitespace-separated field,
/// after the five `ctime` fields.
pub(crate) fn line_level(line: &str) -> Option<LogLevel> {
    let token = line.split_whitespace().nth(5)?;
    LogLevel::ALL.into_iter().find(|level| level.as_str() == token)
}

fn render_line(line: &str, level: Option<LogLevel>) -> String {
    let Some(level) = level else {
        return line.to_string();
    };
    let token = level.as_str();
    let Some(at) = line.find(&format!(" {token} ")) else {
        return line.to_string();
    };
    let painted = match level {
        LogLevel::Debug => token.dimmed(),
        LogLevel::Warning => token.yellow(),
        LogLevel::Error => token.red(),
        LogLevel::Critical => token.red().bold(),
    };
    format!(
        "{} {} {}",
        &line[..at],
        painted,
        &line[at + token.len() + 2..]
    )
}

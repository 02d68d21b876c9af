//! `udplog emit`: act as a producer and send records to the daemon.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use udplog_client::Logger;
use udplog_core::{ClientConfig, LogLevel};

use super::{block_on, interrupt_signal};

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Record message.
    pub message: String,

    /// Record severity.
    #[arg(long, default_value_t = LogLevel::Debug)]
    pub level: LogLevel,

    /// Program name (defaults to the configured producer name).
    #[arg(long)]
    pub program: Option<String>,

    #[arg(long, default_value = "main")]
    pub function: String,

    #[arg(long, default_value_t = 0)]
    pub line: u32,

    /// Daemon endpoint.
    #[arg(long)]
    pub daemon: Option<SocketAddr>,

    /// Filter threshold before any control frame arrives.
    #[arg(long)]
    pub initial_level: Option<LogLevel>,

    /// Number of records to send.
    #[arg(long, default_value_t = 1)]
    pub count: u32,

    /// Pause between records.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

impl EmitArgs {
    pub fn run(self, mut config: ClientConfig) -> Result<()> {
        if let Some(program) = self.program.clone() {
            config.program = program;
        }
        if let Some(daemon) = self.daemon {
            config.daemon = daemon;
        }
        if let Some(level) = self.initial_level {
            config.initial_level = level;
        }
        block_on(self.send(config))?
    }

    async fn send(self, config: ClientConfig) -> Result<()> {
        let logger = Logger::start(config)
            .await
            .context("cannot start producer logger")?;
        let mut interrupt = interrupt_signal();
        let interval = Duration::from_millis(self.interval_ms);

        let mut sent = 0u32;
        for round in 0..self.count {
            if round > 0 {
                tokio::select! {
                    _ = interrupt.recv() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            if logger.log_here(self.level, &self.function, self.line, &self.message) {
                sent += 1;
            } else {
                tracing::debug!(level = %self.level, threshold = %logger.level(), "record not sent");
            }
        }

        logger.shutdown().await.context("producer shutdown failed")?;
        println!(
            "sent {sent} of {} record(s) to {} (level threshold {})",
            self.count,
            logger.daemon_addr(),
            logger.level()
        );
        Ok(())
    }
}

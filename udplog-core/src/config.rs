//! Daemon and client settings.
//!
//! Every field has a default, so an absent or partial YAML file is valid:
//!
//! ```yaml
//! daemon:
//!   bind: 0.0.0.0:42424
//!   store_path: ./log
//! client:
//!   daemon: 127.0.0.1:42424
//!   initial_level: warning
//! ```
//!
//! Resolution order for [`load_config`]: an explicit path (must exist), then
//! `<config_dir>/udplog/config.yaml` if present, then built-in defaults.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_MAX_FRAME;
use crate::error::CoreError;
use crate::level::LogLevel;

/// Well-known daemon port.
pub const DEFAULT_PORT: u16 = 42424;
pub const DEFAULT_STORE_PATH: &str = "./log";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Listening endpoint.
    pub bind: SocketAddr,
    /// Append-only log store.
    pub store_path: PathBuf,
    /// Receive timeout per iteration; also the shutdown latency bound.
    pub poll_interval_ms: u64,
    /// Receive window; longer datagrams are truncated.
    pub max_datagram: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_datagram: DEFAULT_MAX_FRAME,
        }
    }
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon endpoint records are sent to.
    pub daemon: SocketAddr,
    /// Local endpoint; ephemeral when unset.
    pub bind: Option<SocketAddr>,
    /// Program name stamped on records emitted through the macros.
    pub program: String,
    /// Filter threshold before the daemon sends any control frame.
    pub initial_level: LogLevel,
    pub poll_interval_ms: u64,
    /// Upper bound for one encoded record; the message is truncated to fit.
    pub max_frame: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            daemon: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            bind: None,
            program: default_program_name(),
            initial_level: LogLevel::Debug,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Local endpoint to bind: the configured one, or an ephemeral port on
    /// the unspecified address of the daemon's address family.
    pub fn bind_addr(&self) -> SocketAddr {
        match self.bind {
            Some(addr) => addr,
            None if self.daemon.is_ipv6() => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
            None => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        }
    }
}

/// File stem of the running executable, or `udplog`.
pub fn default_program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "udplog".to_string())
}

/// `<config_dir>/udplog/config.yaml`: pure, no I/O.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("udplog").join(CONFIG_FILE))
}

/// Load configuration following the resolution order described above.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, CoreError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        return load_config_at(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config_at(&path),
        _ => Ok(Config::default()),
    }
}

/// Parse the YAML file at `path`.
pub fn load_config_at(path: &Path) -> Result<Config, CoreError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

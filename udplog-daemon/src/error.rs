use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use udplog_core::{CoreError, LifecycleState};

/// Error surface for the daemon runtime, log store, and control surface.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot bind listening endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] CoreError),

    #[error("daemon is not running (state: {state})")]
    NotRunning { state: LifecycleState },

    #[error("no producer has sent a datagram yet; nowhere to send control command")]
    NoPeer,

    #[error("{task} task join failure: {reason}")]
    TaskJoin { task: &'static str, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

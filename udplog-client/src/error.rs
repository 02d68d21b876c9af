use std::net::SocketAddr;

use thiserror::Error;

use udplog_core::CoreError;

/// Errors surfaced by the producer-side library.
///
/// Sending a record never fails loudly; only setup and shutdown do.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot bind producer endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("producer socket error: {0}")]
    Socket(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] CoreError),

    #[error("{task} task join failure: {reason}")]
    TaskJoin { task: &'static str, reason: String },
}

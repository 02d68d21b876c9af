//! udplog daemon: UDP listening endpoint, receive loop, append-only store,
//! and the control surface used by the operator menu.

mod error;
mod receiver;
mod runtime;
pub mod store;

pub use error::DaemonError;
pub use runtime::{init_tracing, Daemon, DaemonStats};
pub use store::LogStore;

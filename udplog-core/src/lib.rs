//! udplog core library: levels, wire codec, lifecycle, configuration.
//!
//! - [`level`]: [`LogLevel`]
//! - [`codec`]: [`LogRecord`] and [`ControlCommand`] text frames
//! - [`lifecycle`]: start/stop state machine
//! - [`config`]: daemon and client settings, YAML loading
//! - [`error`]: [`CoreError`]

pub mod codec;
pub mod config;
pub mod error;
pub mod level;
pub mod lifecycle;

pub use codec::{ControlCommand, LogRecord};
pub use config::{ClientConfig, Config, DaemonConfig};
pub use error::CoreError;
pub use level::LogLevel;
pub use lifecycle::{Lifecycle, LifecycleState};

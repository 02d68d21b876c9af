//! Producer-side udplog library.
//!
//! A [`Logger`] sends records to the daemon and listens on the same
//! endpoint for `Set Log Level` control frames that move its filter.
//!
//! ```no_run
//! # async fn demo() -> Result<(), udplog_client::ClientError> {
//! use udplog_client::{emit, Logger};
//! use udplog_core::{ClientConfig, LogLevel};
//!
//! let logger = Logger::start(ClientConfig::default()).await?;
//! emit!(logger, LogLevel::Error, "lost connection to {}", "db-1");
//! logger.log(LogLevel::Warning, "svc", "run", 42, "retrying");
//! logger.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod filter;
mod logger;
mod receiver;
mod sender;

pub use error::ClientError;
pub use filter::FilterState;
pub use logger::{ClientStats, Logger};

#[doc(hidden)]
pub fn __type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Name of the enclosing function, like C's `__FUNCTION__`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        let path = $crate::__type_name_of(__here);
        let path = path.strip_suffix("::__here").unwrap_or(path);
        let path = path.trim_end_matches("::{{closure}}");
        path.rsplit("::").next().unwrap_or(path)
    }};
}

/// Log through a [`Logger`] with the caller's function name and line.
///
/// The message is only formatted when the level passes the filter.
#[macro_export]
macro_rules! emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log_here(level, $crate::function_name!(), line!(), &format!($($arg)+))
        } else {
            false
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn function_name_is_the_enclosing_fn() {
        assert_eq!(function_name!(), "function_name_is_the_enclosing_fn");
    }

    #[test]
    fn function_name_inside_closure_names_outer_fn() {
        let name = (|| function_name!())();
        assert_eq!(name, "function_name_inside_closure_names_outer_fn");
    }
}

//! Severity levels shared by producers and the daemon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Record severity and producer filter threshold.
///
/// Ordering is total: `Debug < Warning < Error < Critical`. The discriminant
/// is the value carried by `Set Log Level=<n>` control frames.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    #[default]
    Debug = 0,
    Warning = 1,
    Error = 2,
    Critical = 3,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// Value carried on the wire.
    pub fn wire_value(self) -> u8 {
        self as u8
    }

    /// Inverse of [`LogLevel::wire_value`]; `None` outside `0..=3`.
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Warning),
            2 => Some(LogLevel::Error),
            3 => Some(LogLevel::Critical),
            _ => None,
        }
    }

    /// Operator menus number severities from 1 (`1 - Debug` … `4 - Critical`).
    pub fn from_menu_choice(choice: u32) -> Option<Self> {
        choice.checked_sub(1).and_then(Self::from_wire)
    }

    /// Upper-case token used inside log-record frames.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "0" => Ok(LogLevel::Debug),
            "warning" | "warn" | "1" => Ok(LogLevel::Warning),
            "error" | "2" => Ok(LogLevel::Error),
            "critical" | "3" => Ok(LogLevel::Critical),
            other => Err(format!(
                "unknown log level '{other}'; expected: debug, warning, error, critical"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered() {
        assert!(LogLevel::Debug < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn menu_choices_are_one_based() {
        assert_eq!(LogLevel::from_menu_choice(0), None);
        assert_eq!(LogLevel::from_menu_choice(1), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_menu_choice(4), Some(LogLevel::Critical));
        assert_eq!(LogLevel::from_menu_choice(5), None);
    }

    #[test]
    fn parses_names_and_numbers() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("3".parse::<LogLevel>(), Ok(LogLevel::Critical));
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}

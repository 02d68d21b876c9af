//! Producer-side level filter.

use std::sync::{PoisonError, RwLock};

use udplog_core::LogLevel;

/// Active minimum severity for one producer.
///
/// Read on every log call, written only by the control receiver when a
/// `Set Log Level` frame arrives. The lock makes the read-compare-branch in
/// [`FilterState::allows`] see one whole value.
#[derive(Debug)]
pub struct FilterState {
    threshold: RwLock<LogLevel>,
}

impl FilterState {
    pub fn new(initial: LogLevel) -> Self {
        Self {
            threshold: RwLock::new(initial),
        }
    }

    pub fn threshold(&self) -> LogLevel {
        *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` iff a record at `level` passes (`level >= threshold`).
    pub fn allows(&self, level: LogLevel) -> bool {
        level >= *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn apply(&self, level: LogLevel) -> LogLevel {
        let mut threshold = self.threshold.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *threshold, level)
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

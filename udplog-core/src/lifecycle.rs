//! Start/stop state machine shared by the daemon and the client.
//!
//! ```text
//! Uninitialized ──start──▶ Running ──shutdown──▶ Stopping ──join──▶ Stopped
//! ```
//!
//! `Stopped` is terminal; a component that stopped is never restarted.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopping => write!(f, "stopping"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// `Uninitialized → Running`. Returns the current state on any other start.
    pub fn mark_running(&self) -> Result<(), LifecycleState> {
        let mut state = self.lock();
        match *state {
            LifecycleState::Uninitialized => {
                *state = LifecycleState::Running;
                Ok(())
            }
            other => Err(other),
        }
    }

    /// `Running → Stopping`.
    ///
    /// Returns `false` when the component is not running, so a second
    /// shutdown request (or one racing the first) performs no work.
    pub fn begin_stop(&self) -> bool {
        let mut state = self.lock();
        if *state != LifecycleState::Running {
            return false;
        }
        *state = LifecycleState::Stopping;
        true
    }

    /// `Stopping → Stopped`, once the receive loop has been joined.
    pub fn finish_stop(&self) {
        let mut state = self.lock();
        if *state == LifecycleState::Stopping {
            *state = LifecycleState::Stopped;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

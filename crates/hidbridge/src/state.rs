//! Library lifecycle gate.

use std::fmt;

use crate::error::{HidError, HidResult};

/// Lifecycle of the native HID library.
///
/// `Uninitialized -> Ready -> ShutDown`, with no way out of `ShutDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// `init` has not succeeded yet.
    #[default]
    Uninitialized,
    /// Enumeration and opening are allowed.
    Ready,
    /// Torn down; the library cannot be initialized again.
    ShutDown,
}

impl LifecycleState {
    /// Whether enumeration and opening are allowed.
    #[must_use]
    pub fn is_ready(self) -> bool {
        self == LifecycleState::Ready
    }

    /// Check that `operation` may run in this state.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::NotInitialized`] or [`HidError::AlreadyShutDown`]
    /// when the state is not `Ready`.
    pub fn require_ready(self, operation: &'static str) -> HidResult<()> {
        match HidError::lifecycle(self, operation) {
            Some(err) => {
                tracing::error!(state = %self, operation, "HID library used outside ready state");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// State after a successful `init`, or `None` if `init` is not allowed.
    #[must_use]
    pub fn after_init(self) -> Option<Self> {
        match self {
            LifecycleState::Uninitialized | LifecycleState::Ready => Some(LifecycleState::Ready),
            LifecycleState::ShutDown => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => f.write_str("uninitialized"),
            LifecycleState::Ready => f.write_str("ready"),
            LifecycleState::ShutDown => f.write_str("shut down"),
        }
    }
}

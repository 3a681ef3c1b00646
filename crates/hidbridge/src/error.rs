//! Error types for HID access.
//!
//! Every failure is returned as a [`HidError`]. Variants fall into two classes
//! (see [`ErrorClass`]): programming errors, where the caller broke the
//! lifecycle contract and retrying cannot help, and operational errors, where
//! the device or the native stack failed and the caller decides what to do.
//! A read timeout is not an error at all; it is reported as
//! [`ReadOutcome::TimedOut`](crate::session::ReadOutcome::TimedOut).

use std::fmt;

use thiserror::Error;

use crate::native::StringKind;
use crate::session::OpenTarget;
use crate::state::LifecycleState;

/// Classification of a [`HidError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Caller contract violation (use before init, after shutdown, or a
    /// string query on a closed session). Stop the offending code path.
    Programming,
    /// Environmental failure reported as a value. Retry, abandon or notify.
    Operational,
}

/// Session operation named in a closed-session error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOp {
    /// `read_timeout`
    Read,
    /// `write`
    Write,
    /// `manufacturer`, `product` or `serial_number`
    QueryString(StringKind),
    /// `last_error`
    LastError,
}

impl fmt::Display for SessionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOp::Read => f.write_str("read"),
            SessionOp::Write => f.write_str("write"),
            SessionOp::QueryString(kind) => write!(f, "query {kind}"),
            SessionOp::LastError => f.write_str("last error"),
        }
    }
}

/// Errors produced by the HID access layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HidError {
    /// The native library refused to initialize.
    #[error("Failed to initialize HID library: {0}")]
    InitFailed(String),

    /// An operation that needs a ready library ran before `init`.
    #[error("HID library is not initialized (attempted {operation})")]
    NotInitialized {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// An operation ran after `shutdown`; the lifecycle is one-shot.
    #[error("HID library was already shut down (attempted {operation})")]
    AlreadyShutDown {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// The native enumeration failed as a whole.
    #[error("HID enumeration failed: {0}")]
    EnumerationFailed(String),

    /// No handle could be obtained for the requested device.
    #[error("Unable to open HID device ({target}): {reason}")]
    OpenFailed {
        /// Requested identity or path.
        target: OpenTarget,
        /// Native reason, or a generic description.
        reason: String,
    },

    /// The session was closed before the operation.
    #[error("HID connection already closed (attempted {operation})")]
    SessionClosed {
        /// Operation that was attempted.
        operation: SessionOp,
    },

    /// The native read reported an I/O failure.
    #[error("HID read failed: {0}")]
    ReadFailed(String),

    /// The native write reported an I/O failure.
    #[error("HID write failed: {0}")]
    WriteFailed(String),

    /// The native layer wrote fewer bytes than the report holds.
    #[error("HID write incomplete ({written} of {expected} bytes): {message}")]
    ShortWrite {
        /// Bytes the native layer reported as written.
        written: usize,
        /// Length of the report.
        expected: usize,
        /// Native last-error message.
        message: String,
    },

    /// Zero-length reports are never sent.
    #[error("Refusing to write an empty report")]
    EmptyReport,

    /// Reads must request at least one byte.
    #[error("Read length must be greater than 0")]
    InvalidReadLength,

    /// A live string query failed on the device.
    #[error("Failed to read {kind} string: {message}")]
    StringQueryFailed {
        /// Which string was queried.
        kind: StringKind,
        /// Native last-error message.
        message: String,
    },

    /// The supplied configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl HidError {
    /// Error for an operation attempted outside the `Ready` state.
    ///
    /// Returns `None` when `state` is `Ready`.
    #[must_use]
    pub fn lifecycle(state: LifecycleState, operation: &'static str) -> Option<Self> {
        match state {
            LifecycleState::Uninitialized => Some(Self::NotInitialized { operation }),
            LifecycleState::ShutDown => Some(Self::AlreadyShutDown { operation }),
            LifecycleState::Ready => None,
        }
    }

    /// Create an open failure error.
    #[must_use]
    pub fn open_failed(target: OpenTarget, reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            target,
            reason: reason.into(),
        }
    }

    /// Create a closed-session error.
    #[must_use]
    pub fn closed(operation: SessionOp) -> Self {
        Self::SessionClosed { operation }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Which class this error belongs to.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            HidError::NotInitialized { .. }
            | HidError::AlreadyShutDown { .. }
            | HidError::InvalidConfiguration(_)
            | HidError::SessionClosed {
                operation: SessionOp::QueryString(_),
            } => ErrorClass::Programming,
            HidError::InitFailed(_)
            | HidError::EnumerationFailed(_)
            | HidError::OpenFailed { .. }
            | HidError::SessionClosed { .. }
            | HidError::ReadFailed(_)
            | HidError::WriteFailed(_)
            | HidError::ShortWrite { .. }
            | HidError::EmptyReport
            | HidError::InvalidReadLength
            | HidError::StringQueryFailed { .. } => ErrorClass::Operational,
        }
    }

    /// Whether the caller broke the lifecycle contract.
    #[must_use]
    pub fn is_programming_error(&self) -> bool {
        self.class() == ErrorClass::Programming
    }

    /// Whether the session or library was already closed or shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            HidError::SessionClosed { .. } | HidError::AlreadyShutDown { .. }
        )
    }
}

/// Result type for HID operations.
pub type HidResult<T> = Result<T, HidError>;

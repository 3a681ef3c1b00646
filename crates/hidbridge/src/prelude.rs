//! Prelude for hidbridge.
//!
//! Re-exports the types most callers need.
//!
//! ```rust
//! use hidbridge::mock::MockHidBackend;
//! use hidbridge::prelude::*;
//!
//! let mut ctx = HidContext::new(MockHidBackend::new());
//! assert_eq!(ctx.state(), LifecycleState::Uninitialized);
//! assert!(ctx.enumerate(0, 0).is_err_and(|e| e.is_programming_error()));
//! ```

pub use crate::codec::{StringCodec, StringDecoding};
pub use crate::config::{HidConfig, HidConfigBuilder};
pub use crate::context::HidContext;
pub use crate::descriptor::DeviceDescriptor;
pub use crate::error::{ErrorClass, HidError, HidResult, SessionOp};
pub use crate::native::{NativeDevice, NativeHid, StringKind};
pub use crate::session::{OpenTarget, ReadOutcome, Session, SessionStatus};
pub use crate::state::LifecycleState;

#[cfg(feature = "hidapi")]
pub use crate::backend::HidApiBackend;

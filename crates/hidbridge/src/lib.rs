//! Host-side access to USB HID devices.
//!
//! This crate discovers attached HID devices, opens exclusive sessions with
//! them and exchanges raw reports, on top of a pluggable native HID stack.
//!
//! ## Architecture
//!
//! - [`context`] - [`HidContext`], owner of the native library lifecycle,
//!   enumeration and session opening
//! - [`session`] - [`Session`], one open device handle with timed reads,
//!   writes and live string queries
//! - [`descriptor`] / [`enumeration`] - device snapshots
//! - [`codec`] - native wide-string decoding
//! - [`native`] - the boundary traits a native stack implements
//! - [`backend`] - `hidapi` backend (feature `hidapi`)
//! - [`mock`] - in-memory backend for tests
//!
//! ## Example
//!
//! ```rust
//! use hidbridge::mock::{MockDevice, MockHidBackend, MockRead};
//! use hidbridge::prelude::*;
//!
//! # fn main() -> Result<(), HidError> {
//! let backend = MockHidBackend::new();
//! let wheel = MockDevice::new(0x046D, 0xC24F, "/dev/hidraw0").with_product("G29");
//! wheel.queue_read(MockRead::Data(vec![0x01, 0x80]));
//! backend.add_device(wheel);
//!
//! let mut ctx = HidContext::new(backend);
//! ctx.init()?;
//!
//! let devices = ctx.enumerate(0, 0)?;
//! assert_eq!(devices.len(), 1);
//!
//! let mut session = ctx.open_descriptor(&devices[0])?;
//! session.write(&[0x00, 0xF8, 0x81])?;
//! assert_eq!(session.read_timeout(64, 100)?, ReadOutcome::Data(vec![0x01, 0x80]));
//! assert_eq!(session.read_timeout(64, 100)?, ReadOutcome::TimedOut);
//! session.close();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backend;
pub mod codec;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod enumeration;
pub mod error;
pub mod mock;
pub mod native;
pub mod session;
pub mod state;

pub mod prelude;

pub use codec::{StringCodec, StringDecoding, WideChar};
pub use config::HidConfig;
pub use context::HidContext;
pub use descriptor::DeviceDescriptor;
pub use error::{ErrorClass, HidError, HidResult, SessionOp};
pub use native::{NativeDevice, NativeDeviceRecord, NativeError, NativeHid, StringKind};
pub use session::{OpenTarget, ReadOutcome, Session, SessionStatus};
pub use state::LifecycleState;

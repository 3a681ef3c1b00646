//! Production native backends.

#[cfg(feature = "hidapi")]
mod hidapi_backend;

#[cfg(feature = "hidapi")]
pub use hidapi_backend::{HidApiBackend, HidApiDevice};

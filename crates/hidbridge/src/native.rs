//! Boundary with the native HID stack.
//!
//! [`NativeHid`] and [`NativeDevice`] describe the capability the rest of the
//! crate is built on: library init/exit, enumeration, opening devices and
//! raw report I/O. Return conventions follow the native C API (counts and
//! status codes as `i32`) so that interpreting them stays in one place,
//! [`Session`](crate::session::Session).
//!
//! Resource release is tied to ownership. Dropping a [`NativeHid::DeviceList`]
//! frees the native enumeration list and dropping a [`NativeHid::Device`]
//! closes the native handle.

use std::ffi::{CStr, CString};
use std::fmt;

use thiserror::Error;

use crate::codec::WideChar;

/// Failure reported by the native layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    message: String,
}

impl NativeError {
    /// Wrap a native error message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The native message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Device string that can be queried from an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// USB manufacturer string
    Manufacturer,
    /// USB product string
    Product,
    /// USB serial number string
    SerialNumber,
}

impl fmt::Display for StringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringKind::Manufacturer => f.write_str("manufacturer"),
            StringKind::Product => f.write_str("product"),
            StringKind::SerialNumber => f.write_str("serial number"),
        }
    }
}

/// One entry of a native enumeration list, before decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeDeviceRecord {
    /// Platform path; `None` when the native layer supplied none.
    pub path: Option<CString>,
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Serial number as native wide characters; `None` when absent.
    pub serial_number: Option<Vec<WideChar>>,
    /// Binary-coded decimal device release.
    pub release_number: u16,
    /// Manufacturer string as native wide characters; `None` when absent.
    pub manufacturer_string: Option<Vec<WideChar>>,
    /// Product string as native wide characters; `None` when absent.
    pub product_string: Option<Vec<WideChar>>,
    /// HID usage page; 0 where the platform does not report it.
    pub usage_page: u16,
    /// HID usage; 0 where the platform does not report it.
    pub usage: u16,
    /// USB interface number; -1 where the platform does not report it.
    pub interface_number: i32,
}

/// Library-level native HID capability.
pub trait NativeHid {
    /// Open device handle. Dropping it closes the handle.
    type Device: NativeDevice;

    /// Snapshot of enumerated devices. Dropping it frees the native list.
    type DeviceList: Iterator<Item = NativeDeviceRecord>;

    /// One-time library setup.
    ///
    /// # Errors
    ///
    /// Returns the native reason when setup fails.
    fn init(&mut self) -> Result<(), NativeError>;

    /// Release library-level resources.
    fn exit(&mut self);

    /// List devices matching the filters; 0 matches any vendor or product.
    ///
    /// # Errors
    ///
    /// Returns the native reason when the enumeration cannot be performed.
    fn enumerate(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self::DeviceList, NativeError>;

    /// Open the first device matching the IDs (and serial, if given).
    ///
    /// # Errors
    ///
    /// Returns the native reason when no handle is produced.
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> Result<Self::Device, NativeError>;

    /// Open the device at a platform path.
    ///
    /// # Errors
    ///
    /// Returns the native reason when no handle is produced.
    fn open_path(&mut self, path: &CStr) -> Result<Self::Device, NativeError>;
}

/// Open native device handle.
pub trait NativeDevice {
    /// Timed read into `buf`. Returns the byte count, 0 on timeout, or a
    /// negative value on failure. A negative timeout blocks.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> i32;

    /// Write a report (byte 0 is the report ID). Returns the byte count
    /// written or a negative value on failure.
    fn write(&mut self, data: &[u8]) -> i32;

    /// Fill `buf` with a NUL-terminated device string. Returns 0 on success
    /// or a negative value on failure.
    fn get_string(&mut self, kind: StringKind, buf: &mut [WideChar]) -> i32;

    /// Most recent error recorded for this handle.
    fn last_error(&self) -> Option<&[WideChar]>;
}

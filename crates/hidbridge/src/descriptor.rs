//! Device descriptors produced by enumeration.

use std::ffi::{CStr, CString};
use std::fmt;

use serde::Serialize;

use crate::codec::StringCodec;
use crate::native::NativeDeviceRecord;

/// Static identity and metadata of one discovered HID device.
///
/// A descriptor is a point-in-time snapshot with no link to any open
/// session. Its path may go stale once the device is unplugged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceDescriptor {
    path: String,
    vendor_id: u16,
    product_id: u16,
    serial_number: String,
    manufacturer: String,
    product: String,
    release_number: u16,
    usage_page: u16,
    usage: u16,
    interface_number: i32,
    #[serde(skip)]
    native_path: Option<CString>,
}

impl DeviceDescriptor {
    /// Decode a native enumeration record. A record without a path gets
    /// `missing_path` instead.
    #[must_use]
    pub fn from_native(
        record: &NativeDeviceRecord,
        codec: &StringCodec,
        missing_path: &str,
    ) -> Self {
        let path = match &record.path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => missing_path.to_string(),
        };
        Self {
            path,
            vendor_id: record.vendor_id,
            product_id: record.product_id,
            serial_number: codec.decode(record.serial_number.as_deref()),
            manufacturer: codec.decode(record.manufacturer_string.as_deref()),
            product: codec.decode(record.product_string.as_deref()),
            release_number: record.release_number,
            usage_page: record.usage_page,
            usage: record.usage,
            interface_number: record.interface_number,
            native_path: record.path.clone(),
        }
    }

    /// Platform path for display, or the missing-path sentinel (see
    /// [`Self::has_path`]). Bytes that are not UTF-8 are shown as U+FFFD.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path exactly as the native layer reported it. This is what
    /// reopens the device.
    pub fn native_path(&self) -> Option<&CStr> {
        self.native_path.as_deref()
    }

    /// Whether the native layer supplied a path that can be opened.
    pub fn has_path(&self) -> bool {
        self.native_path.is_some()
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Device release in binary-coded decimal, as reported.
    pub fn release_number(&self) -> u16 {
        self.release_number
    }

    /// Usage page; 0 on platforms that do not report it.
    pub fn usage_page(&self) -> u16 {
        self.usage_page
    }

    /// Usage; 0 on platforms that do not report it.
    pub fn usage(&self) -> u16 {
        self.usage
    }

    /// USB interface number; -1 when the platform does not report it.
    pub fn interface_number(&self) -> i32 {
        self.interface_number
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    pub fn display_name(&self) -> String {
        [&self.product, &self.manufacturer]
            .into_iter()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path: {}", self.path)?;
        writeln!(f, "  Vendor : {:#06x} \"{}\"", self.vendor_id, self.manufacturer)?;
        writeln!(f, "  Product: {:#06x} \"{}\"", self.product_id, self.product)?;
        writeln!(f, "  Serial: \"{}\"", self.serial_number)?;
        writeln!(f, "  Release: {}", self.release_number)?;
        writeln!(f, "  UsagePage: {}", self.usage_page)?;
        writeln!(f, "  Usage: {}", self.usage)?;
        write!(f, "  InterfaceNumber: {}", self.interface_number)
    }
}

//! Native backend on top of the `hidapi` crate.
//!
//! `hidapi` already decodes device strings, so they are widened again with
//! [`encode_wide`] before crossing the boundary. Errors are kept per handle
//! as the native `hid_error` does.

use std::ffi::CStr;
use std::fmt;

use hidapi::{DeviceInfo, HidApi, HidDevice, HidError, HidResult};

use crate::codec::{WideChar, encode_wide, encode_wide_into};
use crate::native::{NativeDevice, NativeDeviceRecord, NativeError, NativeHid, StringKind};

fn native_error(err: &HidError) -> NativeError {
    NativeError::new(err.to_string())
}

fn status(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn record_from_info(info: &DeviceInfo) -> NativeDeviceRecord {
    NativeDeviceRecord {
        path: Some(info.path().to_owned()),
        vendor_id: info.vendor_id(),
        product_id: info.product_id(),
        serial_number: info.serial_number().map(encode_wide),
        release_number: info.release_number(),
        manufacturer_string: info.manufacturer_string().map(encode_wide),
        product_string: info.product_string().map(encode_wide),
        usage_page: info.usage_page(),
        usage: info.usage(),
        interface_number: info.interface_number(),
    }
}

/// Backend driving the system HID stack through `hidapi`.
#[derive(Default)]
pub struct HidApiBackend {
    api: Option<HidApi>,
}

impl HidApiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&mut self) -> Result<&mut HidApi, NativeError> {
        self.api
            .as_mut()
            .ok_or_else(|| NativeError::new("hidapi is not initialized"))
    }
}

impl fmt::Debug for HidApiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidApiBackend")
            .field("initialized", &self.api.is_some())
            .finish()
    }
}

impl NativeHid for HidApiBackend {
    type Device = HidApiDevice;
    type DeviceList = std::vec::IntoIter<NativeDeviceRecord>;

    fn init(&mut self) -> Result<(), NativeError> {
        if self.api.is_none() {
            let api = HidApi::new_without_enumerate().map_err(|e| native_error(&e))?;
            self.api = Some(api);
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.api = None;
    }

    fn enumerate(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self::DeviceList, NativeError> {
        let api = self.api()?;
        api.reset_devices().map_err(|e| native_error(&e))?;
        api.add_devices(vendor_id, product_id)
            .map_err(|e| native_error(&e))?;
        let records: Vec<NativeDeviceRecord> = api.device_list().map(record_from_info).collect();
        // Drop hidapi's cached copy; the snapshot now lives in `records`.
        api.reset_devices().map_err(|e| native_error(&e))?;
        Ok(records.into_iter())
    }

    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> Result<Self::Device, NativeError> {
        let api = self.api()?;
        let device = match serial_number {
            Some(serial) => api.open_serial(vendor_id, product_id, serial),
            None => api.open(vendor_id, product_id),
        };
        device.map(HidApiDevice::new).map_err(|e| native_error(&e))
    }

    fn open_path(&mut self, path: &CStr) -> Result<Self::Device, NativeError> {
        let api = self.api()?;
        api.open_path(path)
            .map(HidApiDevice::new)
            .map_err(|e| native_error(&e))
    }
}

/// Open `hidapi` device. Dropping it closes the native handle.
///
/// The recorded error is cleared at the start of every read, write and
/// string query, as `hid_error` is.
pub struct HidApiDevice {
    device: HidDevice,
    last_error: Option<Vec<WideChar>>,
}

impl HidApiDevice {
    fn new(device: HidDevice) -> Self {
        Self {
            device,
            last_error: None,
        }
    }

    fn fail(&mut self, err: &HidError) -> i32 {
        self.last_error = Some(encode_wide(&err.to_string()));
        -1
    }
}

impl fmt::Debug for HidApiDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidApiDevice")
            .field("last_error", &self.last_error.is_some())
            .finish_non_exhaustive()
    }
}

impl NativeDevice for HidApiDevice {
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> i32 {
        self.last_error = None;
        match self.device.read_timeout(buf, timeout_ms) {
            Ok(count) => status(count),
            Err(e) => self.fail(&e),
        }
    }

    fn write(&mut self, data: &[u8]) -> i32 {
        self.last_error = None;
        match self.device.write(data) {
            Ok(count) => status(count),
            Err(e) => self.fail(&e),
        }
    }

    fn get_string(&mut self, kind: StringKind, buf: &mut [WideChar]) -> i32 {
        self.last_error = None;
        let value: HidResult<Option<String>> = match kind {
            StringKind::Manufacturer => self.device.get_manufacturer_string(),
            StringKind::Product => self.device.get_product_string(),
            StringKind::SerialNumber => self.device.get_serial_number_string(),
        };
        match value {
            Ok(value) => {
                encode_wide_into(value.as_deref().unwrap_or_default(), buf);
                0
            }
            Err(e) => self.fail(&e),
        }
    }

    fn last_error(&self) -> Option<&[WideChar]> {
        self.last_error.as_deref()
    }
}

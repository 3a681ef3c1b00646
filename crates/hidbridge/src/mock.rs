//! In-memory native backend for tests.
//!
//! [`MockHidBackend`] stands in for the native HID stack. Devices are
//! described with [`MockDevice`] and share their I/O state with every handle
//! opened on them, so a test can keep a `MockDevice` clone to script reads,
//! writes and string failures and to inspect what the session did.

use std::collections::{HashMap, VecDeque};
use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::codec::{StringCodec, WIDE_NUL, WideChar, encode_wide};
use crate::native::{NativeDevice, NativeDeviceRecord, NativeError, NativeHid, StringKind};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn status(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Scripted outcome of one native read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    /// Deliver these bytes (truncated to the caller's buffer).
    Data(Vec<u8>),
    /// Nothing within the timeout.
    Timeout,
    /// Fail, optionally recording a native error message.
    Error(Option<String>),
}

/// Scripted outcome of one native write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockWrite {
    /// Accept the whole report.
    Complete,
    /// Accept only this many bytes.
    Short(usize),
    /// Fail, optionally recording a native error message.
    Error(Option<String>),
}

#[derive(Debug, Default)]
struct DeviceIo {
    reads: VecDeque<MockRead>,
    writes: VecDeque<MockWrite>,
    write_history: Vec<Vec<u8>>,
    strings: HashMap<StringKind, Vec<WideChar>>,
    string_failures: HashMap<StringKind, Option<String>>,
    read_calls: usize,
    write_calls: usize,
    string_calls: usize,
    open_handles: usize,
    closes: usize,
}

/// A simulated attached device.
#[derive(Debug, Clone)]
pub struct MockDevice {
    record: NativeDeviceRecord,
    io: Arc<Mutex<DeviceIo>>,
}

impl MockDevice {
    pub fn new(vendor_id: u16, product_id: u16, path: &str) -> Self {
        Self {
            record: NativeDeviceRecord {
                path: CString::new(path).ok(),
                vendor_id,
                product_id,
                interface_number: -1,
                ..NativeDeviceRecord::default()
            },
            io: Arc::new(Mutex::new(DeviceIo::default())),
        }
    }

    /// Enumerate without a native path.
    #[must_use]
    pub fn without_path(mut self) -> Self {
        self.record.path = None;
        self
    }

    #[must_use]
    pub fn with_manufacturer(self, manufacturer: &str) -> Self {
        self.with_raw_string(StringKind::Manufacturer, encode_wide(manufacturer))
    }

    #[must_use]
    pub fn with_product(self, product: &str) -> Self {
        self.with_raw_string(StringKind::Product, encode_wide(product))
    }

    #[must_use]
    pub fn with_serial(self, serial: &str) -> Self {
        self.with_raw_string(StringKind::SerialNumber, encode_wide(serial))
    }

    /// Set a device string from raw wide characters, used both for the
    /// enumeration record and for live queries.
    #[must_use]
    pub fn with_raw_string(mut self, kind: StringKind, wide: Vec<WideChar>) -> Self {
        let slot = match kind {
            StringKind::Manufacturer => &mut self.record.manufacturer_string,
            StringKind::Product => &mut self.record.product_string,
            StringKind::SerialNumber => &mut self.record.serial_number,
        };
        *slot = Some(wide.clone());
        lock(&self.io).strings.insert(kind, wide);
        self
    }

    #[must_use]
    pub fn with_release_number(mut self, release_number: u16) -> Self {
        self.record.release_number = release_number;
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage_page: u16, usage: u16) -> Self {
        self.record.usage_page = usage_page;
        self.record.usage = usage;
        self
    }

    #[must_use]
    pub fn with_interface_number(mut self, interface_number: i32) -> Self {
        self.record.interface_number = interface_number;
        self
    }

    /// The record this device contributes to enumerations.
    pub fn record(&self) -> &NativeDeviceRecord {
        &self.record
    }

    /// Change a string as seen by live queries only.
    pub fn set_live_string(&self, kind: StringKind, value: &str) {
        lock(&self.io).strings.insert(kind, encode_wide(value));
    }

    pub fn queue_read(&self, read: MockRead) {
        lock(&self.io).reads.push_back(read);
    }

    pub fn queue_write(&self, write: MockWrite) {
        lock(&self.io).writes.push_back(write);
    }

    /// Make live queries for `kind` fail, optionally recording a message.
    pub fn fail_string(&self, kind: StringKind, message: Option<&str>) {
        lock(&self.io)
            .string_failures
            .insert(kind, message.map(str::to_string));
    }

    /// Bytes accepted by native writes, one entry per call.
    pub fn write_history(&self) -> Vec<Vec<u8>> {
        lock(&self.io).write_history.clone()
    }

    pub fn read_calls(&self) -> usize {
        lock(&self.io).read_calls
    }

    pub fn write_calls(&self) -> usize {
        lock(&self.io).write_calls
    }

    pub fn string_calls(&self) -> usize {
        lock(&self.io).string_calls
    }

    /// Handles currently open on this device.
    pub fn open_handles(&self) -> usize {
        lock(&self.io).open_handles
    }

    /// Native closes performed on this device's handles.
    pub fn close_count(&self) -> usize {
        lock(&self.io).closes
    }

    fn matches_ids(&self, vendor_id: u16, product_id: u16) -> bool {
        self.record.vendor_id == vendor_id && self.record.product_id == product_id
    }

    fn matches_filter(&self, vendor_id: u16, product_id: u16) -> bool {
        (vendor_id == 0 || self.record.vendor_id == vendor_id)
            && (product_id == 0 || self.record.product_id == product_id)
    }

    fn serial(&self) -> String {
        StringCodec::default().decode(self.record.serial_number.as_deref())
    }

    fn open_handle(&self) -> MockHandle {
        lock(&self.io).open_handles += 1;
        MockHandle {
            io: Arc::clone(&self.io),
            last_error: None,
        }
    }
}

/// Open handle on a [`MockDevice`]. Dropping it counts as a native close.
#[derive(Debug)]
pub struct MockHandle {
    io: Arc<Mutex<DeviceIo>>,
    last_error: Option<Vec<WideChar>>,
}

impl MockHandle {
    fn record_error(&mut self, message: Option<String>) -> i32 {
        self.last_error = message.as_deref().map(encode_wide);
        -1
    }
}

impl NativeDevice for MockHandle {
    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: i32) -> i32 {
        self.last_error = None;
        let next = {
            let mut io = lock(&self.io);
            io.read_calls += 1;
            io.reads.pop_front()
        };
        match next {
            None | Some(MockRead::Timeout) => 0,
            Some(MockRead::Data(data)) => {
                let count = data.len().min(buf.len());
                for (slot, byte) in buf.iter_mut().zip(data) {
                    *slot = byte;
                }
                status(count)
            }
            Some(MockRead::Error(message)) => self.record_error(message),
        }
    }

    fn write(&mut self, data: &[u8]) -> i32 {
        self.last_error = None;
        let next = {
            let mut io = lock(&self.io);
            io.write_calls += 1;
            io.writes.pop_front()
        };
        match next {
            None | Some(MockWrite::Complete) => {
                lock(&self.io).write_history.push(data.to_vec());
                status(data.len())
            }
            Some(MockWrite::Short(count)) => {
                let accepted: Vec<u8> = data.iter().take(count).copied().collect();
                let written = accepted.len();
                lock(&self.io).write_history.push(accepted);
                status(written)
            }
            Some(MockWrite::Error(message)) => self.record_error(message),
        }
    }

    fn get_string(&mut self, kind: StringKind, buf: &mut [WideChar]) -> i32 {
        self.last_error = None;
        let (failure, value) = {
            let mut io = lock(&self.io);
            io.string_calls += 1;
            (
                io.string_failures.get(&kind).cloned(),
                io.strings.get(&kind).cloned().unwrap_or_default(),
            )
        };
        if let Some(message) = failure {
            return self.record_error(message);
        }

        let Some((terminator, body)) = buf.split_last_mut() else {
            return 0;
        };
        let mut written = 0;
        for (slot, &c) in body
            .iter_mut()
            .zip(value.iter().take_while(|&&c| c != WIDE_NUL))
        {
            *slot = c;
            written += 1;
        }
        match body.get_mut(written) {
            Some(slot) => *slot = WIDE_NUL,
            None => *terminator = WIDE_NUL,
        }
        0
    }

    fn last_error(&self) -> Option<&[WideChar]> {
        self.last_error.as_deref()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut io = lock(&self.io);
        io.open_handles = io.open_handles.saturating_sub(1);
        io.closes += 1;
    }
}

#[derive(Debug, Default)]
struct Bus {
    devices: Vec<MockDevice>,
    init_error: Option<String>,
    enumeration_error: Option<String>,
    init_calls: usize,
    exit_calls: usize,
    enumerations: usize,
    lists_released: usize,
    open_calls: usize,
}

/// Simulated native HID stack. Clones share the same bus, so a test can
/// keep one to inspect counters after handing the other to a context.
#[derive(Debug, Clone, Default)]
pub struct MockHidBackend {
    bus: Arc<Mutex<Bus>>,
}

impl MockHidBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device. Keep a clone to script and inspect it.
    pub fn add_device(&self, device: MockDevice) {
        lock(&self.bus).devices.push(device);
    }

    /// Detach every device enumerated under `path`.
    pub fn remove_device(&self, path: &str) {
        lock(&self.bus)
            .devices
            .retain(|d| d.record.path.as_deref().and_then(|p| p.to_str().ok()) != Some(path));
    }

    pub fn device_count(&self) -> usize {
        lock(&self.bus).devices.len()
    }

    /// Make native init fail with `message`.
    pub fn fail_init(&self, message: &str) {
        lock(&self.bus).init_error = Some(message.to_string());
    }

    /// Make native enumeration fail with `message`.
    pub fn fail_enumeration(&self, message: &str) {
        lock(&self.bus).enumeration_error = Some(message.to_string());
    }

    pub fn init_calls(&self) -> usize {
        lock(&self.bus).init_calls
    }

    pub fn exit_calls(&self) -> usize {
        lock(&self.bus).exit_calls
    }

    /// Native enumerations that returned a list.
    pub fn enumerations(&self) -> usize {
        lock(&self.bus).enumerations
    }

    /// Native enumeration lists freed.
    pub fn lists_released(&self) -> usize {
        lock(&self.bus).lists_released
    }

    /// Native open calls, successful or not.
    pub fn open_calls(&self) -> usize {
        lock(&self.bus).open_calls
    }
}

/// Native enumeration list handed out by [`MockHidBackend`].
#[derive(Debug)]
pub struct MockDeviceList {
    records: std::vec::IntoIter<NativeDeviceRecord>,
    bus: Arc<Mutex<Bus>>,
}

impl Iterator for MockDeviceList {
    type Item = NativeDeviceRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

impl Drop for MockDeviceList {
    fn drop(&mut self) {
        lock(&self.bus).lists_released += 1;
    }
}

impl NativeHid for MockHidBackend {
    type Device = MockHandle;
    type DeviceList = MockDeviceList;

    fn init(&mut self) -> Result<(), NativeError> {
        let mut bus = lock(&self.bus);
        bus.init_calls += 1;
        match &bus.init_error {
            Some(message) => Err(NativeError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn exit(&mut self) {
        lock(&self.bus).exit_calls += 1;
    }

    fn enumerate(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self::DeviceList, NativeError> {
        let mut bus = lock(&self.bus);
        if let Some(message) = &bus.enumeration_error {
            return Err(NativeError::new(message.clone()));
        }
        bus.enumerations += 1;
        let records: Vec<NativeDeviceRecord> = bus
            .devices
            .iter()
            .filter(|d| d.matches_filter(vendor_id, product_id))
            .map(|d| d.record.clone())
            .collect();
        Ok(MockDeviceList {
            records: records.into_iter(),
            bus: Arc::clone(&self.bus),
        })
    }

    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> Result<Self::Device, NativeError> {
        let mut bus = lock(&self.bus);
        bus.open_calls += 1;
        bus.devices
            .iter()
            .filter(|d| d.matches_ids(vendor_id, product_id))
            .find(|d| serial_number.is_none_or(|serial| d.serial() == serial))
            .map(MockDevice::open_handle)
            .ok_or_else(|| NativeError::new("device not found"))
    }

    fn open_path(&mut self, path: &CStr) -> Result<Self::Device, NativeError> {
        let mut bus = lock(&self.bus);
        bus.open_calls += 1;
        bus.devices
            .iter()
            .find(|d| d.record.path.as_deref() == Some(path))
            .map(MockDevice::open_handle)
            .ok_or_else(|| NativeError::new("device not found"))
    }
}

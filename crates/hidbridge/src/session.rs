//! Open communication sessions with a single device.
//!
//! A [`Session`] is the sole owner of one native device handle. It is either
//! open or closed; closing is one-way and idempotent, and dropping an open
//! session closes it. Every operation on a closed session returns
//! [`HidError::SessionClosed`] instead of touching the released handle.
//!
//! Sessions do no internal locking. Methods take `&mut self`, so one caller
//! drives a session at a time; sessions for different devices are
//! independent.

use std::fmt;

use tracing::{debug, info, warn};

use crate::codec::{StringCodec, WideChar};
use crate::config::HidConfig;
use crate::error::{HidError, HidResult, SessionOp};
use crate::native::{NativeDevice, StringKind};

/// What a session was opened for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpenTarget {
    /// First device with this vendor/product pair.
    Ids { vendor_id: u16, product_id: u16 },
    /// Device with this vendor/product pair and serial number.
    Serial {
        vendor_id: u16,
        product_id: u16,
        serial_number: String,
    },
    /// Device at a platform path.
    Path(String),
}

impl fmt::Display for OpenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenTarget::Ids {
                vendor_id,
                product_id,
            } => write!(f, "vendor 0x{vendor_id:04X}, product 0x{product_id:04X}"),
            OpenTarget::Serial {
                vendor_id,
                product_id,
                serial_number,
            } => write!(
                f,
                "vendor 0x{vendor_id:04X}, product 0x{product_id:04X}, serial {serial_number}"
            ),
            OpenTarget::Path(path) => write!(f, "path {path}"),
        }
    }
}

/// Result of a timed read that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Nothing arrived within the timeout. Try again later.
    TimedOut,
    /// Exactly the bytes the device delivered.
    Data(Vec<u8>),
}

impl ReadOutcome {
    /// The delivered bytes, or `None` on timeout.
    #[must_use]
    pub fn into_data(self) -> Option<Vec<u8>> {
        match self {
            ReadOutcome::TimedOut => None,
            ReadOutcome::Data(data) => Some(data),
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReadOutcome::TimedOut)
    }
}

/// Open/closed state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Open,
    Closed,
}

/// Exclusive communication channel to one HID device.
#[derive(Debug)]
pub struct Session<D: NativeDevice> {
    device: Option<D>,
    target: OpenTarget,
    codec: StringCodec,
    string_buffer_len: usize,
    fallback_error_message: String,
}

impl<D: NativeDevice> Session<D> {
    /// Wrap a freshly opened native handle.
    pub(crate) fn new(device: D, target: OpenTarget, config: &HidConfig) -> Self {
        Self {
            device: Some(device),
            target,
            codec: config.codec(),
            string_buffer_len: config.string_buffer_len,
            fallback_error_message: config.fallback_error_message.clone(),
        }
    }

    /// What this session was opened for.
    pub fn target(&self) -> &OpenTarget {
        &self.target
    }

    pub fn status(&self) -> SessionStatus {
        if self.device.is_some() {
            SessionStatus::Open
        } else {
            SessionStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Read up to `num_bytes`, waiting at most `timeout_ms` milliseconds
    /// (a negative timeout blocks until data arrives).
    ///
    /// # Errors
    ///
    /// [`HidError::SessionClosed`] after close, [`HidError::InvalidReadLength`]
    /// for a zero length, [`HidError::ReadFailed`] when the device fails.
    pub fn read_timeout(&mut self, num_bytes: usize, timeout_ms: i32) -> HidResult<ReadOutcome> {
        let device = self
            .device
            .as_mut()
            .ok_or(HidError::closed(SessionOp::Read))?;
        if num_bytes == 0 {
            return Err(HidError::InvalidReadLength);
        }

        let mut buf = vec![0u8; num_bytes];
        let status = device.read_timeout(&mut buf, timeout_ms);
        match usize::try_from(status) {
            Ok(0) => {
                debug!(target_device = %self.target, timeout_ms, "HID read timed out");
                Ok(ReadOutcome::TimedOut)
            }
            Ok(count) => {
                buf.truncate(count);
                debug!(target_device = %self.target, bytes = buf.len(), "HID read");
                Ok(ReadOutcome::Data(buf))
            }
            Err(_) => {
                let message = native_message(device, self.codec, &self.fallback_error_message);
                warn!(target_device = %self.target, status, %message, "HID read failed");
                Err(HidError::ReadFailed(message))
            }
        }
    }

    /// Send one report. Byte 0 is the report ID; `0x00` means the device
    /// uses no report IDs and the native layer strips it from the wire.
    ///
    /// # Errors
    ///
    /// [`HidError::SessionClosed`] after close, [`HidError::EmptyReport`] for
    /// an empty report, [`HidError::ShortWrite`] when the device took fewer
    /// bytes than the report holds, [`HidError::WriteFailed`] on I/O failure.
    pub fn write(&mut self, report: &[u8]) -> HidResult<()> {
        let device = self
            .device
            .as_mut()
            .ok_or(HidError::closed(SessionOp::Write))?;
        if report.is_empty() {
            return Err(HidError::EmptyReport);
        }

        let status = device.write(report);
        match usize::try_from(status) {
            Ok(written) if written == report.len() => {
                debug!(target_device = %self.target, bytes = written, "HID write");
                Ok(())
            }
            Ok(written) if written > report.len() => {
                let message = format!(
                    "native layer reported {written} bytes written for a {}-byte report",
                    report.len()
                );
                warn!(target_device = %self.target, %message, "HID write failed");
                Err(HidError::WriteFailed(message))
            }
            Ok(written) => {
                let message = native_message(device, self.codec, &self.fallback_error_message);
                warn!(
                    target_device = %self.target,
                    written,
                    expected = report.len(),
                    %message,
                    "HID write incomplete"
                );
                Err(HidError::ShortWrite {
                    written,
                    expected: report.len(),
                    message,
                })
            }
            Err(_) => {
                let message = native_message(device, self.codec, &self.fallback_error_message);
                warn!(target_device = %self.target, status, %message, "HID write failed");
                Err(HidError::WriteFailed(message))
            }
        }
    }

    /// Manufacturer string, queried live from the device.
    ///
    /// # Errors
    ///
    /// See [`Self::query_string`].
    pub fn manufacturer(&mut self) -> HidResult<String> {
        self.query_string(StringKind::Manufacturer)
    }

    /// Product string, queried live from the device.
    ///
    /// # Errors
    ///
    /// See [`Self::query_string`].
    pub fn product(&mut self) -> HidResult<String> {
        self.query_string(StringKind::Product)
    }

    /// Serial number string, queried live from the device.
    ///
    /// # Errors
    ///
    /// See [`Self::query_string`].
    pub fn serial_number(&mut self) -> HidResult<String> {
        self.query_string(StringKind::SerialNumber)
    }

    /// Query a device string into a fixed wide buffer and decode it.
    ///
    /// # Errors
    ///
    /// [`HidError::SessionClosed`] (programming-error class) after close,
    /// [`HidError::StringQueryFailed`] with the handle's last error when the
    /// device refuses.
    pub fn query_string(&mut self, kind: StringKind) -> HidResult<String> {
        let Some(device) = self.device.as_mut() else {
            tracing::error!(
                target_device = %self.target,
                %kind,
                "String query on closed HID session"
            );
            return Err(HidError::closed(SessionOp::QueryString(kind)));
        };

        let mut buf: Vec<WideChar> = vec![0; self.string_buffer_len];
        // The last slot stays NUL so the decode is always terminated.
        let status = match buf.split_last_mut() {
            Some((_, writable)) => device.get_string(kind, writable),
            None => -1,
        };
        if status == 0 {
            return Ok(self.codec.decode_buffer(&buf));
        }

        let message = native_message(device, self.codec, &self.fallback_error_message);
        warn!(target_device = %self.target, %kind, %message, "HID string query failed");
        Err(HidError::StringQueryFailed { kind, message })
    }

    /// Most recent native error for this handle, or the generic message when
    /// the native layer has none.
    ///
    /// # Errors
    ///
    /// [`HidError::SessionClosed`] after close.
    pub fn last_error(&self) -> HidResult<String> {
        let device = self
            .device
            .as_ref()
            .ok_or(HidError::closed(SessionOp::LastError))?;
        Ok(native_message(device, self.codec, &self.fallback_error_message))
    }

    /// Release the native handle. Closing a closed session does nothing.
    pub fn close(&mut self) {
        if let Some(device) = self.device.take() {
            drop(device);
            info!(target_device = %self.target, "HID session closed");
        }
    }
}

impl<D: NativeDevice> Drop for Session<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn native_message<D: NativeDevice>(device: &D, codec: StringCodec, fallback: &str) -> String {
    device
        .last_error()
        .map(|wide| codec.decode_buffer(wide))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

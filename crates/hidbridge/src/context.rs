//! Library context: lifecycle, enumeration and session opening.

use std::ffi::CString;

use tracing::{debug, info, warn};

use crate::config::HidConfig;
use crate::descriptor::DeviceDescriptor;
use crate::enumeration::collect_descriptors;
use crate::error::{HidError, HidResult};
use crate::native::{NativeError, NativeHid};
use crate::session::{OpenTarget, Session};
use crate::state::LifecycleState;

/// Owner of the native HID library and its lifecycle state.
///
/// Enumeration and opening are only available between a successful
/// [`init`](Self::init) and [`shutdown`](Self::shutdown). Dropping a ready
/// context shuts it down.
///
/// The context is not internally synchronized; `init` and `shutdown` are
/// meant to be called from one controlled place.
#[derive(Debug)]
pub struct HidContext<B: NativeHid> {
    backend: B,
    state: LifecycleState,
    config: HidConfig,
}

impl<B: NativeHid> HidContext<B> {
    /// Context over `backend` with the default configuration.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: LifecycleState::Uninitialized,
            config: HidConfig::default(),
        }
    }

    /// Context over `backend` with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::InvalidConfiguration`] if `config` does not validate.
    pub fn with_config(backend: B, config: HidConfig) -> HidResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            state: LifecycleState::Uninitialized,
            config,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &HidConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Initialize the native library. Calling it again while ready is a no-op.
    ///
    /// # Errors
    ///
    /// [`HidError::AlreadyShutDown`] after shutdown, [`HidError::InitFailed`]
    /// when the native layer refuses (the state stays uninitialized).
    pub fn init(&mut self) -> HidResult<()> {
        let Some(next) = self.state.after_init() else {
            tracing::error!("HID library init called after shutdown");
            return Err(HidError::AlreadyShutDown { operation: "init" });
        };
        if self.state.is_ready() {
            debug!("HID library already initialized");
            return Ok(());
        }

        self.backend.init().map_err(|e| {
            warn!(error = %e, "HID library initialization failed");
            HidError::InitFailed(e.message().to_string())
        })?;
        self.state = next;
        info!("HID library initialized");
        Ok(())
    }

    /// Tear the library down. The context cannot be initialized again.
    pub fn shutdown(&mut self) {
        match self.state {
            LifecycleState::Ready => {
                self.backend.exit();
                info!("HID library shut down");
            }
            LifecycleState::Uninitialized => debug!("HID library shut down before init"),
            LifecycleState::ShutDown => return,
        }
        self.state = LifecycleState::ShutDown;
    }

    /// Snapshot of attached devices matching the filters. A filter of 0
    /// matches any vendor or product.
    ///
    /// # Errors
    ///
    /// Lifecycle errors outside the ready state, [`HidError::EnumerationFailed`]
    /// when the native enumeration fails.
    pub fn enumerate(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> HidResult<Vec<DeviceDescriptor>> {
        self.state.require_ready("enumerate")?;

        let list = self.backend.enumerate(vendor_id, product_id).map_err(|e| {
            warn!(vendor_id, product_id, error = %e, "HID enumeration failed");
            HidError::EnumerationFailed(e.message().to_string())
        })?;
        let descriptors =
            collect_descriptors(list, &self.config.codec(), &self.config.missing_path);
        debug!(vendor_id, product_id, count = descriptors.len(), "Enumerated HID devices");
        Ok(descriptors)
    }

    /// Open the first device with this vendor/product pair. When several
    /// devices share the pair, which one wins is up to the native layer.
    ///
    /// # Errors
    ///
    /// Lifecycle errors outside the ready state, [`HidError::OpenFailed`]
    /// naming the IDs when no device could be opened.
    pub fn open(&mut self, vendor_id: u16, product_id: u16) -> HidResult<Session<B::Device>> {
        self.state.require_ready("open")?;
        let target = OpenTarget::Ids {
            vendor_id,
            product_id,
        };
        let result = self.backend.open(vendor_id, product_id, None);
        self.finish_open(target, result)
    }

    /// Open the device with this vendor/product pair and serial number.
    ///
    /// # Errors
    ///
    /// Lifecycle errors outside the ready state, [`HidError::OpenFailed`]
    /// when no device could be opened.
    pub fn open_serial(
        &mut self,
        vendor_id: u16,
        product_id: u16,
        serial_number: &str,
    ) -> HidResult<Session<B::Device>> {
        self.state.require_ready("open_serial")?;
        let target = OpenTarget::Serial {
            vendor_id,
            product_id,
            serial_number: serial_number.to_string(),
        };
        let result = self
            .backend
            .open(vendor_id, product_id, Some(serial_number));
        self.finish_open(target, result)
    }

    /// Open the device at a platform path, usually taken from a
    /// [`DeviceDescriptor`].
    ///
    /// # Errors
    ///
    /// Lifecycle errors outside the ready state, [`HidError::OpenFailed`]
    /// naming the path when it cannot be opened.
    pub fn open_path(&mut self, path: &str) -> HidResult<Session<B::Device>> {
        self.state.require_ready("open_path")?;
        let target = OpenTarget::Path(path.to_string());
        let Ok(native_path) = CString::new(path) else {
            return Err(self.open_error(target, "path contains a NUL byte"));
        };
        let result = self.backend.open_path(&native_path);
        self.finish_open(target, result)
    }

    /// Open the device a descriptor points at, using the path bytes exactly
    /// as enumeration reported them.
    ///
    /// # Errors
    ///
    /// As [`Self::open_path`]; descriptors without a native path are rejected.
    pub fn open_descriptor(
        &mut self,
        descriptor: &DeviceDescriptor,
    ) -> HidResult<Session<B::Device>> {
        self.state.require_ready("open_path")?;
        let target = OpenTarget::Path(descriptor.path().to_string());
        let Some(native_path) = descriptor.native_path() else {
            return Err(self.open_error(target, "descriptor has no device path"));
        };
        let result = self.backend.open_path(native_path);
        self.finish_open(target, result)
    }

    fn finish_open(
        &self,
        target: OpenTarget,
        result: Result<B::Device, NativeError>,
    ) -> HidResult<Session<B::Device>> {
        match result {
            Ok(device) => {
                info!(target_device = %target, "HID session opened");
                Ok(Session::new(device, target, &self.config))
            }
            Err(e) => {
                let reason = if e.message().is_empty() {
                    self.config.fallback_error_message.clone()
                } else {
                    e.message().to_string()
                };
                Err(self.open_error(target, reason))
            }
        }
    }

    fn open_error(&self, target: OpenTarget, reason: impl Into<String>) -> HidError {
        let err = HidError::open_failed(target, reason);
        warn!(error = %err, state = %self.state, "HID open failed");
        err
    }
}

impl<B: NativeHid> Drop for HidContext<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

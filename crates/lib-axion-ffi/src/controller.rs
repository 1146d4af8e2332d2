//! Device-controller handles.

use crate::error::{AxError, AxResult};
use crate::ffi::{self, RawController};
use crate::handle::OwnedHandle;
use crate::loader::EngineLibrary;
use lib_types::{AdbControllerType, DeviceInfo};
use std::sync::Arc;

/// An engine controller driving one adb device.
///
/// Like [`Resource`], ownership moves into an [`Instance`] at bind time.
///
/// [`Resource`]: crate::resource::Resource
/// [`Instance`]: crate::instance::Instance
pub struct Controller {
    library: Arc<EngineLibrary>,
    handle: OwnedHandle,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller").field("handle", &self.handle).finish_non_exhaustive()
    }
}

impl Controller {
    /// Create a controller for an adb endpoint.
    ///
    /// `config` is an engine-defined JSON payload, passed through
    /// opaquely.
    pub fn new_adb(
        library: Arc<EngineLibrary>,
        adb_path: &str,
        serial: &str,
        controller_type: AdbControllerType,
        config: &str,
    ) -> AxResult<Self> {
        let c_path = ffi::to_cstring(adb_path, "adb_path")?;
        let c_serial = ffi::to_cstring(serial, "serial")?;
        let c_config = ffi::to_cstring(config, "config")?;

        let raw = unsafe {
            (library.api().controller_create_adb)(
                c_path.as_ptr(),
                c_serial.as_ptr(),
                controller_type.0,
                c_config.as_ptr(),
            )
        };
        if raw.is_null() {
            return Err(AxError::NativeRejected { operation: "controller creation" });
        }
        tracing::debug!(serial, "created adb controller");
        Ok(Self { library, handle: OwnedHandle::new(raw, "controller") })
    }

    /// Create a controller for a device surfaced by toolkit discovery.
    pub fn from_device(library: Arc<EngineLibrary>, device: &DeviceInfo) -> AxResult<Self> {
        Self::new_adb(
            library,
            &device.adb_path,
            &device.adb_serial,
            device.controller_type,
            &device.adb_config,
        )
    }

    /// Whether the native handle is still live.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub(crate) fn raw(&self) -> AxResult<RawController> {
        self.handle.get()
    }

    /// Release the native handle.
    ///
    /// Safe to call more than once; only the first call reaches the
    /// engine.
    pub fn release(&mut self) {
        if let Some(raw) = self.handle.invalidate() {
            unsafe { (self.library.api().controller_destroy)(raw) };
            tracing::debug!("released controller handle");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.release();
    }
}

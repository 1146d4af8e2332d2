//! Global toolkit facilities: init/uninit and device discovery.

use crate::error::{AxError, AxResult};
use crate::ffi;
use crate::list::ListView;
use crate::loader::EngineLibrary;
use lib_types::{AdbControllerType, DeviceInfo};
use std::sync::Arc;
use std::time::Duration;

/// Interval between polls of the scan-completed flag in `find_async`.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wrapper over the engine's global toolkit facilities.
///
/// Toolkit state is global to the loaded engine, not to this wrapper:
/// several `Toolkit` values over one library address the same native
/// state, and `uninit` tears it down for all of them.
pub struct Toolkit {
    library: Arc<EngineLibrary>,
}

impl Toolkit {
    pub fn new(library: Arc<EngineLibrary>) -> Self {
        Self { library }
    }

    /// Initialize global toolkit state.
    pub fn init(&self) -> AxResult<()> {
        if unsafe { (self.library.api().toolkit_init)() } == ffi::AX_FALSE {
            return Err(AxError::NativeRejected { operation: "toolkit init" });
        }
        tracing::debug!("toolkit initialized");
        Ok(())
    }

    /// Tear down global toolkit state.
    pub fn uninit(&self) -> AxResult<()> {
        if unsafe { (self.library.api().toolkit_uninit)() } == ffi::AX_FALSE {
            return Err(AxError::NativeRejected { operation: "toolkit uninit" });
        }
        tracing::debug!("toolkit uninitialized");
        Ok(())
    }

    /// Discover adb devices, blocking until the engine's scan completes.
    ///
    /// An empty `adb_path` scans every adb the engine knows about. Zero
    /// devices is an empty vec, not an error.
    pub fn find(&self, adb_path: &str) -> AxResult<Vec<DeviceInfo>> {
        self.post_find(adb_path)?;
        let count = unsafe { (self.library.api().toolkit_wait_for_find_device)() };
        tracing::debug!(count, "device scan complete");
        Ok(self.collect_devices())
    }

    /// Discover adb devices without blocking the runtime thread.
    ///
    /// Polls the engine's scan-completed flag cooperatively, yielding to
    /// the runtime between polls.
    pub async fn find_async(&self, adb_path: &str) -> AxResult<Vec<DeviceInfo>> {
        self.post_find(adb_path)?;
        while unsafe { (self.library.api().toolkit_find_device_completed)() } == ffi::AX_FALSE {
            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        }
        Ok(self.collect_devices())
    }

    fn post_find(&self, adb_path: &str) -> AxResult<()> {
        let posted = if adb_path.is_empty() {
            unsafe { (self.library.api().toolkit_post_find_device)() }
        } else {
            let c_path = ffi::to_cstring(adb_path, "adb_path")?;
            unsafe { (self.library.api().toolkit_post_find_device_with_adb)(c_path.as_ptr()) }
        };
        if posted == ffi::AX_FALSE {
            return Err(AxError::NativeRejected { operation: "device scan post" });
        }
        Ok(())
    }

    /// Materialize the engine's device table through the list cursor.
    fn collect_devices(&self) -> Vec<DeviceInfo> {
        let api = self.library.api();
        ListView::new(
            |i| unsafe {
                DeviceInfo {
                    name: ffi::read_string((api.toolkit_device_name)(i)),
                    adb_path: ffi::read_string((api.toolkit_device_adb_path)(i)),
                    adb_serial: ffi::read_string((api.toolkit_device_adb_serial)(i)),
                    adb_config: ffi::read_string((api.toolkit_device_adb_config)(i)),
                    controller_type: AdbControllerType(
                        (api.toolkit_device_controller_type)(i),
                    ),
                }
            },
            || unsafe { (api.toolkit_device_count)() },
        )
        .collect()
    }
}

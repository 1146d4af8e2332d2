//! Dynamic loading of the Axion engine shared library.
//!
//! Every engine entry point is resolved once at load time into a typed
//! symbol table; the safe wrappers call through the table for the
//! lifetime of the library.

use crate::error::{AxError, AxResult};
use crate::ffi::*;
use libloading::Library;
use std::path::Path;
use std::sync::Arc;

/// Resolved engine entry points.
///
/// Kept as one plain table of function pointers so tests can inject a
/// stub table without a shared library on disk.
#[derive(Clone, Copy)]
pub(crate) struct EngineApi {
    pub(crate) instance_create: InstanceCreateFn,
    pub(crate) instance_destroy: InstanceDestroyFn,
    pub(crate) instance_bind_resource: InstanceBindResourceFn,
    pub(crate) instance_bind_controller: InstanceBindControllerFn,
    pub(crate) instance_inited: InstanceInitedFn,
    pub(crate) instance_post_task: InstancePostTaskFn,
    pub(crate) instance_task_status: InstanceTaskStatusFn,
    pub(crate) instance_all_tasks_finished: InstanceAllTasksFinishedFn,
    pub(crate) instance_post_stop: InstancePostStopFn,
    pub(crate) register_recognizer: RegisterRecognizerFn,
    pub(crate) unregister_recognizer: UnregisterRecognizerFn,
    pub(crate) clear_recognizers: ClearRecognizersFn,
    pub(crate) register_action: RegisterActionFn,
    pub(crate) unregister_action: UnregisterActionFn,
    pub(crate) clear_actions: ClearActionsFn,
    pub(crate) resource_create: ResourceCreateFn,
    pub(crate) resource_destroy: ResourceDestroyFn,
    pub(crate) controller_create_adb: ControllerCreateAdbFn,
    pub(crate) controller_destroy: ControllerDestroyFn,
    pub(crate) toolkit_init: ToolkitInitFn,
    pub(crate) toolkit_uninit: ToolkitUninitFn,
    pub(crate) toolkit_post_find_device: ToolkitPostFindDeviceFn,
    pub(crate) toolkit_post_find_device_with_adb: ToolkitPostFindDeviceWithAdbFn,
    pub(crate) toolkit_find_device_completed: ToolkitFindDeviceCompletedFn,
    pub(crate) toolkit_wait_for_find_device: ToolkitWaitForFindDeviceFn,
    pub(crate) toolkit_device_count: ToolkitDeviceCountFn,
    pub(crate) toolkit_device_name: ToolkitDeviceStringFn,
    pub(crate) toolkit_device_adb_path: ToolkitDeviceStringFn,
    pub(crate) toolkit_device_adb_serial: ToolkitDeviceStringFn,
    pub(crate) toolkit_device_adb_config: ToolkitDeviceStringFn,
    pub(crate) toolkit_device_controller_type: ToolkitDeviceControllerTypeFn,
    pub(crate) version: VersionFn,
}

/// A loaded engine library with its resolved symbol table.
pub struct EngineLibrary {
    /// Keeps the shared library mapped for as long as any wrapper may
    /// call into it. `None` when the table was injected (tests).
    _library: Option<Library>,

    /// Path the library was loaded from, for diagnostics.
    pub path: String,

    api: EngineApi,
}

impl std::fmt::Debug for EngineLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLibrary").field("path", &self.path).finish_non_exhaustive()
    }
}

impl EngineLibrary {
    /// Load the engine from a shared library file.
    ///
    /// Fails with `Load` if the file cannot be mapped and with
    /// `SymbolNotFound` if any engine entry point is missing; a partially
    /// resolved engine is never handed out.
    pub fn load<P: AsRef<Path>>(path: P) -> AxResult<Arc<Self>> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let library =
            unsafe { Library::new(path) }.map_err(|e| AxError::load(&path_str, e))?;

        macro_rules! symbol {
            ($ty:ty, $name:literal) => {
                unsafe {
                    *library
                        .get::<$ty>(concat!($name, "\0").as_bytes())
                        .map_err(|_| AxError::symbol_not_found($name))?
                }
            };
        }

        let api = EngineApi {
            instance_create: symbol!(InstanceCreateFn, "AxInstanceCreate"),
            instance_destroy: symbol!(InstanceDestroyFn, "AxInstanceDestroy"),
            instance_bind_resource: symbol!(InstanceBindResourceFn, "AxInstanceBindResource"),
            instance_bind_controller: symbol!(
                InstanceBindControllerFn,
                "AxInstanceBindController"
            ),
            instance_inited: symbol!(InstanceInitedFn, "AxInstanceInited"),
            instance_post_task: symbol!(InstancePostTaskFn, "AxInstancePostTask"),
            instance_task_status: symbol!(InstanceTaskStatusFn, "AxInstanceTaskStatus"),
            instance_all_tasks_finished: symbol!(
                InstanceAllTasksFinishedFn,
                "AxInstanceAllTasksFinished"
            ),
            instance_post_stop: symbol!(InstancePostStopFn, "AxInstancePostStop"),
            register_recognizer: symbol!(
                RegisterRecognizerFn,
                "AxInstanceRegisterCustomRecognizer"
            ),
            unregister_recognizer: symbol!(
                UnregisterRecognizerFn,
                "AxInstanceUnregisterCustomRecognizer"
            ),
            clear_recognizers: symbol!(ClearRecognizersFn, "AxInstanceClearCustomRecognizers"),
            register_action: symbol!(RegisterActionFn, "AxInstanceRegisterCustomAction"),
            unregister_action: symbol!(UnregisterActionFn, "AxInstanceUnregisterCustomAction"),
            clear_actions: symbol!(ClearActionsFn, "AxInstanceClearCustomActions"),
            resource_create: symbol!(ResourceCreateFn, "AxResourceCreate"),
            resource_destroy: symbol!(ResourceDestroyFn, "AxResourceDestroy"),
            controller_create_adb: symbol!(ControllerCreateAdbFn, "AxControllerCreateAdb"),
            controller_destroy: symbol!(ControllerDestroyFn, "AxControllerDestroy"),
            toolkit_init: symbol!(ToolkitInitFn, "AxToolkitInit"),
            toolkit_uninit: symbol!(ToolkitUninitFn, "AxToolkitUninit"),
            toolkit_post_find_device: symbol!(ToolkitPostFindDeviceFn, "AxToolkitPostFindDevice"),
            toolkit_post_find_device_with_adb: symbol!(
                ToolkitPostFindDeviceWithAdbFn,
                "AxToolkitPostFindDeviceWithAdb"
            ),
            toolkit_find_device_completed: symbol!(
                ToolkitFindDeviceCompletedFn,
                "AxToolkitIsFindDeviceCompleted"
            ),
            toolkit_wait_for_find_device: symbol!(
                ToolkitWaitForFindDeviceFn,
                "AxToolkitWaitForFindDeviceToComplete"
            ),
            toolkit_device_count: symbol!(ToolkitDeviceCountFn, "AxToolkitGetDeviceCount"),
            toolkit_device_name: symbol!(ToolkitDeviceStringFn, "AxToolkitGetDeviceName"),
            toolkit_device_adb_path: symbol!(ToolkitDeviceStringFn, "AxToolkitGetDeviceAdbPath"),
            toolkit_device_adb_serial: symbol!(
                ToolkitDeviceStringFn,
                "AxToolkitGetDeviceAdbSerial"
            ),
            toolkit_device_adb_config: symbol!(
                ToolkitDeviceStringFn,
                "AxToolkitGetDeviceAdbConfig"
            ),
            toolkit_device_controller_type: symbol!(
                ToolkitDeviceControllerTypeFn,
                "AxToolkitGetDeviceAdbControllerType"
            ),
            version: symbol!(VersionFn, "AxVersion"),
        };

        tracing::info!(path = %path_str, "loaded engine library");

        Ok(Arc::new(Self { _library: Some(library), path: path_str, api }))
    }

    /// Load the engine from a directory using the platform's library
    /// file name (`libaxion.so`, `axion.dll`, `libaxion.dylib`).
    pub fn load_default<P: AsRef<Path>>(dir: P) -> AxResult<Arc<Self>> {
        Self::load(dir.as_ref().join(LibraryFormat::native().file_name("axion")))
    }

    /// Build a library around an already-resolved symbol table.
    ///
    /// Test seam; keeps no shared library mapped.
    #[cfg(test)]
    pub(crate) fn from_api(api: EngineApi) -> Arc<Self> {
        Arc::new(Self { _library: None, path: "<injected>".to_string(), api })
    }

    pub(crate) fn api(&self) -> &EngineApi {
        &self.api
    }
}

/// Platform-specific shared-library format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryFormat {
    /// Windows DLL.
    Dll,
    /// Linux/Unix shared object.
    So,
    /// macOS dynamic library.
    Dylib,
    /// Unknown format.
    Unknown,
}

impl LibraryFormat {
    /// Detect format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("dll") | Some("DLL") => Self::Dll,
            Some("so") => Self::So,
            Some("dylib") => Self::Dylib,
            _ => Self::Unknown,
        }
    }

    /// The format native to the current platform.
    #[cfg(target_os = "windows")]
    pub fn native() -> Self {
        Self::Dll
    }

    #[cfg(target_os = "linux")]
    pub fn native() -> Self {
        Self::So
    }

    #[cfg(target_os = "macos")]
    pub fn native() -> Self {
        Self::Dylib
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    pub fn native() -> Self {
        Self::Unknown
    }

    /// File name for a library stem in this format, e.g. `libaxion.so`.
    pub fn file_name(&self, stem: &str) -> String {
        match self {
            Self::Dll => format!("{stem}.dll"),
            Self::So => format!("lib{stem}.so"),
            Self::Dylib => format!("lib{stem}.dylib"),
            Self::Unknown => stem.to_string(),
        }
    }
}

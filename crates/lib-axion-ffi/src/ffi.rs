//! Raw ABI surface of the Axion engine.
//!
//! Everything here mirrors the C header shipped with the engine; none of
//! it is safe to call directly. The safe wrappers live in the sibling
//! modules.

use crate::error::{AxError, AxResult};
use lib_types::Rect;
use std::ffi::{c_char, c_void, CStr, CString};

/// Opaque engine instance handle.
pub type RawInstance = *mut c_void;

/// Opaque resource-bundle handle.
pub type RawResource = *mut c_void;

/// Opaque device-controller handle.
pub type RawController = *mut c_void;

/// Scheduler-assigned task identifier.
pub type RawTaskId = i64;

/// The id returned when a post could not be enqueued.
pub const INVALID_TASK_ID: RawTaskId = 0;

/// Engine boolean: nonzero is true.
pub type AxBool = i32;

/// Engine true.
pub const AX_TRUE: AxBool = 1;

/// Engine false.
pub const AX_FALSE: AxBool = 0;

/// Rectangle exchanged with custom-task callbacks.
///
/// ```c
/// typedef struct AxRect {
///     int32_t x;
///     int32_t y;
///     int32_t width;
///     int32_t height;
/// } AxRect;
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct AxRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<Rect> for AxRect {
    fn from(r: Rect) -> Self {
        Self { x: r.x, y: r.y, width: r.width, height: r.height }
    }
}

impl From<AxRect> for Rect {
    fn from(r: AxRect) -> Self {
        Self { x: r.x, y: r.y, width: r.width, height: r.height }
    }
}

/// Custom recognizer entry point.
///
/// ```c
/// AxBool AxCustomRecognizerAnalyze(
///     const char* task_name,
///     const char* recognition_param,
///     void*       user_data,
///     AxRect*     out_box,
///     char*       out_detail,
///     uint64_t    detail_capacity);
/// ```
///
/// `out_detail` is a caller-owned buffer of `detail_capacity` bytes; the
/// callee writes a NUL-terminated UTF-8 payload into it.
pub type RecognizerAnalyzeFn = unsafe extern "C" fn(
    task_name: *const c_char,
    recognition_param: *const c_char,
    user_data: *mut c_void,
    out_box: *mut AxRect,
    out_detail: *mut c_char,
    detail_capacity: u64,
) -> AxBool;

/// Custom action entry point.
///
/// ```c
/// AxBool AxCustomActionRun(
///     const char*   task_name,
///     const char*   action_param,
///     const AxRect* cur_box,
///     const char*   cur_detail,
///     void*         user_data);
/// ```
pub type ActionRunFn = unsafe extern "C" fn(
    task_name: *const c_char,
    action_param: *const c_char,
    cur_box: *const AxRect,
    cur_detail: *const c_char,
    user_data: *mut c_void,
) -> AxBool;

// Engine entry points, in header order.

/// `AxInstance* AxInstanceCreate(void);`
pub type InstanceCreateFn = unsafe extern "C" fn() -> RawInstance;

/// `void AxInstanceDestroy(AxInstance*);`
pub type InstanceDestroyFn = unsafe extern "C" fn(RawInstance);

/// `AxBool AxInstanceBindResource(AxInstance*, AxResource*);`
pub type InstanceBindResourceFn = unsafe extern "C" fn(RawInstance, RawResource) -> AxBool;

/// `AxBool AxInstanceBindController(AxInstance*, AxController*);`
pub type InstanceBindControllerFn = unsafe extern "C" fn(RawInstance, RawController) -> AxBool;

/// `AxBool AxInstanceInited(AxInstance*);`
pub type InstanceInitedFn = unsafe extern "C" fn(RawInstance) -> AxBool;

/// `AxTaskId AxInstancePostTask(AxInstance*, const char* entry, const char* params);`
pub type InstancePostTaskFn =
    unsafe extern "C" fn(RawInstance, *const c_char, *const c_char) -> RawTaskId;

/// `int32_t AxInstanceTaskStatus(AxInstance*, AxTaskId);`
pub type InstanceTaskStatusFn = unsafe extern "C" fn(RawInstance, RawTaskId) -> i32;

/// `AxBool AxInstanceAllTasksFinished(AxInstance*);`
pub type InstanceAllTasksFinishedFn = unsafe extern "C" fn(RawInstance) -> AxBool;

/// `AxBool AxInstancePostStop(AxInstance*);`
pub type InstancePostStopFn = unsafe extern "C" fn(RawInstance) -> AxBool;

/// `AxBool AxInstanceRegisterCustomRecognizer(AxInstance*, const char* name,
///      AxCustomRecognizerAnalyze, void* user_data);`
pub type RegisterRecognizerFn =
    unsafe extern "C" fn(RawInstance, *const c_char, RecognizerAnalyzeFn, *mut c_void) -> AxBool;

/// `AxBool AxInstanceUnregisterCustomRecognizer(AxInstance*, const char* name);`
pub type UnregisterRecognizerFn = unsafe extern "C" fn(RawInstance, *const c_char) -> AxBool;

/// `AxBool AxInstanceClearCustomRecognizers(AxInstance*);`
pub type ClearRecognizersFn = unsafe extern "C" fn(RawInstance) -> AxBool;

/// `AxBool AxInstanceRegisterCustomAction(AxInstance*, const char* name,
///      AxCustomActionRun, void* user_data);`
pub type RegisterActionFn =
    unsafe extern "C" fn(RawInstance, *const c_char, ActionRunFn, *mut c_void) -> AxBool;

/// `AxBool AxInstanceUnregisterCustomAction(AxInstance*, const char* name);`
pub type UnregisterActionFn = unsafe extern "C" fn(RawInstance, *const c_char) -> AxBool;

/// `AxBool AxInstanceClearCustomActions(AxInstance*);`
pub type ClearActionsFn = unsafe extern "C" fn(RawInstance) -> AxBool;

/// `AxResource* AxResourceCreate(void);`
pub type ResourceCreateFn = unsafe extern "C" fn() -> RawResource;

/// `void AxResourceDestroy(AxResource*);`
pub type ResourceDestroyFn = unsafe extern "C" fn(RawResource);

/// `AxController* AxControllerCreateAdb(const char* adb_path, const char* serial,
///      int32_t controller_type, const char* config);`
pub type ControllerCreateAdbFn =
    unsafe extern "C" fn(*const c_char, *const c_char, i32, *const c_char) -> RawController;

/// `void AxControllerDestroy(AxController*);`
pub type ControllerDestroyFn = unsafe extern "C" fn(RawController);

/// `AxBool AxToolkitInit(void);`
pub type ToolkitInitFn = unsafe extern "C" fn() -> AxBool;

/// `AxBool AxToolkitUninit(void);`
pub type ToolkitUninitFn = unsafe extern "C" fn() -> AxBool;

/// `AxBool AxToolkitPostFindDevice(void);`
pub type ToolkitPostFindDeviceFn = unsafe extern "C" fn() -> AxBool;

/// `AxBool AxToolkitPostFindDeviceWithAdb(const char* adb_path);`
pub type ToolkitPostFindDeviceWithAdbFn = unsafe extern "C" fn(*const c_char) -> AxBool;

/// `AxBool AxToolkitIsFindDeviceCompleted(void);`
pub type ToolkitFindDeviceCompletedFn = unsafe extern "C" fn() -> AxBool;

/// `uint64_t AxToolkitWaitForFindDeviceToComplete(void);`
pub type ToolkitWaitForFindDeviceFn = unsafe extern "C" fn() -> u64;

/// `uint64_t AxToolkitGetDeviceCount(void);`
pub type ToolkitDeviceCountFn = unsafe extern "C" fn() -> u64;

/// `const char* AxToolkitGetDevice{Name,AdbPath,AdbSerial,AdbConfig}(uint64_t index);`
pub type ToolkitDeviceStringFn = unsafe extern "C" fn(u64) -> *const c_char;

/// `int32_t AxToolkitGetDeviceAdbControllerType(uint64_t index);`
pub type ToolkitDeviceControllerTypeFn = unsafe extern "C" fn(u64) -> i32;

/// `const char* AxVersion(void);`
pub type VersionFn = unsafe extern "C" fn() -> *const c_char;

/// Copy a NUL-terminated engine string, empty when NULL.
///
/// Engine strings may point at reusable static storage: read once and
/// copy immediately, never hold the pointer. Invalid UTF-8 is replaced
/// rather than rejected.
///
/// # Safety
///
/// `ptr` must be NULL or point to a valid NUL-terminated C string.
pub(crate) unsafe fn read_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Convert a host string for the boundary, rejecting interior NUL bytes
/// before any native call is made.
pub(crate) fn to_cstring(value: &str, name: &'static str) -> AxResult<CString> {
    CString::new(value).map_err(|_| AxError::invalid_parameter(name, "contains a NUL byte"))
}

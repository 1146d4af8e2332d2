//! In-process fake engine for exercising the boundary contract in tests.
//!
//! The fake lives in thread-local state so parallel tests cannot
//! interfere with each other; every stub below therefore assumes the
//! test body and the wrappers it drives stay on one thread. The async
//! tests run on current-thread runtimes for the same reason.

use crate::ffi::*;
use crate::loader::{EngineApi, EngineLibrary};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CString};
use std::sync::Arc;

/// Observable native-side events, recorded in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    InstanceCreate,
    InstanceDestroy,
    ResourceCreate,
    ResourceDestroy,
    ControllerCreate,
    ControllerDestroy,
    BindResource,
    BindController,
    PostTask(String),
    PostStop,
    RegisterRecognizer(String),
    UnregisterRecognizer(String),
    ClearRecognizers,
    RegisterAction(String),
    UnregisterAction(String),
    ClearActions,
    ToolkitInit,
    ToolkitUninit,
    PostFindDevice,
}

/// A recognizer slot as the engine retains it.
#[derive(Clone, Copy)]
pub(crate) struct RecognizerSlot {
    pub(crate) callback: RecognizerAnalyzeFn,
    pub(crate) user_data: usize,
}

/// An action slot as the engine retains it.
#[derive(Clone, Copy)]
pub(crate) struct ActionSlot {
    pub(crate) callback: ActionRunFn,
    pub(crate) user_data: usize,
}

struct FakeDevice {
    name: CString,
    adb_path: CString,
    adb_serial: CString,
    adb_config: CString,
    controller_type: i32,
}

struct FakeTask {
    /// Status polls left before the task reaches its outcome.
    remaining_polls: u32,
    outcome: i32,
}

#[derive(Default)]
struct InstanceState {
    resource_bound: bool,
    controller_bound: bool,
}

/// The whole fake engine, one per test thread.
pub(crate) struct FakeState {
    next_handle: usize,
    next_task_id: i64,
    instances: HashMap<usize, InstanceState>,

    pub(crate) fail_instance_create: bool,
    pub(crate) fail_resource_create: bool,
    pub(crate) fail_controller_create: bool,
    pub(crate) reject_bind_resource: bool,
    pub(crate) reject_bind_controller: bool,
    pub(crate) reject_posts: bool,
    pub(crate) reject_register: bool,
    pub(crate) reject_scan: bool,

    /// Polls a freshly posted task runs for before completing.
    pub(crate) task_countdown: u32,
    /// Status code a task completes with.
    pub(crate) task_outcome: i32,
    tasks: HashMap<(usize, i64), FakeTask>,

    pub(crate) recognizers: HashMap<String, RecognizerSlot>,
    pub(crate) actions: HashMap<String, ActionSlot>,

    devices: Vec<FakeDevice>,
    /// Completed-flag polls a device scan stays pending for.
    pub(crate) scan_countdown: u32,
    scan_polls_remaining: u32,

    events: Vec<Event>,
    version: CString,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            next_handle: 1,
            next_task_id: 1,
            instances: HashMap::new(),
            fail_instance_create: false,
            fail_resource_create: false,
            fail_controller_create: false,
            reject_bind_resource: false,
            reject_bind_controller: false,
            reject_posts: false,
            reject_register: false,
            reject_scan: false,
            task_countdown: 2,
            task_outcome: 3000,
            tasks: HashMap::new(),
            recognizers: HashMap::new(),
            actions: HashMap::new(),
            devices: Vec::new(),
            scan_countdown: 0,
            scan_polls_remaining: 0,
            events: Vec::new(),
            version: CString::new("1.4.2").unwrap(),
        }
    }
}

impl FakeState {
    fn alloc_handle(&mut self) -> usize {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Fresh fake engine wrapped as an injected library.
pub(crate) fn engine() -> Arc<EngineLibrary> {
    reset();
    EngineLibrary::from_api(api())
}

/// Reset this thread's fake to its defaults.
pub(crate) fn reset() {
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
}

/// Inspect or reconfigure this thread's fake.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Snapshot of the native-side event log.
pub(crate) fn events() -> Vec<Event> {
    with_state(|s| s.events.clone())
}

/// Add a device to the fake's discovery table.
pub(crate) fn add_device(name: &str, adb_path: &str, serial: &str, config: &str, controller_type: i32) {
    with_state(|s| {
        s.devices.push(FakeDevice {
            name: CString::new(name).unwrap(),
            adb_path: CString::new(adb_path).unwrap(),
            adb_serial: CString::new(serial).unwrap(),
            adb_config: CString::new(config).unwrap(),
            controller_type,
        })
    });
}

/// Opt-in log output for debugging tests (`RUST_LOG=debug`).
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Symbol table of the fake engine.
pub(crate) fn api() -> EngineApi {
    EngineApi {
        instance_create: stub_instance_create,
        instance_destroy: stub_instance_destroy,
        instance_bind_resource: stub_bind_resource,
        instance_bind_controller: stub_bind_controller,
        instance_inited: stub_instance_inited,
        instance_post_task: stub_post_task,
        instance_task_status: stub_task_status,
        instance_all_tasks_finished: stub_all_tasks_finished,
        instance_post_stop: stub_post_stop,
        register_recognizer: stub_register_recognizer,
        unregister_recognizer: stub_unregister_recognizer,
        clear_recognizers: stub_clear_recognizers,
        register_action: stub_register_action,
        unregister_action: stub_unregister_action,
        clear_actions: stub_clear_actions,
        resource_create: stub_resource_create,
        resource_destroy: stub_resource_destroy,
        controller_create_adb: stub_controller_create_adb,
        controller_destroy: stub_controller_destroy,
        toolkit_init: stub_toolkit_init,
        toolkit_uninit: stub_toolkit_uninit,
        toolkit_post_find_device: stub_post_find_device,
        toolkit_post_find_device_with_adb: stub_post_find_device_with_adb,
        toolkit_find_device_completed: stub_find_device_completed,
        toolkit_wait_for_find_device: stub_wait_for_find_device,
        toolkit_device_count: stub_device_count,
        toolkit_device_name: stub_device_name,
        toolkit_device_adb_path: stub_device_adb_path,
        toolkit_device_adb_serial: stub_device_adb_serial,
        toolkit_device_adb_config: stub_device_adb_config,
        toolkit_device_controller_type: stub_device_controller_type,
        version: stub_version,
    }
}

unsafe extern "C" fn stub_instance_create() -> RawInstance {
    with_state(|s| {
        s.events.push(Event::InstanceCreate);
        if s.fail_instance_create {
            return std::ptr::null_mut();
        }
        let h = s.alloc_handle();
        s.instances.insert(h, InstanceState::default());
        h as RawInstance
    })
}

unsafe extern "C" fn stub_instance_destroy(instance: RawInstance) {
    with_state(|s| {
        s.events.push(Event::InstanceDestroy);
        s.instances.remove(&(instance as usize));
    })
}

unsafe extern "C" fn stub_bind_resource(instance: RawInstance, _resource: RawResource) -> AxBool {
    with_state(|s| {
        s.events.push(Event::BindResource);
        if s.reject_bind_resource {
            return AX_FALSE;
        }
        match s.instances.get_mut(&(instance as usize)) {
            Some(state) => {
                state.resource_bound = true;
                AX_TRUE
            }
            None => AX_FALSE,
        }
    })
}

unsafe extern "C" fn stub_bind_controller(
    instance: RawInstance,
    _controller: RawController,
) -> AxBool {
    with_state(|s| {
        s.events.push(Event::BindController);
        if s.reject_bind_controller {
            return AX_FALSE;
        }
        match s.instances.get_mut(&(instance as usize)) {
            Some(state) => {
                state.controller_bound = true;
                AX_TRUE
            }
            None => AX_FALSE,
        }
    })
}

unsafe extern "C" fn stub_instance_inited(instance: RawInstance) -> AxBool {
    with_state(|s| match s.instances.get(&(instance as usize)) {
        Some(state) if state.resource_bound && state.controller_bound => AX_TRUE,
        _ => AX_FALSE,
    })
}

unsafe extern "C" fn stub_post_task(
    instance: RawInstance,
    entry: *const c_char,
    _params: *const c_char,
) -> RawTaskId {
    let entry = unsafe { crate::ffi::read_string(entry) };
    with_state(|s| {
        s.events.push(Event::PostTask(entry));
        if s.reject_posts || !s.instances.contains_key(&(instance as usize)) {
            return INVALID_TASK_ID;
        }
        let id = s.next_task_id;
        s.next_task_id += 1;
        let task = FakeTask { remaining_polls: s.task_countdown, outcome: s.task_outcome };
        s.tasks.insert((instance as usize, id), task);
        id
    })
}

unsafe extern "C" fn stub_task_status(instance: RawInstance, id: RawTaskId) -> i32 {
    with_state(|s| match s.tasks.get_mut(&(instance as usize, id)) {
        Some(task) if task.remaining_polls > 0 => {
            task.remaining_polls -= 1;
            2000
        }
        Some(task) => task.outcome,
        None => 0,
    })
}

unsafe extern "C" fn stub_all_tasks_finished(instance: RawInstance) -> AxBool {
    with_state(|s| {
        let finished = s
            .tasks
            .iter()
            .filter(|((owner, _), _)| *owner == instance as usize)
            .all(|(_, task)| task.remaining_polls == 0);
        if finished {
            AX_TRUE
        } else {
            AX_FALSE
        }
    })
}

unsafe extern "C" fn stub_post_stop(instance: RawInstance) -> AxBool {
    with_state(|s| {
        s.events.push(Event::PostStop);
        for ((owner, _), task) in s.tasks.iter_mut() {
            if *owner == instance as usize {
                task.remaining_polls = 0;
                task.outcome = 5000;
            }
        }
        AX_TRUE
    })
}

unsafe extern "C" fn stub_register_recognizer(
    _instance: RawInstance,
    name: *const c_char,
    callback: RecognizerAnalyzeFn,
    user_data: *mut c_void,
) -> AxBool {
    let name = unsafe { crate::ffi::read_string(name) };
    with_state(|s| {
        s.events.push(Event::RegisterRecognizer(name.clone()));
        if s.reject_register {
            return AX_FALSE;
        }
        s.recognizers
            .insert(name, RecognizerSlot { callback, user_data: user_data as usize });
        AX_TRUE
    })
}

unsafe extern "C" fn stub_unregister_recognizer(
    _instance: RawInstance,
    name: *const c_char,
) -> AxBool {
    let name = unsafe { crate::ffi::read_string(name) };
    with_state(|s| {
        s.events.push(Event::UnregisterRecognizer(name.clone()));
        if s.recognizers.remove(&name).is_some() {
            AX_TRUE
        } else {
            AX_FALSE
        }
    })
}

unsafe extern "C" fn stub_clear_recognizers(_instance: RawInstance) -> AxBool {
    with_state(|s| {
        s.events.push(Event::ClearRecognizers);
        s.recognizers.clear();
        AX_TRUE
    })
}

unsafe extern "C" fn stub_register_action(
    _instance: RawInstance,
    name: *const c_char,
    callback: ActionRunFn,
    user_data: *mut c_void,
) -> AxBool {
    let name = unsafe { crate::ffi::read_string(name) };
    with_state(|s| {
        s.events.push(Event::RegisterAction(name.clone()));
        if s.reject_register {
            return AX_FALSE;
        }
        s.actions.insert(name, ActionSlot { callback, user_data: user_data as usize });
        AX_TRUE
    })
}

unsafe extern "C" fn stub_unregister_action(_instance: RawInstance, name: *const c_char) -> AxBool {
    let name = unsafe { crate::ffi::read_string(name) };
    with_state(|s| {
        s.events.push(Event::UnregisterAction(name.clone()));
        if s.actions.remove(&name).is_some() {
            AX_TRUE
        } else {
            AX_FALSE
        }
    })
}

unsafe extern "C" fn stub_clear_actions(_instance: RawInstance) -> AxBool {
    with_state(|s| {
        s.events.push(Event::ClearActions);
        s.actions.clear();
        AX_TRUE
    })
}

unsafe extern "C" fn stub_resource_create() -> RawResource {
    with_state(|s| {
        s.events.push(Event::ResourceCreate);
        if s.fail_resource_create {
            return std::ptr::null_mut();
        }
        s.alloc_handle() as RawResource
    })
}

unsafe extern "C" fn stub_resource_destroy(_resource: RawResource) {
    with_state(|s| s.events.push(Event::ResourceDestroy));
}

unsafe extern "C" fn stub_controller_create_adb(
    _adb_path: *const c_char,
    _serial: *const c_char,
    _controller_type: i32,
    _config: *const c_char,
) -> RawController {
    with_state(|s| {
        s.events.push(Event::ControllerCreate);
        if s.fail_controller_create {
            return std::ptr::null_mut();
        }
        s.alloc_handle() as RawController
    })
}

unsafe extern "C" fn stub_controller_destroy(_controller: RawController) {
    with_state(|s| s.events.push(Event::ControllerDestroy));
}

unsafe extern "C" fn stub_toolkit_init() -> AxBool {
    with_state(|s| {
        s.events.push(Event::ToolkitInit);
        AX_TRUE
    })
}

unsafe extern "C" fn stub_toolkit_uninit() -> AxBool {
    with_state(|s| {
        s.events.push(Event::ToolkitUninit);
        AX_TRUE
    })
}

unsafe extern "C" fn stub_post_find_device() -> AxBool {
    with_state(|s| {
        s.events.push(Event::PostFindDevice);
        if s.reject_scan {
            return AX_FALSE;
        }
        s.scan_polls_remaining = s.scan_countdown;
        AX_TRUE
    })
}

unsafe extern "C" fn stub_post_find_device_with_adb(_adb_path: *const c_char) -> AxBool {
    unsafe { stub_post_find_device() }
}

unsafe extern "C" fn stub_find_device_completed() -> AxBool {
    with_state(|s| {
        if s.scan_polls_remaining > 0 {
            s.scan_polls_remaining -= 1;
            AX_FALSE
        } else {
            AX_TRUE
        }
    })
}

unsafe extern "C" fn stub_wait_for_find_device() -> u64 {
    with_state(|s| {
        s.scan_polls_remaining = 0;
        s.devices.len() as u64
    })
}

unsafe extern "C" fn stub_device_count() -> u64 {
    with_state(|s| s.devices.len() as u64)
}

unsafe extern "C" fn stub_device_name(index: u64) -> *const c_char {
    with_state(|s| {
        s.devices.get(index as usize).map_or(std::ptr::null(), |d| d.name.as_ptr())
    })
}

unsafe extern "C" fn stub_device_adb_path(index: u64) -> *const c_char {
    with_state(|s| {
        s.devices.get(index as usize).map_or(std::ptr::null(), |d| d.adb_path.as_ptr())
    })
}

unsafe extern "C" fn stub_device_adb_serial(index: u64) -> *const c_char {
    with_state(|s| {
        s.devices.get(index as usize).map_or(std::ptr::null(), |d| d.adb_serial.as_ptr())
    })
}

unsafe extern "C" fn stub_device_adb_config(index: u64) -> *const c_char {
    with_state(|s| {
        s.devices.get(index as usize).map_or(std::ptr::null(), |d| d.adb_config.as_ptr())
    })
}

unsafe extern "C" fn stub_device_controller_type(index: u64) -> i32 {
    with_state(|s| s.devices.get(index as usize).map_or(0, |d| d.controller_type))
}

unsafe extern "C" fn stub_version() -> *const c_char {
    with_state(|s| s.version.as_ptr())
}

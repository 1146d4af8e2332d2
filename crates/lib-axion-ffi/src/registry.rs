//! Host-implemented custom tasks and the native callback plumbing.
//!
//! The engine lets the host install its own recognizers and actions into
//! named callback slots, then invokes them from its own worker threads.
//! The registry is the ownership table for those installations: the
//! engine retains the raw callback pointer and `user_data` for as long as
//! a slot is installed, so every binding must stay allocated, at a stable
//! address, until the slot is removed.

use crate::error::{AxError, AxResult};
use crate::ffi::{self, AxBool, AxRect, RawInstance, AX_FALSE, AX_TRUE};
use crate::loader::EngineLibrary;
use lib_types::Rect;
use std::any::Any;
use std::collections::HashMap;
use std::ffi::{c_char, c_void};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Capability kind of a custom task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Analyzes a frame and reports a hit box plus detail.
    Recognizer,
    /// Acts on a preceding recognition result.
    Action,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recognizer => "recognizer",
            Self::Action => "action",
        })
    }
}

/// Result of a successful recognizer analysis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Where the recognizer hit, in screen pixels.
    pub hit_box: Rect,

    /// Detail payload handed to downstream actions, carried opaquely.
    pub detail: String,
}

/// A host-implemented recognizer.
///
/// Invoked by the engine on its own worker threads: implementations must
/// be `Send + Sync` and must not assume exclusive access to shared host
/// state without their own synchronization.
pub trait CustomRecognizer: Send + Sync {
    /// Slot name used when registering without an explicit name.
    fn name(&self) -> &str;

    /// Analyze the current frame for `task_name`.
    ///
    /// Returns `None` when nothing matched. A panic is caught at the
    /// boundary and reported to the engine as a failed analysis.
    fn analyze(&self, task_name: &str, recognition_param: &str) -> Option<Analysis>;
}

/// A host-implemented action.
///
/// Same threading contract as [`CustomRecognizer`].
pub trait CustomAction: Send + Sync {
    /// Slot name used when registering without an explicit name.
    fn name(&self) -> &str;

    /// Run the action against the box and detail produced by the
    /// preceding recognition. Returns whether the action succeeded.
    fn run(&self, task_name: &str, action_param: &str, hit_box: Rect, detail: &str) -> bool;
}

/// A custom task of either capability.
#[derive(Clone)]
pub enum CustomTask {
    Recognizer(Arc<dyn CustomRecognizer>),
    Action(Arc<dyn CustomAction>),
}

impl CustomTask {
    /// Capability kind of the wrapped implementation.
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Recognizer(_) => TaskKind::Recognizer,
            Self::Action(_) => TaskKind::Action,
        }
    }

    /// Default slot name of the wrapped implementation.
    pub fn name(&self) -> &str {
        match self {
            Self::Recognizer(r) => r.name(),
            Self::Action(a) => a.name(),
        }
    }
}

/// What the engine holds while a recognizer slot is installed.
///
/// Boxed by the registry so the `user_data` pointer handed to the engine
/// stays stable while the table rehashes.
struct RecognizerBinding {
    imp: Arc<dyn CustomRecognizer>,
}

/// What the engine holds while an action slot is installed.
struct ActionBinding {
    imp: Arc<dyn CustomAction>,
}

enum Binding {
    Recognizer(Box<RecognizerBinding>),
    Action(Box<ActionBinding>),
}

/// Native entry point for recognizer slots.
///
/// Decodes the native argument buffers, runs the host recognizer, and
/// encodes the result into the engine-owned out-buffers. Panics from host
/// code are caught here: unwinding across the ABI would be undefined
/// behavior for the native caller.
unsafe extern "C" fn recognizer_trampoline(
    task_name: *const c_char,
    recognition_param: *const c_char,
    user_data: *mut c_void,
    out_box: *mut AxRect,
    out_detail: *mut c_char,
    detail_capacity: u64,
) -> AxBool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let binding = unsafe { &*(user_data as *const RecognizerBinding) };
        let task = unsafe { ffi::read_string(task_name) };
        let param = unsafe { ffi::read_string(recognition_param) };
        binding.imp.analyze(&task, &param)
    }));

    match outcome {
        Ok(Some(analysis)) => {
            if !out_box.is_null() {
                unsafe { *out_box = analysis.hit_box.into() };
            }
            unsafe { write_detail(out_detail, detail_capacity, &analysis.detail) };
            AX_TRUE
        }
        Ok(None) => AX_FALSE,
        Err(payload) => {
            tracing::error!(
                fault = panic_message(payload.as_ref()),
                "recognizer panicked; reporting failure to the engine"
            );
            AX_FALSE
        }
    }
}

/// Native entry point for action slots.
unsafe extern "C" fn action_trampoline(
    task_name: *const c_char,
    action_param: *const c_char,
    cur_box: *const AxRect,
    cur_detail: *const c_char,
    user_data: *mut c_void,
) -> AxBool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let binding = unsafe { &*(user_data as *const ActionBinding) };
        let task = unsafe { ffi::read_string(task_name) };
        let param = unsafe { ffi::read_string(action_param) };
        let hit_box = if cur_box.is_null() {
            Rect::default()
        } else {
            unsafe { *cur_box }.into()
        };
        let detail = unsafe { ffi::read_string(cur_detail) };
        binding.imp.run(&task, &param, hit_box, &detail)
    }));

    match outcome {
        Ok(true) => AX_TRUE,
        Ok(false) => AX_FALSE,
        Err(payload) => {
            tracing::error!(
                fault = panic_message(payload.as_ref()),
                "action panicked; reporting failure to the engine"
            );
            AX_FALSE
        }
    }
}

/// Copy `detail` into a caller-owned buffer of `capacity` bytes,
/// truncating on a char boundary and always NUL-terminating. A NULL or
/// zero-capacity buffer is left untouched.
///
/// # Safety
///
/// `buf` must be NULL or valid for writes of `capacity` bytes.
unsafe fn write_detail(buf: *mut c_char, capacity: u64, detail: &str) {
    if buf.is_null() || capacity == 0 {
        return;
    }
    let max = (capacity - 1).min(detail.len() as u64) as usize;
    let mut end = max;
    while end > 0 && !detail.is_char_boundary(end) {
        end -= 1;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(detail.as_ptr(), buf as *mut u8, end);
        *buf.add(end) = 0;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Ownership table for installed custom-task bindings.
///
/// Keyed by `(kind, name)`; names are unique per kind, not across kinds.
/// Not internally synchronized: the owning instance serializes access by
/// requiring `&mut self` on every mutating path.
pub(crate) struct TaskRegistry {
    library: Arc<EngineLibrary>,
    entries: HashMap<(TaskKind, String), Binding>,
}

impl TaskRegistry {
    pub(crate) fn new(library: Arc<EngineLibrary>) -> Self {
        Self { library, entries: HashMap::new() }
    }

    /// Install `task` into the engine slot `name`.
    ///
    /// The engine documents no atomic slot swap, so an occupied
    /// `(kind, name)` fails with `DuplicateName`; callers replace a slot
    /// by unregistering first and accepting the visible window.
    pub(crate) fn register(
        &mut self,
        instance: RawInstance,
        name: &str,
        task: CustomTask,
    ) -> AxResult<()> {
        if name.is_empty() {
            return Err(AxError::invalid_parameter("name", "must not be empty"));
        }
        let kind = task.kind();
        if self.entries.contains_key(&(kind, name.to_string())) {
            return Err(AxError::DuplicateName { kind, name: name.to_string() });
        }
        let c_name = ffi::to_cstring(name, "name")?;

        let binding = match task {
            CustomTask::Recognizer(imp) => {
                Binding::Recognizer(Box::new(RecognizerBinding { imp }))
            }
            CustomTask::Action(imp) => Binding::Action(Box::new(ActionBinding { imp })),
        };

        let api = self.library.api();
        let installed = match &binding {
            Binding::Recognizer(b) => unsafe {
                (api.register_recognizer)(
                    instance,
                    c_name.as_ptr(),
                    recognizer_trampoline,
                    &**b as *const RecognizerBinding as *mut c_void,
                )
            },
            Binding::Action(b) => unsafe {
                (api.register_action)(
                    instance,
                    c_name.as_ptr(),
                    action_trampoline,
                    &**b as *const ActionBinding as *mut c_void,
                )
            },
        };
        if installed == AX_FALSE {
            return Err(AxError::NativeRejected { operation: "custom task registration" });
        }

        tracing::debug!(%kind, name, "registered custom task");
        self.entries.insert((kind, name.to_string()), binding);
        Ok(())
    }

    /// Remove the engine slot `(kind, name)`.
    ///
    /// The binding is dropped only after the engine confirms the slot is
    /// gone, so the engine never holds a pointer to freed host state.
    pub(crate) fn unregister(
        &mut self,
        instance: RawInstance,
        kind: TaskKind,
        name: &str,
    ) -> AxResult<()> {
        let key = (kind, name.to_string());
        if !self.entries.contains_key(&key) {
            return Err(AxError::NotFound { kind, name: name.to_string() });
        }
        let c_name = ffi::to_cstring(name, "name")?;

        let api = self.library.api();
        let removed = match kind {
            TaskKind::Recognizer => unsafe {
                (api.unregister_recognizer)(instance, c_name.as_ptr())
            },
            TaskKind::Action => unsafe { (api.unregister_action)(instance, c_name.as_ptr()) },
        };
        if removed == AX_FALSE {
            return Err(AxError::NativeRejected { operation: "custom task unregistration" });
        }

        self.entries.remove(&key);
        tracing::debug!(%kind, name, "unregistered custom task");
        Ok(())
    }

    /// Remove every engine slot of one kind.
    pub(crate) fn clear(&mut self, instance: RawInstance, kind: TaskKind) -> AxResult<()> {
        let api = self.library.api();
        let cleared = match kind {
            TaskKind::Recognizer => unsafe { (api.clear_recognizers)(instance) },
            TaskKind::Action => unsafe { (api.clear_actions)(instance) },
        };
        if cleared == AX_FALSE {
            return Err(AxError::NativeRejected { operation: "custom task clear" });
        }

        self.entries.retain(|(k, _), _| *k != kind);
        tracing::debug!(%kind, "cleared custom tasks");
        Ok(())
    }

    /// Teardown path: remove every slot of both kinds, logging failures
    /// instead of propagating them.
    ///
    /// Must run while the instance handle is still valid; the engine has
    /// to stop referencing host bindings before the instance that would
    /// invoke them is destroyed.
    pub(crate) fn teardown(&mut self, instance: RawInstance) {
        for kind in [TaskKind::Recognizer, TaskKind::Action] {
            if let Err(e) = self.clear(instance, kind) {
                tracing::warn!(%kind, error = %e, "failed to clear custom tasks during teardown");
            }
        }
    }

    /// Whether a slot is installed.
    pub(crate) fn contains(&self, kind: TaskKind, name: &str) -> bool {
        self.entries.contains_key(&(kind, name.to_string()))
    }

    /// Number of installed slots across both kinds.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

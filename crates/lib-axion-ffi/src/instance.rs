//! The instance facade: a bound resource and controller, the custom-task
//! registry, task posting, and teardown ordering.

use crate::controller::Controller;
use crate::error::{AxError, AxResult};
use crate::ffi::{self, INVALID_TASK_ID};
use crate::handle::OwnedHandle;
use crate::job::Job;
use crate::loader::EngineLibrary;
use crate::registry::{CustomTask, TaskKind, TaskRegistry};
use crate::resource::Resource;
use crate::toolkit::Toolkit;
use crate::utility::Utility;
use lib_types::TaskStatus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// What `release` (and `Drop`) tears down beyond the instance handle
/// itself.
///
/// A handle left out of the set stays live until the facade value itself
/// is dropped; Rust ownership still frees it in the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposeOptions {
    /// Release the bound resource handle.
    pub resource: bool,

    /// Release the bound controller handle.
    pub controller: bool,

    /// Uninitialize global toolkit state.
    pub toolkit: bool,
}

impl DisposeOptions {
    /// Dispose the instance handle only.
    pub const NONE: Self = Self { resource: false, controller: false, toolkit: false };

    /// Dispose the bound resource and controller, leave the toolkit up.
    pub const OWNED: Self = Self { resource: true, controller: true, toolkit: false };

    /// Dispose everything the instance composes, toolkit included.
    pub const ALL: Self = Self { resource: true, controller: true, toolkit: true };
}

/// Tunables for an instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceOptions {
    /// What `release` disposes beyond the instance handle.
    #[serde(default = "default_dispose_options")]
    pub dispose_options: DisposeOptions,

    /// Interval between polls in the blocking and async wait loops.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            dispose_options: default_dispose_options(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_dispose_options() -> DisposeOptions {
    DisposeOptions::OWNED
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(20)
}

/// A bound engine instance.
///
/// Composes a resource, a controller, the toolkit, the utility surface,
/// and the custom-task registry behind one entry point. The resource and
/// controller are owned exclusively from bind time on.
///
/// Single-owner by design: every mutating path takes `&mut self`, and
/// callers that need cross-thread sharing must serialize externally.
pub struct Instance {
    handle: OwnedHandle,
    registry: TaskRegistry,
    controller: Controller,
    resource: Resource,
    toolkit: Toolkit,
    utility: Utility,
    options: InstanceOptions,
    library: Arc<EngineLibrary>,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.handle)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Instance {
    /// Create the native instance and bind `resource` and `controller`
    /// to it, taking exclusive ownership of both.
    ///
    /// Fails with `Bind` naming the dependency that could not be bound.
    /// On failure the half-made instance handle is destroyed and the
    /// passed-in resource and controller are released with it.
    pub fn bind(
        library: Arc<EngineLibrary>,
        resource: Resource,
        controller: Controller,
        options: InstanceOptions,
    ) -> AxResult<Self> {
        let raw = unsafe { (library.api().instance_create)() };
        if raw.is_null() {
            return Err(AxError::Bind { dependency: "instance" });
        }
        let mut handle = OwnedHandle::new(raw, "instance");

        if let Err(e) = Self::bind_dependencies(&library, raw, &resource, &controller) {
            if let Some(p) = handle.invalidate() {
                unsafe { (library.api().instance_destroy)(p) };
            }
            // resource and controller drop here, releasing their handles
            return Err(e);
        }

        tracing::info!("instance bound");
        Ok(Self {
            handle,
            registry: TaskRegistry::new(library.clone()),
            controller,
            resource,
            toolkit: Toolkit::new(library.clone()),
            utility: Utility::new(library.clone()),
            options,
            library,
        })
    }

    fn bind_dependencies(
        library: &Arc<EngineLibrary>,
        raw: ffi::RawInstance,
        resource: &Resource,
        controller: &Controller,
    ) -> AxResult<()> {
        let res = resource.raw().map_err(|_| AxError::Bind { dependency: "resource" })?;
        if unsafe { (library.api().instance_bind_resource)(raw, res) } == ffi::AX_FALSE {
            return Err(AxError::Bind { dependency: "resource" });
        }

        let ctrl = controller.raw().map_err(|_| AxError::Bind { dependency: "controller" })?;
        if unsafe { (library.api().instance_bind_controller)(raw, ctrl) } == ffi::AX_FALSE {
            return Err(AxError::Bind { dependency: "controller" });
        }

        Ok(())
    }

    /// Whether resource, controller, and the native instance are all
    /// live and the engine reports the binding complete.
    pub fn initialized(&self) -> bool {
        let Ok(raw) = self.handle.get() else { return false };
        self.resource.is_valid()
            && self.controller.is_valid()
            && unsafe { (self.library.api().instance_inited)(raw) } != ffi::AX_FALSE
    }

    /// Whether the instance handle itself is still live.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// The bound resource.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The bound controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The composed toolkit.
    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// The composed utility surface.
    pub fn utility(&self) -> &Utility {
        &self.utility
    }

    /// Current instance tunables.
    pub fn options(&self) -> &InstanceOptions {
        &self.options
    }

    /// Change what `release` disposes.
    pub fn set_dispose_options(&mut self, dispose_options: DisposeOptions) {
        self.options.dispose_options = dispose_options;
    }

    /// Post a named task to the engine scheduler.
    ///
    /// Returns as soon as the post is enqueued; execution is tracked
    /// through the returned job, and an in-task failure is only ever
    /// visible as `TaskStatus::Failed`. `params` is an engine-defined
    /// JSON payload, passed through opaquely.
    pub fn post_task(&self, entry: &str, params: &str) -> AxResult<Job<'_>> {
        let raw = self.handle.get()?;
        if entry.is_empty() {
            return Err(AxError::invalid_parameter("entry", "must not be empty"));
        }
        let c_entry = ffi::to_cstring(entry, "entry")?;
        let c_params = ffi::to_cstring(params, "params")?;

        let id =
            unsafe { (self.library.api().instance_post_task)(raw, c_entry.as_ptr(), c_params.as_ptr()) };
        if id == INVALID_TASK_ID {
            return Err(AxError::PostRejected { entry: entry.to_string() });
        }

        tracing::debug!(entry, id, "posted task");
        Ok(Job::new(self, id))
    }

    pub(crate) fn task_status(&self, id: i64) -> AxResult<TaskStatus> {
        let raw = self.handle.get()?;
        let code = unsafe { (self.library.api().instance_task_status)(raw, id) };
        Ok(TaskStatus::from_code(code))
    }

    /// Whether every posted task has reached a terminal status.
    pub fn all_tasks_finished(&self) -> AxResult<bool> {
        let raw = self.handle.get()?;
        Ok(unsafe { (self.library.api().instance_all_tasks_finished)(raw) } != ffi::AX_FALSE)
    }

    /// Ask the engine to stop the bound resource, the bound controller,
    /// and every outstanding task.
    ///
    /// Best-effort: the return value reports whether the engine accepted
    /// the request, not whether the work has stopped yet.
    pub fn abort(&self) -> AxResult<bool> {
        let raw = self.handle.get()?;
        let accepted = unsafe { (self.library.api().instance_post_stop)(raw) } != ffi::AX_FALSE;
        tracing::debug!(accepted, "abort requested");
        Ok(accepted)
    }

    /// Install a custom task under its own name.
    pub fn register(&mut self, task: CustomTask) -> AxResult<()> {
        let name = task.name().to_string();
        self.register_as(&name, task)
    }

    /// Install a custom task under an explicit slot name.
    pub fn register_as(&mut self, name: &str, task: CustomTask) -> AxResult<()> {
        let raw = self.handle.get()?;
        self.registry.register(raw, name, task)
    }

    /// Remove a custom-task slot by kind and name.
    pub fn unregister(&mut self, kind: TaskKind, name: &str) -> AxResult<()> {
        let raw = self.handle.get()?;
        self.registry.unregister(raw, kind, name)
    }

    /// Remove the slot a task registers under by default.
    pub fn unregister_task(&mut self, task: &CustomTask) -> AxResult<()> {
        let raw = self.handle.get()?;
        self.registry.unregister(raw, task.kind(), task.name())
    }

    /// Remove every custom-task slot of one kind.
    pub fn clear(&mut self, kind: TaskKind) -> AxResult<()> {
        let raw = self.handle.get()?;
        self.registry.clear(raw, kind)
    }

    /// Release the instance and, per `DisposeOptions`, what it composes.
    ///
    /// Teardown order is fixed: custom-task slots first (the engine must
    /// stop referencing host bindings before the instance that invokes
    /// them goes away), then the instance handle, then the controller,
    /// then the resource, then the toolkit. Failures on this path are
    /// logged and swallowed; release is idempotent.
    pub fn release(&mut self) {
        let Some(raw) = self.handle.invalidate() else { return };

        self.registry.teardown(raw);
        unsafe { (self.library.api().instance_destroy)(raw) };
        tracing::debug!("released instance handle");

        let dispose = self.options.dispose_options;
        if dispose.controller {
            self.controller.release();
        }
        if dispose.resource {
            self.resource.release();
        }
        if dispose.toolkit {
            if let Err(e) = self.toolkit.uninit() {
                tracing::warn!(error = %e, "toolkit uninit failed during teardown");
            }
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.release();
    }
}

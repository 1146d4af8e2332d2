//! Resource-bundle handles.

use crate::error::{AxError, AxResult};
use crate::ffi::RawResource;
use crate::handle::OwnedHandle;
use crate::loader::EngineLibrary;
use std::sync::Arc;

/// An engine resource bundle.
///
/// Created unbound; ownership moves into an [`Instance`] at bind time,
/// and from then on the instance controls its place in the teardown
/// order.
///
/// [`Instance`]: crate::instance::Instance
pub struct Resource {
    library: Arc<EngineLibrary>,
    handle: OwnedHandle,
}

impl Resource {
    /// Create a fresh resource handle.
    pub fn new(library: Arc<EngineLibrary>) -> AxResult<Self> {
        let raw = unsafe { (library.api().resource_create)() };
        if raw.is_null() {
            return Err(AxError::NativeRejected { operation: "resource creation" });
        }
        tracing::debug!("created resource handle");
        Ok(Self { library, handle: OwnedHandle::new(raw, "resource") })
    }

    /// Whether the native handle is still live.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub(crate) fn raw(&self) -> AxResult<RawResource> {
        self.handle.get()
    }

    /// Release the native handle.
    ///
    /// Safe to call more than once; only the first call reaches the
    /// engine.
    pub fn release(&mut self) {
        if let Some(raw) = self.handle.invalidate() {
            unsafe { (self.library.api().resource_destroy)(raw) };
            tracing::debug!("released resource handle");
        }
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.release();
    }
}

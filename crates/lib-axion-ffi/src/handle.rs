//! Owned native handles with explicit release semantics.

use crate::error::{AxError, AxResult};
use std::ffi::c_void;

/// A native-owned pointer the host must release exactly once.
///
/// Each wrapper type embeds one of these per native object. After
/// `invalidate` the raw pointer is unreachable: `get` fails with
/// `StaleHandle` without touching native code, and further invalidations
/// are no-ops. A NULL pointer from a native factory is stored as
/// already-invalid, so factory failures surface on first use instead of
/// as a native call on NULL.
#[derive(Debug)]
pub(crate) struct OwnedHandle {
    raw: *mut c_void,
    valid: bool,
    kind: &'static str,
}

impl OwnedHandle {
    /// Wrap a freshly created native handle.
    pub(crate) fn new(raw: *mut c_void, kind: &'static str) -> Self {
        Self { raw, valid: !raw.is_null(), kind }
    }

    /// The raw pointer, if the handle is still live.
    pub(crate) fn get(&self) -> AxResult<*mut c_void> {
        if self.valid {
            Ok(self.raw)
        } else {
            Err(AxError::StaleHandle { kind: self.kind })
        }
    }

    /// Whether the handle is still live.
    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the handle released.
    ///
    /// Returns the raw pointer exactly once, for the caller to pass to
    /// the native destructor; `None` on every later call.
    pub(crate) fn invalidate(&mut self) -> Option<*mut c_void> {
        if !self.valid {
            return None;
        }
        self.valid = false;
        Some(self.raw)
    }
}

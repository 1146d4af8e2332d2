//! Engine metadata queries.

use crate::ffi;
use crate::loader::EngineLibrary;
use std::sync::Arc;

/// Utility surface of the engine.
pub struct Utility {
    library: Arc<EngineLibrary>,
}

impl Utility {
    pub fn new(library: Arc<EngineLibrary>) -> Self {
        Self { library }
    }

    /// Engine version string, copied out of native static storage.
    pub fn version(&self) -> String {
        unsafe { ffi::read_string((self.library.api().version)()) }
    }
}

//! Error types for engine binding operations.

use crate::registry::TaskKind;
use thiserror::Error;

/// Errors that can occur while driving the engine.
///
/// Everything here is detected host-side or reported synchronously by a
/// native call. Failures *inside* task execution never surface as an
/// error; they are observed through `TaskStatus::Failed` only.
#[derive(Debug, Error)]
pub enum AxError {
    /// Failed to load the engine shared library.
    #[error("failed to load engine library '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// Required symbol not found in the engine library.
    #[error("symbol '{symbol}' not found in engine library")]
    SymbolNotFound { symbol: String },

    /// Operation attempted on a handle that was already released or never
    /// became valid. No native call was made.
    #[error("stale {kind} handle: already released or never bound")]
    StaleHandle { kind: &'static str },

    /// Resource/controller/instance binding incomplete.
    #[error("failed to bind {dependency} to the instance")]
    Bind { dependency: &'static str },

    /// A custom task with this name is already installed.
    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: TaskKind, name: String },

    /// No custom task with this name is installed.
    #[error("{kind} '{name}' is not registered")]
    NotFound { kind: TaskKind, name: String },

    /// The engine refused to enqueue a task post.
    #[error("engine rejected post of task entry '{entry}'")]
    PostRejected { entry: String },

    /// Cursor read outside the valid range of a native-backed list.
    #[error("cursor index {index} out of bounds for list of size {size}")]
    CursorOutOfBounds { index: u64, size: u64 },

    /// Host-side argument validation failed; no native call was made.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A native call with no richer error channel returned its failure
    /// code.
    #[error("engine rejected {operation}")]
    NativeRejected { operation: &'static str },
}

impl AxError {
    /// Create a library load error.
    pub fn load(path: impl Into<String>, source: libloading::Error) -> Self {
        Self::Load { path: path.into(), source }
    }

    /// Create a symbol-not-found error.
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound { symbol: symbol.into() }
    }

    /// Create an invalid-parameter error.
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    /// Whether this error means a handle must be re-created before the
    /// operation can ever succeed.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleHandle { .. })
    }
}

/// Result type for engine binding operations.
pub type AxResult<T> = Result<T, AxError>;

//! Task execution status.
//!
//! A posted task moves through these states on the engine's own scheduler.
//! The host never mutates a status; it only decodes what the engine
//! reports.

use serde::{Deserialize, Serialize};

/// Status of a posted task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// The engine does not know the task (bad id, or already reclaimed).
    Invalid,
    /// Queued, not yet picked up by the scheduler.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failure inside the engine.
    Failed,
    /// Stopped before completion by an abort request.
    Stopped,
}

impl TaskStatus {
    /// Decode an engine status code.
    ///
    /// Unknown codes map to `Invalid` rather than panicking; the engine
    /// may grow new codes ahead of this binding.
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::Pending,
            2000 => Self::Running,
            3000 => Self::Succeeded,
            4000 => Self::Failed,
            5000 => Self::Stopped,
            _ => Self::Invalid,
        }
    }

    /// The raw engine status code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Invalid => 0,
            Self::Pending => 1000,
            Self::Running => 2000,
            Self::Succeeded => 3000,
            Self::Failed => 4000,
            Self::Stopped => 5000,
        }
    }

    /// Whether the scheduler will never change this status again.
    ///
    /// `Invalid` counts as terminal so that waiting on an id the engine
    /// does not know returns instead of polling forever.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Whether the task finished successfully.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

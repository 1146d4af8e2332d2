//! Posted tasks, tracked as pollable jobs.

use crate::error::AxResult;
use crate::instance::Instance;
use lib_types::TaskStatus;
use std::fmt;

/// A unit of work posted to the engine scheduler.
///
/// The job borrows the instance it was posted on, so a job can never
/// outlive the instance or observe its release. Status transitions are
/// driven entirely by the engine; the host only polls. Jobs posted on
/// one instance are independent of each other, and the engine promises
/// no FIFO ordering across them.
#[derive(Clone, Copy)]
pub struct Job<'i> {
    instance: &'i Instance,
    id: i64,
}

impl<'i> Job<'i> {
    pub(crate) fn new(instance: &'i Instance, id: i64) -> Self {
        Self { instance, id }
    }

    /// Scheduler id of this task.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Current status, non-blocking. Safe to poll repeatedly.
    pub fn status(&self) -> AxResult<TaskStatus> {
        self.instance.task_status(self.id)
    }

    /// Block the calling thread until the job reaches a terminal status.
    ///
    /// No built-in timeout: callers that need a bounded wait poll
    /// `status` against their own deadline instead.
    pub fn wait(&self) -> AxResult<TaskStatus> {
        let interval = self.instance.options().poll_interval;
        loop {
            let status = self.status()?;
            if status.is_terminal() {
                return Ok(status);
            }
            std::thread::sleep(interval);
        }
    }

    /// Wait for a terminal status without blocking the runtime thread.
    ///
    /// The same polling primitive as `wait`, yielding to the runtime
    /// between polls instead of parking the thread.
    pub async fn wait_async(&self) -> AxResult<TaskStatus> {
        let interval = self.instance.options().poll_interval;
        loop {
            let status = self.status()?;
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

impl fmt::Debug for Job<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish()
    }
}

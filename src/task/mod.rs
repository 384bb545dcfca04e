//! Task runtime seams: what an executor hands a task, and how tasks are found.
//!
//! # Architecture
//!
//! - [`Task`] - Async trait that task implementations provide
//! - [`TaskContext`] - Narrow view of one task node at run time
//! - [`CounterSink`] - Where tasks report progress
//! - [`TaskRegistry`] - Explicit mapping from task type name to implementation
//! - [`UrlDownload`] - The `url-download` task

mod download;
mod error;
mod registry;

pub use download::{
    DEFAULT_CHUNK_SIZE, DownloadParams, OUTPUT_PORT, TOTAL_BYTES_COUNTER, URL_DOWNLOAD,
    UrlDownload, entity_bytes_counter,
};
pub use error::{TaskError, TransferError};
pub use registry::TaskRegistry;

use async_trait::async_trait;

use crate::workflow::{Resource, TaskNode};

/// Receives progress counter increments.
///
/// Implementations own the storage and must make concurrent increments of the
/// same counter safe.
pub trait CounterSink: Send + Sync {
    /// Adds `delta` to the counter called `name`.
    fn increment(&self, name: &str, delta: u64);
}

/// Everything a running task may see of its node and the run.
pub trait TaskContext: Send + Sync {
    /// The task node being executed.
    fn node(&self) -> &TaskNode;

    /// Resource bound to an output port.
    fn output(&self, port: &str) -> Option<&Resource>;

    /// Resource bound to an input port.
    fn input(&self, port: &str) -> Option<&Resource>;

    /// Progress counters of the run.
    fn counters(&self) -> &dyn CounterSink;

    /// Shorthand for `self.counters().increment(name, delta)`.
    fn increment(&self, name: &str, delta: u64) {
        self.counters().increment(name, delta);
    }
}

/// A task implementation, looked up by type name in a [`TaskRegistry`].
#[async_trait]
pub trait Task: Send + Sync {
    /// Type name that task nodes use to refer to this implementation.
    fn type_name(&self) -> &'static str;

    /// Executes one task node.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` on any failure; the executor decides what happens
    /// to the rest of the pipeline.
    async fn run(&self, ctx: &dyn TaskContext) -> Result<(), TaskError>;
}

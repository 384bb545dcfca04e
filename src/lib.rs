//! Wikiflow Core Library
//!
//! Declarative workflow graphs for fetching corpus dumps, plus the
//! `url-download` task that executes the downloads.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`workflow`] - Graph builder: resources, task nodes, namespaces
//! - [`task`] - Task trait, run-time context, registry, and the download task
//! - [`dumps`] - Wikipedia/Wikidata dump download builders
//! - [`corpora`] - Default dump URLs and file locations
//! - [`counters`] - Concurrent progress counters
//! - [`executor`] - In-process executor for workflow graphs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod corpora;
pub mod counters;
pub mod dumps;
pub mod executor;
pub mod task;
pub mod workflow;

// Re-export commonly used types
pub use corpora::{Corpora, CorporaConfig, CorpusProvider};
pub use counters::Counters;
pub use dumps::DownloadWorkflow;
pub use executor::{DEFAULT_TASK_CONCURRENCY, ExecutorError, LocalExecutor, RunReport};
pub use task::{
    CounterSink, DEFAULT_CHUNK_SIZE, Task, TaskContext, TaskError, TaskRegistry, TransferError,
    UrlDownload,
};
pub use workflow::{Resource, ResourceId, TaskId, TaskNode, Workflow};

//! Error types for task execution.
//!
//! Every failure aborts the task and propagates to the executor; nothing here
//! is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Errors a task can fail with.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The output already exists. Tasks never overwrite.
    #[error("file already exists: {path}")]
    PreconditionFailed {
        /// The existing destination path.
        path: PathBuf,
    },

    /// Network or mid-stream I/O failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Missing or invalid task parameter, detected before any I/O.
    #[error("invalid configuration for task {task}: {message}")]
    Configuration {
        /// Qualified name of the task node.
        task: String,
        /// What is wrong.
        message: String,
    },
}

impl TaskError {
    /// Creates a precondition error for an existing destination.
    pub fn precondition_failed(path: impl Into<PathBuf>) -> Self {
        Self::PreconditionFailed { path: path.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors raised before any side effect happened.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Failures while moving bytes from the source to the destination.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Connection could not be established or broke mid-stream.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The source URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The source URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error creating or writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No From<std::io::Error> or From<reqwest::Error>: every variant needs the
// url or path the source error does not carry.

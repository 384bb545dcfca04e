//! The `url-download` task: stream a URL into a new file.
//!
//! The destination comes from the resource bound to the `output` port. The
//! task refuses to overwrite an existing file, writes the body in pieces of
//! at most `chunksize` bytes, and after every piece adds its length to the
//! `bytes_downloaded` counter and to `<shortname>_bytes_downloaded`.
//!
//! A failed transfer leaves the partially written file in place. There is no
//! timeout: a stalled connection blocks the task.

use std::num::NonZeroUsize;
use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::{CounterSink, Task, TaskContext, TaskError, TransferError};
use crate::workflow::TaskNode;

/// Type name of the download task.
pub const URL_DOWNLOAD: &str = "url-download";

/// Bytes read per transfer iteration when `chunksize` is not set.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Counter summing the bytes of every download in a run.
pub const TOTAL_BYTES_COUNTER: &str = "bytes_downloaded";

/// Port the destination resource is bound to.
pub const OUTPUT_PORT: &str = "output";

/// Name of the per-entity byte counter, e.g. `enwiki_bytes_downloaded`.
#[must_use]
pub fn entity_bytes_counter(shortname: &str) -> String {
    format!("{shortname}_{TOTAL_BYTES_COUNTER}")
}

/// Validated parameters of a `url-download` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadParams {
    /// Source of the byte stream.
    pub url: Url,
    /// Short entity name used for the per-entity counter.
    pub shortname: String,
    /// Upper bound on bytes written per iteration.
    pub chunk_size: NonZeroUsize,
}

impl DownloadParams {
    /// Reads and validates the parameters of a task node.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Configuration` when `url` or `shortname` is
    /// missing, `url` is not an absolute URL, or `chunksize` is not a positive
    /// integer.
    pub fn from_node(node: &TaskNode) -> Result<Self, TaskError> {
        let params = node.params();
        let invalid = |message: String| TaskError::configuration(node.name(), message);

        let raw_url = params
            .get_str("url")
            .ok_or_else(|| invalid("missing parameter `url`".to_string()))?;
        let url = Url::parse(&raw_url)
            .map_err(|e| invalid(format!("invalid parameter `url` ({raw_url}): {e}")))?;

        let shortname = params
            .get_str("shortname")
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| invalid("missing parameter `shortname`".to_string()))?;

        let chunk_size = match params.get_int("chunksize") {
            Ok(None) => NonZeroUsize::new(DEFAULT_CHUNK_SIZE),
            Ok(Some(value)) => usize::try_from(value).ok().and_then(NonZeroUsize::new),
            Err(_) => None,
        }
        .ok_or_else(|| {
            let value = params.get_str("chunksize").unwrap_or_default();
            invalid(format!("parameter `chunksize` must be a positive integer, got {value}"))
        })?;

        Ok(Self {
            url,
            shortname,
            chunk_size,
        })
    }
}

/// Downloads a URL to the file named by the task's output resource.
#[derive(Debug, Clone)]
pub struct UrlDownload {
    client: Client,
}

impl UrlDownload {
    /// Creates the task with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("wikiflow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Creates the task around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Streams `params.url` into a newly created file at `path`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` if `path` already exists, `Transfer` on any
    /// network or file system failure.
    #[instrument(
        skip(self, params, path, counters),
        fields(url = %params.url, path = %path.display())
    )]
    pub async fn download(
        &self,
        params: &DownloadParams,
        path: &Path,
        counters: &dyn CounterSink,
    ) -> Result<u64, TaskError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::io(parent, e))?;
        }

        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| TransferError::io(path, e))?;
        if exists {
            return Err(TaskError::precondition_failed(path));
        }

        let url = params.url.as_str();
        let response = self
            .client
            .get(params.url.clone())
            .send()
            .await
            .map_err(|e| TransferError::network(url, e))?;
        if !response.status().is_success() {
            return Err(TransferError::http_status(url, response.status().as_u16()).into());
        }
        debug!(status = response.status().as_u16(), "connection established");

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    TaskError::precondition_failed(path)
                } else {
                    TransferError::io(path, e).into()
                }
            })?;

        stream_to_file(file, response, params, path, counters).await
    }
}

#[async_trait]
impl Task for UrlDownload {
    fn type_name(&self) -> &'static str {
        URL_DOWNLOAD
    }

    #[instrument(skip(self, ctx), fields(task = %ctx.node().name()))]
    async fn run(&self, ctx: &dyn TaskContext) -> Result<(), TaskError> {
        let node = ctx.node();
        let params = DownloadParams::from_node(node)?;
        let output = ctx.output(OUTPUT_PORT).ok_or_else(|| {
            TaskError::configuration(
                node.name(),
                format!("no resource bound to port `{OUTPUT_PORT}`"),
            )
        })?;

        info!("Download {} from {}", params.shortname, params.url);
        let bytes = self
            .download(&params, output.path(), ctx.counters())
            .await?;
        info!(bytes, path = %output.path().display(), "{} downloaded", params.shortname);
        Ok(())
    }
}

/// Copies the response body into `file` in pieces of at most
/// `params.chunk_size` bytes, bumping both byte counters after each piece.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    params: &DownloadParams,
    path: &Path,
    counters: &dyn CounterSink,
) -> Result<u64, TaskError> {
    let url = params.url.as_str();
    let entity_counter = entity_bytes_counter(&params.shortname);
    let chunk_size = params.chunk_size.get();
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(received) = stream.next().await {
        let received = match received {
            Ok(received) => received,
            Err(e) => {
                // Counted bytes stay on disk in the partial file.
                writer
                    .flush()
                    .await
                    .map_err(|e| TransferError::io(path, e))?;
                return Err(TransferError::network(url, e).into());
            }
        };

        for chunk in received.chunks(chunk_size) {
            writer
                .write_all(chunk)
                .await
                .map_err(|e| TransferError::io(path, e))?;

            let len = chunk.len() as u64;
            counters.increment(TOTAL_BYTES_COUNTER, len);
            counters.increment(&entity_counter, len);
            bytes_written += len;
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::io(path, e))?;

    Ok(bytes_written)
}

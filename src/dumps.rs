//! Workflow builders for downloading Wikipedia and Wikidata dumps.
//!
//! These package the resource-plus-task pattern behind single calls and are
//! pure composition of [`Workflow`] primitives. Values the caller leaves out
//! come from a [`CorpusProvider`].
//!
//! # Example
//!
//! ```
//! use wikiflow_core::corpora::Corpora;
//! use wikiflow_core::dumps::DownloadWorkflow;
//! use wikiflow_core::workflow::Workflow;
//!
//! let corpora = Corpora::default();
//! let mut wf = Workflow::new("dumps");
//! let mut dumps = DownloadWorkflow::new(&mut wf, &corpora);
//! let dump = dumps.download_wikipedia(None, None, Some("da"));
//! assert_eq!(
//!     wf.get_resource(dump).name(),
//!     "local/data/corpora/wikipedia/dawiki-latest-pages-articles.xml.bz2"
//! );
//! assert_eq!(wf.tasks()[0].name(), "da-wikipedia-download/url-download");
//! ```

use std::num::NonZeroUsize;

use tracing::debug;

use crate::corpora::CorpusProvider;
use crate::task::{OUTPUT_PORT, URL_DOWNLOAD};
use crate::workflow::{ResourceId, Workflow};

/// Format tag of Wikipedia dumps.
pub const WIKIPEDIA_DUMP_FORMAT: &str = "xml/wikipage";

/// Format tag of Wikidata dumps.
pub const WIKIDATA_DUMP_FORMAT: &str = "text/json";

/// Declares dump resources and their download tasks in a workflow.
pub struct DownloadWorkflow<'a, P: CorpusProvider + ?Sized> {
    wf: &'a mut Workflow,
    corpora: &'a P,
    chunk_size: Option<NonZeroUsize>,
}

impl<'a, P: CorpusProvider + ?Sized> DownloadWorkflow<'a, P> {
    #[must_use]
    pub fn new(wf: &'a mut Workflow, corpora: &'a P) -> Self {
        Self {
            wf,
            corpora,
            chunk_size: None,
        }
    }

    /// Sets `chunksize` on every download task declared afterwards.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: Option<NonZeroUsize>) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The workflow being built.
    pub fn workflow(&mut self) -> &mut Workflow {
        self.wf
    }

    /// Resource for the Wikipedia dump of a language.
    ///
    /// The dump is the full XML export of one Wikipedia with articles in
    /// wiki markup, as published on the dump mirror.
    pub fn wikipedia_dump(&mut self, language: Option<&str>) -> ResourceId {
        let language = language.unwrap_or_else(|| self.corpora.default_language());
        self.wf.resource(&self.corpora.wikipedia_dump(language), WIKIPEDIA_DUMP_FORMAT)
    }

    /// Declares the download of a Wikipedia dump and returns the dump.
    ///
    /// The task lives in namespace `<language>-wikipedia-download` and has
    /// parameters `language`, `url` and `shortname = <language>wiki`.
    pub fn download_wikipedia(
        &mut self,
        url: Option<&str>,
        dump: Option<ResourceId>,
        language: Option<&str>,
    ) -> ResourceId {
        let language = language
            .unwrap_or_else(|| self.corpora.default_language())
            .to_string();
        let url = url.map_or_else(|| self.corpora.wikipedia_url(&language), str::to_string);
        let dump = dump.unwrap_or_else(|| self.wikipedia_dump(Some(&language)));

        let chunk_size = self.chunk_size;
        let mut ns = self.wf.namespace(&format!("{language}-wikipedia-download"));
        let download = ns.task(URL_DOWNLOAD);
        download
            .add_params([
                ("language", language.as_str()),
                ("url", url.as_str()),
                ("shortname", format!("{language}wiki").as_str()),
            ])
            .attach_output(OUTPUT_PORT, dump);
        if let Some(chunk_size) = chunk_size {
            download.add_param("chunksize", chunk_size.get());
        }
        debug!(task = download.name(), %url, "declared wikipedia download");
        dump
    }

    /// Resource for the Wikidata dump, a full export of Wikidata in JSON.
    pub fn wikidata_dump(&mut self) -> ResourceId {
        self.wf.resource(&self.corpora.wikidata_dump(), WIKIDATA_DUMP_FORMAT)
    }

    /// Declares the download of the Wikidata dump and returns the dump.
    pub fn download_wikidata(&mut self, url: Option<&str>, dump: Option<ResourceId>) -> ResourceId {
        let url = url.map_or_else(|| self.corpora.wikidata_url(), str::to_string);
        let dump = dump.unwrap_or_else(|| self.wikidata_dump());

        let chunk_size = self.chunk_size;
        let mut ns = self.wf.namespace("wikidata-download");
        let download = ns.task(URL_DOWNLOAD);
        download
            .add_params([("url", url.as_str()), ("shortname", "wikidata")])
            .attach_output(OUTPUT_PORT, dump);
        if let Some(chunk_size) = chunk_size {
            download.add_param("chunksize", chunk_size.get());
        }
        debug!(task = download.name(), %url, "declared wikidata download");
        dump
    }
}

//! CLI argument definitions using clap derive macros.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use wikiflow_core::DEFAULT_TASK_CONCURRENCY;
use wikiflow_core::corpora::{DEFAULT_CORPORA_DIR, DEFAULT_MIRROR};

/// Download Wikipedia and Wikidata dumps through a workflow graph.
///
/// Each requested dump becomes a `url-download` task in its own namespace.
/// Existing dump files are never overwritten.
#[derive(Parser, Debug)]
#[command(name = "wikiflow")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Wikipedia language to download (repeatable)
    #[arg(short = 'l', long = "language")]
    pub languages: Vec<String>,

    /// Also download the Wikidata dump
    #[arg(long)]
    pub wikidata: bool,

    /// Directory where corpus dumps are stored
    #[arg(long, default_value = DEFAULT_CORPORA_DIR)]
    pub corpora_dir: PathBuf,

    /// Base URL of the dump mirror
    #[arg(long, default_value = DEFAULT_MIRROR)]
    pub mirror: String,

    /// Bytes per transfer iteration (default 65536)
    #[arg(long)]
    pub chunk_size: Option<NonZeroUsize>,

    /// Maximum downloads running at the same time (1-32)
    #[arg(
        short = 'c',
        long,
        default_value_t = DEFAULT_TASK_CONCURRENCY as u8,
        value_parser = clap::value_parser!(u8).range(1..=32)
    )]
    pub concurrency: u8,

    /// Print the workflow graph as JSON instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

//! CLI entry point for the wikiflow tool.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use wikiflow_core::{
    Corpora, CorporaConfig, Counters, CorpusProvider, DownloadWorkflow, LocalExecutor,
    TaskRegistry, Workflow,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so --dry-run output on stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let corpora = Corpora::new(CorporaConfig {
        corpora_dir: args.corpora_dir.clone(),
        mirror: args.mirror.clone(),
        ..CorporaConfig::default()
    });

    let workflow = build_workflow(&args, &corpora);
    info!(
        tasks = workflow.tasks().len(),
        resources = workflow.resources().len(),
        "Workflow built"
    );

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
        return Ok(());
    }

    let registry = TaskRegistry::with_builtin_tasks()?;
    let executor = LocalExecutor::new(
        registry,
        Arc::new(Counters::new()),
        usize::from(args.concurrency),
    )?;
    let report = executor.run(&workflow).await?;

    for (name, value) in &report.counters {
        info!(counter = %name, value, "Counter");
    }
    info!(completed = report.completed, "Downloads complete");

    Ok(())
}

/// Declares one download per requested language, plus Wikidata if asked.
fn build_workflow(args: &Args, corpora: &Corpora) -> Workflow {
    let mut workflow = Workflow::new("wikiflow-download");
    let mut dumps = DownloadWorkflow::new(&mut workflow, corpora).with_chunk_size(args.chunk_size);

    let languages = if args.languages.is_empty() && !args.wikidata {
        vec![corpora.default_language().to_string()]
    } else {
        args.languages.clone()
    };
    for language in &languages {
        dumps.download_wikipedia(None, None, Some(language.as_str()));
    }
    if args.wikidata {
        dumps.download_wikidata(None, None);
    }

    workflow
}

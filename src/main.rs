mod cli;
mod report;

use analysis_pipeline::{
    load_labels_from_path, read_records_from_path, CancellationFlag, Exporter, MetricsSnapshot,
    PipelineRunner,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reddit_client::{FetchOptions, RedditClient};
use std::collections::HashMap;
use std::path::Path;
use threadmood_core::{
    AppConfig, CoreError, ErrorExt, ErrorReporter, ExportError, RedditCredentials, ResultRecord,
    SentimentLabel,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Cli, Commands, SummarizeArgs};

const DEFAULT_LOG_FILTER: &str =
    "threadmood=info,analysis_pipeline=info,reddit_client=info,sentiment_engine=info";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Analyze(args) => analyze(config, args).await,
        Commands::Summarize(args) => summarize(args),
    }
}

fn load_labels(path: Option<&Path>) -> Result<Option<HashMap<String, SentimentLabel>>> {
    path.map(|p| {
        load_labels_from_path(p)
            .with_context(|| format!("failed to read reference labels from {}", p.display()))
    })
    .transpose()
}

fn snapshot_for(
    records: &[ResultRecord],
    labels: Option<&HashMap<String, SentimentLabel>>,
) -> MetricsSnapshot {
    match labels {
        Some(labels) => MetricsSnapshot::with_ground_truth(records, labels),
        None => MetricsSnapshot::compute(records),
    }
}

fn progress_bar(limit: usize, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(limit as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("posts analyzed");
    Ok(pb)
}

async fn analyze(mut config: AppConfig, args: AnalyzeArgs) -> Result<()> {
    args.apply(&mut config);
    let Some(community) = config.analysis.community.clone() else {
        bail!("no community given; pass one as an argument or set analysis.community");
    };
    config.validate().context("invalid configuration")?;

    let credentials = RedditCredentials::from_env()?;
    let client = RedditClient::new(credentials.into(), FetchOptions::from(&config.analysis))
        .context("failed to create Reddit client")?;
    let runner = PipelineRunner::from_config(&config).context("failed to set up scoring")?;
    let scheme = runner.analyzer().scheme();
    let labels = load_labels(args.labels.as_deref())?;

    let cancellation = CancellationFlag::new();
    let runner = runner.with_cancellation(cancellation.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current post");
            cancellation.cancel();
        }
    });

    info!(
        "Analyzing up to {} top posts of r/{}",
        config.analysis.limit, community
    );
    let pb = progress_bar(config.analysis.limit, args.no_progress)?;
    let observer = |processed: usize| pb.set_position(processed as u64);
    let outcome = runner
        .run(&client, &community, config.analysis.limit, Some(&observer))
        .await;
    pb.finish_and_clear();

    let reporter = ErrorReporter::new();
    if let Some(source_error) = &outcome.source_error {
        reporter.report_error(source_error);
    }
    report::log_run_stats(&outcome.stats, outcome.cancelled);
    report::log_request_stats(&client.request_stats().await);

    let snapshot = snapshot_for(&outcome.records, labels.as_ref());
    println!("{}", report::render_summary(&outcome.records, &snapshot, scheme));

    let path = Path::new(&config.export.path);
    match Exporter::from_config(&config).export_to_path(&outcome.records, path) {
        Ok(written) => println!("Saved {} records to {}", written, path.display()),
        Err(CoreError::Export(ExportError::NoRecords)) => println!("No data to export."),
        Err(e) => {
            e.log_error();
            return Err(e).with_context(|| format!("failed to export to {}", path.display()));
        }
    }

    if outcome.cancelled {
        println!("Run was interrupted; results are partial.");
    }
    Ok(())
}

fn summarize(args: SummarizeArgs) -> Result<()> {
    let (records, scheme) = read_records_from_path(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let labels = load_labels(args.labels.as_deref())?;

    let snapshot = snapshot_for(&records, labels.as_ref());
    println!("{}", report::render_summary(&records, &snapshot, scheme));
    Ok(())
}

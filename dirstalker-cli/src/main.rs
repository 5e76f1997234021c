use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dirstalker::{
    probe::{CachedProbe, HttpProbe, Probe, ProbeConfig},
    scanner::{EngineOptions, FuzzEngine, JsonFormatter, LogFormatter, PlainFormatter, RunReport},
    utils::{DictionarySet, TargetUrl},
    wordlist::DEFAULT_CHUNK_BYTES,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Directory and path discovery over HTTP
#[derive(Parser, Debug)]
#[command(name = "dirstalker", author, version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", env = "DIRSTALKER_LOG_LEVEL", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe every candidate of the selected dictionaries against a base URL
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Base URL candidates are appended to, e.g. http://host/
    url: String,

    /// Dictionary names, comma separated (default: every *.txt in the directory)
    #[arg(long, value_delimiter = ',')]
    dicts: Vec<String>,

    /// Maximum number of concurrent requests
    #[arg(long, visible_alias = "maxWorkers")]
    max_workers: Option<usize>,

    /// Directory holding <name>.txt dictionaries
    #[arg(long, default_value = "dicts", env = "DIRSTALKER_DICTS")]
    dicts_dir: PathBuf,

    /// Wordlist bytes read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
    chunk_bytes: usize,

    /// Console output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// Reuse results for candidates already probed during this run
    #[arg(long)]
    cache: bool,

    /// Do not draw the progress line
    #[arg(long)]
    no_progress: bool,

    /// Validate TLS certificates (off by default, targets are often self-signed)
    #[arg(long)]
    verify_certs: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Plain,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Run(args) => match run(args).await {
            Ok(report) => {
                log_report(&report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("[!] {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: RunArgs) -> Result<RunReport> {
    let target = TargetUrl::new(&args.url).with_context(|| format!("bad url {:?}", args.url))?;
    let dictionaries = DictionarySet::resolve(&args.dicts_dir, &args.dicts)
        .context("cannot resolve dictionaries")?;
    if dictionaries.is_empty() {
        tracing::warn!(dir = %args.dicts_dir.display(), "no dictionaries found");
    }

    let config = ProbeConfig::default().with_accept_invalid_certs(!args.verify_certs);
    let probe = HttpProbe::new(target.clone(), &config)
        .context("cannot set up the http client")?;

    let mut options = EngineOptions::default()
        .with_chunk_bytes(args.chunk_bytes)
        .with_progress(!args.no_progress);
    if let Some(workers) = args.max_workers {
        options = options.with_concurrency(workers);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    tracing::info!(%target, dictionaries = dictionaries.len(), concurrency = options.concurrency, "starting run");

    let report = match (args.cache, args.format) {
        (false, OutputFormat::Plain) => {
            fuzz(probe, target, PlainFormatter, options, cancel, &dictionaries).await
        }
        (false, OutputFormat::Json) => {
            fuzz(probe, target, JsonFormatter, options, cancel, &dictionaries).await
        }
        (true, OutputFormat::Plain) => {
            fuzz(CachedProbe::new(probe), target, PlainFormatter, options, cancel, &dictionaries)
                .await
        }
        (true, OutputFormat::Json) => {
            fuzz(CachedProbe::new(probe), target, JsonFormatter, options, cancel, &dictionaries)
                .await
        }
    };

    Ok(report)
}

async fn fuzz<P: Probe, F: LogFormatter>(
    probe: P,
    target: TargetUrl,
    formatter: F,
    options: EngineOptions,
    cancel: CancellationToken,
    dictionaries: &DictionarySet,
) -> RunReport {
    let mut engine = FuzzEngine::new(probe, target, formatter)
        .with_options(options)
        .with_cancellation(cancel);
    engine.run(dictionaries).await
}

fn log_report(report: &RunReport) {
    for dict in &report.dictionaries {
        tracing::info!(
            name = %dict.name,
            outcome = ?dict.outcome,
            processed = dict.processed,
            total = dict.total,
            hits = dict.hits.len(),
            failed = dict.failed_probes,
            abandoned = dict.abandoned,
            "dictionary summary"
        );
    }
    tracing::info!(
        hits = report.hits(),
        processed = report.processed(),
        cancelled = report.cancelled,
        "run finished"
    );
}

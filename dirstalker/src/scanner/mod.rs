//! # Fuzz Engine
//!
//! This module drives a whole discovery run: every dictionary, every chunk,
//! every candidate.
//!
//! The engine is built around three pieces:
//!
//! - [`FuzzEngine`]: the coordinator and its [`EngineRunState`] machine
//! - [`ChunkedWorkerPool`]: bounded concurrent probing of one chunk at a time
//! - a pluggable [`LogFormatter`] deciding what console lines look like
//!
//! ---
//!
//! ## Architecture Overview
//!
//! ```text
//! +------------------------------------------------------+
//! |                      FuzzEngine                      |
//! |   for each dictionary:                               |
//! |     WordlistSource ──chunk──► ChunkedWorkerPool      |
//! |                                   │ (completion order)|
//! |     ProgressTracker ◄─advance─ outcome ─► formatter  |
//! +------------------------------------------------------+
//! ```
//!
//! One coordinating task pulls a chunk, hands it to the pool and consumes
//! the pool's results until the chunk is drained. Only then is the next
//! chunk read. Hits are printed as they arrive; every delivered result
//! advances the progress line.
//!
//! ## State machine
//!
//! ```text
//! Idle ─► StreamingChunk ─► Probing ─► ChunkComplete ─► StreamingChunk ...
//!              │                │
//!              │                ├─ probe error ─► Aborted ─► StreamingChunk
//!              │                └─ cancelled ───► Cancelled (terminal)
//!              └─ input exhausted ─► DictionaryComplete ─► Idle ... ─► Done
//! ```
//!
//! ## Failure policy
//!
//! - **Unreadable dictionary**: the error is printed and the run moves on to
//!   the next dictionary.
//! - **Probe error**: the error is printed, the rest of the current chunk is
//!   abandoned without retry and without advancing progress, and the engine
//!   continues with the next chunk. One failing request can therefore drop
//!   the remaining coverage of its chunk.
//! - **Cancellation**: once the engine's [`CancellationToken`] fires, the
//!   active chunk is abandoned without waiting for in-flight probes,
//!   `Interrupted` is printed and [`FuzzEngine::run`] returns a report with
//!   `cancelled` set. No further chunk or dictionary is started.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirstalker::probe::{HttpProbe, ProbeConfig};
//! use dirstalker::scanner::{EngineOptions, FuzzEngine, PlainFormatter};
//! use dirstalker::utils::{DictionarySet, TargetUrl};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dirstalker::Error> {
//!     let target = TargetUrl::new("http://127.0.0.1:8080/")?;
//!     let probe = HttpProbe::new(target.clone(), &ProbeConfig::default())?;
//!     let dictionaries = DictionarySet::resolve("dicts", &["common".to_string()])?;
//!
//!     let mut engine = FuzzEngine::new(probe, target, PlainFormatter)
//!         .with_options(EngineOptions::default().with_concurrency(16));
//!
//!     // Give up after ten minutes.
//!     let cancel = engine.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(std::time::Duration::from_secs(600)).await;
//!         cancel.cancel();
//!     });
//!
//!     let report = engine.run(&dictionaries).await;
//!     println!("{} hits", report.hits());
//!     Ok(())
//! }
//! ```
use std::fmt::Display;

use tokio::io::{AsyncBufRead, AsyncSeek};
use tokio_util::sync::CancellationToken;

use crate::{
    probe::{Probe, ProbeError, ProbeResult},
    progress::ProgressTracker,
    utils::{Dictionary, DictionarySet, TargetUrl},
    wordlist::{DEFAULT_CHUNK_BYTES, WordlistError, WordlistSource},
};

pub mod formatter;
pub use formatter::{JsonFormatter, LogFormatter, PlainFormatter};
pub mod pool;
pub use pool::{ChunkRun, ChunkedWorkerPool, ProbeOutcome};

/// Runtime configuration for the engine.
///
/// # Defaults
/// ```rust,ignore
/// EngineOptions {
///     concurrency: default_concurrency(),
///     chunk_bytes: 1024,
///     show_progress: true,
/// }
/// ```
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Chunk size hint, in wordlist bytes.
    pub chunk_bytes: usize,
    /// Draw the live progress line on stderr.
    pub show_progress: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            show_progress: true,
        }
    }
}

impl EngineOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Number of CPUs plus four, capped at 32.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_add(4)
        .min(32)
}

/// Where the engine is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRunState {
    Idle,
    StreamingChunk,
    Probing,
    ChunkComplete,
    DictionaryComplete,
    Cancelled,
    /// The current chunk (or dictionary) was given up after an error.
    Aborted,
    Done,
}

/// How a dictionary's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryOutcome {
    Completed,
    Unreadable,
    Cancelled,
}

/// Per-dictionary statistics.
#[derive(Debug, Clone)]
pub struct DictionaryReport {
    pub name: String,
    pub total: usize,
    pub processed: usize,
    pub chunks: usize,
    pub hits: Vec<ProbeResult>,
    pub failed_probes: usize,
    /// Candidates whose result was never delivered.
    pub abandoned: usize,
    pub outcome: DictionaryOutcome,
}

impl DictionaryReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total: 0,
            processed: 0,
            chunks: 0,
            hits: Vec::new(),
            failed_probes: 0,
            abandoned: 0,
            outcome: DictionaryOutcome::Completed,
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub dictionaries: Vec<DictionaryReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn hits(&self) -> usize {
        self.dictionaries.iter().map(|d| d.hits.len()).sum()
    }

    pub fn processed(&self) -> usize {
        self.dictionaries.iter().map(|d| d.processed).sum()
    }
}

/// The coordinator of a discovery run.
pub struct FuzzEngine<P, F> {
    pool: ChunkedWorkerPool<P>,
    formatter: F,
    target: TargetUrl,
    options: EngineOptions,
    state: EngineRunState,
    cancellation_token: CancellationToken,
}

impl<P, F> FuzzEngine<P, F>
where
    P: Probe,
    F: LogFormatter,
{
    /// Creates an engine with default [`EngineOptions`].
    ///
    /// `target` is only used for reporting; `probe` decides what is fetched.
    pub fn new(probe: P, target: TargetUrl, formatter: F) -> Self {
        let options = EngineOptions::default();
        let cancellation_token = CancellationToken::new();
        let pool = ChunkedWorkerPool::new(probe, options.concurrency)
            .with_cancellation(cancellation_token.clone());

        Self {
            pool,
            formatter,
            target,
            options,
            state: EngineRunState::Idle,
            cancellation_token,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.pool = self.pool.with_concurrency(options.concurrency);
        self.options = options;
        self
    }

    /// Replaces the engine's cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.pool = self.pool.with_cancellation(token.clone());
        self.cancellation_token = token;
        self
    }

    /// A handle that interrupts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn state(&self) -> EngineRunState {
        self.state
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn probe(&self) -> &P {
        self.pool.probe()
    }

    /// Fuzzes every dictionary in order.
    pub async fn run(&mut self, dictionaries: &DictionarySet) -> RunReport {
        let mut report = RunReport::default();

        for dictionary in dictionaries {
            if self.cancellation_token.is_cancelled() {
                println!("{}", self.formatter.interrupted());
                self.enter(EngineRunState::Cancelled);
                break;
            }

            let dict_report = self.run_dictionary(dictionary).await;
            let cancelled = dict_report.outcome == DictionaryOutcome::Cancelled;
            report.dictionaries.push(dict_report);
            if cancelled {
                break;
            }
            self.enter(EngineRunState::Idle);
        }

        report.cancelled = self.state == EngineRunState::Cancelled;
        if !report.cancelled {
            self.enter(EngineRunState::Done);
        }
        report
    }

    async fn run_dictionary(&mut self, dictionary: &Dictionary) -> DictionaryReport {
        println!("{}", self.formatter.banner(dictionary));
        tracing::info!(name = %dictionary.name, path = %dictionary.path.display(), "starting dictionary");

        match WordlistSource::open(&dictionary.path).await {
            Ok(source) => self.run_wordlist(&dictionary.name, source).await,
            Err(error) => {
                println!("{}", self.formatter.wordlist_error(&error));
                tracing::warn!(%error, "skipping dictionary");
                self.enter(EngineRunState::Aborted);

                let mut report = DictionaryReport::new(&dictionary.name);
                report.outcome = DictionaryOutcome::Unreadable;
                report
            }
        }
    }

    /// Fuzzes a single already opened wordlist.
    pub async fn run_wordlist<R>(&mut self, name: &str, mut source: WordlistSource<R>) -> DictionaryReport
    where
        R: AsyncBufRead + AsyncSeek + Unpin,
    {
        let mut report = DictionaryReport::new(name);

        report.total = match source.total().await {
            Ok(total) => total,
            Err(error) => {
                println!("{}", self.formatter.wordlist_error(&error));
                tracing::warn!(%error, "skipping dictionary");
                self.enter(EngineRunState::Aborted);
                report.outcome = DictionaryOutcome::Unreadable;
                return report;
            }
        };

        let progress = if self.options.show_progress {
            ProgressTracker::new(report.total)
        } else {
            ProgressTracker::hidden(report.total)
        };

        loop {
            if self.cancellation_token.is_cancelled() {
                self.enter(EngineRunState::Cancelled);
                break;
            }

            self.enter(EngineRunState::StreamingChunk);
            let chunk = match source.next_chunk(self.options.chunk_bytes).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    self.enter(EngineRunState::DictionaryComplete);
                    break;
                }
                Err(error) => {
                    progress.println(self.formatter.wordlist_error(&error));
                    tracing::warn!(%error, "wordlist became unreadable");
                    self.enter(EngineRunState::Aborted);
                    report.outcome = DictionaryOutcome::Unreadable;
                    break;
                }
            };

            report.chunks += 1;
            self.enter(EngineRunState::Probing);

            let ctx = ChunkContext {
                formatter: &self.formatter,
                target: &self.target,
                progress: &progress,
                cancel: &self.cancellation_token,
            };
            let next = drive_chunk(self.pool.run(chunk), ctx, &mut report).await;
            self.enter(next);
        }

        report.processed = progress.state().processed;
        if self.state == EngineRunState::Cancelled {
            report.outcome = DictionaryOutcome::Cancelled;
            progress.println(self.formatter.interrupted());
            progress.abandon();
        } else {
            progress.finish();
        }

        tracing::info!(
            name,
            processed = report.processed,
            total = report.total,
            hits = report.hits.len(),
            abandoned = report.abandoned,
            "dictionary finished"
        );
        report
    }

    fn enter(&mut self, next: EngineRunState) {
        tracing::debug!(from = ?self.state, to = ?next, "engine state");
        self.state = next;
    }
}

/// Borrowed engine pieces needed while a chunk is being probed.
struct ChunkContext<'a, F> {
    formatter: &'a F,
    target: &'a TargetUrl,
    progress: &'a ProgressTracker,
    cancel: &'a CancellationToken,
}

/// Consumes one chunk's results and returns the state to move to.
async fn drive_chunk<F: LogFormatter>(
    mut run: ChunkRun<'_>,
    ctx: ChunkContext<'_, F>,
    report: &mut DictionaryReport,
) -> EngineRunState {
    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => None,
            outcome = run.next() => Some(outcome),
        };

        let Some(outcome) = next else {
            report.abandoned += run.abandon();
            return EngineRunState::Cancelled;
        };

        match outcome {
            None => return EngineRunState::ChunkComplete,
            Some(Ok(result)) => {
                if result.is_hit {
                    ctx.progress.println(ctx.formatter.hit(ctx.target, &result));
                }
                ctx.progress.advance(&result.candidate);
                if result.is_hit {
                    report.hits.push(result);
                }
            }
            Some(Err(error)) => {
                report.failed_probes += 1;
                ctx.progress.println(ctx.formatter.probe_error(&error));

                let (seq, in_flight) = (run.seq(), run.in_flight());
                let dropped = run.abandon();
                report.abandoned += dropped;
                tracing::warn!(%error, chunk = seq, dropped, in_flight, "abandoning rest of chunk");
                return EngineRunState::Aborted;
            }
        }
    }
}

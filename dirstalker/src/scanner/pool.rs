//! # Chunked Worker Pool
//!
//! Runs a [`Probe`] over one [`Chunk`] at a time with bounded concurrency.
//!
//! ```text
//!   Chunk ──► work queue ──► worker 1 ─┐
//!             (Mutex)    ──► worker 2 ─┼──► results (mpsc) ──► ChunkRun::next()
//!                        ──► worker N ─┘
//! ```
//!
//! [`ChunkedWorkerPool::run`] spawns `min(concurrency, chunk.len())` workers
//! that pop candidates from a shared queue until it is empty. Every probe
//! holds a permit from a semaphore owned by the pool, so at most
//! `concurrency` probes are in flight across all chunks, including probes
//! left running by an abandoned chunk. Results come back through the
//! returned [`ChunkRun`] in completion order, one per candidate.
//!
//! ## Barrier
//!
//! A [`ChunkRun`] mutably borrows its pool, so the next chunk cannot be
//! started until the current run has been drained or dropped. A single slow
//! probe therefore holds up the next chunk even when every other worker is
//! idle.
//!
//! ## Abandoning a run
//!
//! Dropping a [`ChunkRun`] (or calling [`ChunkRun::abandon`]) cancels it:
//! queued candidates are discarded and workers stop picking up new ones.
//! Probes already in flight are left to finish in the background and their
//! results are thrown away. They keep their permits until they finish, so
//! the next chunk starts with fewer free slots. Cancelling the pool's token
//! does the same for whatever run is active and every later one.
use std::{
    collections::VecDeque,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    probe::{Probe, ProbeError, ProbeResult},
    wordlist::Chunk,
};

/// What a worker delivers for one candidate.
pub type ProbeOutcome = Result<ProbeResult, ProbeError>;

/// Candidates of the active chunk not yet picked up by a worker.
type WorkQueue = Arc<Mutex<VecDeque<String>>>;

pub struct ChunkedWorkerPool<P> {
    probe: Arc<P>,
    concurrency: usize,
    permits: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl<P: Probe> ChunkedWorkerPool<P> {
    /// A pool running at most `concurrency` probes at once (at least 1).
    pub fn new(probe: P, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            probe: Arc::new(probe),
            concurrency,
            permits: Arc::new(Semaphore::new(concurrency)),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Ties the pool to an outer token: once it is cancelled no worker
    /// starts another probe.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self.permits = Arc::new(Semaphore::new(self.concurrency));
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Starts probing `chunk`.
    pub fn run(&mut self, chunk: Chunk) -> ChunkRun<'_> {
        let seq = chunk.seq();
        let total = chunk.len();
        let queue: WorkQueue = Arc::new(Mutex::new(chunk.into_candidates().into()));
        let (results_tx, results_rx) = mpsc::channel(total.max(1));
        let cancel = self.cancellation_token.child_token();
        let in_flight = Arc::new(AtomicUsize::new(0));

        for _ in 0..self.concurrency.min(total) {
            tokio::spawn(worker(
                self.probe.clone(),
                self.permits.clone(),
                queue.clone(),
                results_tx.clone(),
                cancel.clone(),
                in_flight.clone(),
            ));
        }

        ChunkRun {
            seq,
            results: ReceiverStream::new(results_rx),
            queue,
            remaining: total,
            in_flight,
            _cancel_on_drop: cancel.drop_guard(),
            _pool: PhantomData,
        }
    }
}

/// RAII counter of probes currently executing.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn worker<P: Probe>(
    probe: Arc<P>,
    permits: Arc<Semaphore>,
    queue: WorkQueue,
    results: mpsc::Sender<ProbeOutcome>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
) {
    loop {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = permits.acquire() => permit,
        };
        let Ok(permit) = permit else {
            break;
        };

        let next = queue.lock().pop_front();
        let Some(candidate) = next else {
            break;
        };

        let outcome = {
            let _guard = InFlightGuard::enter(in_flight.clone());
            probe.probe(&candidate).await
        };
        drop(permit);

        if cancel.is_cancelled() || results.send(outcome).await.is_err() {
            tracing::trace!(candidate, "result discarded after cancellation");
            break;
        }
    }
}

/// The result sequence of one chunk.
pub struct ChunkRun<'pool> {
    seq: usize,
    results: ReceiverStream<ProbeOutcome>,
    queue: WorkQueue,
    remaining: usize,
    in_flight: Arc<AtomicUsize>,
    _cancel_on_drop: DropGuard,
    _pool: PhantomData<&'pool mut ()>,
}

impl ChunkRun<'_> {
    /// The next completed probe, or `None` once every candidate has been
    /// delivered (or the pool was cancelled).
    pub async fn next(&mut self) -> Option<ProbeOutcome> {
        if self.remaining == 0 {
            return None;
        }
        let outcome = self.results.next().await?;
        self.remaining -= 1;
        Some(outcome)
    }

    pub fn seq(&self) -> usize {
        self.seq
    }

    /// Candidates whose outcome has not been delivered yet.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Probes executing right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stops the run without waiting for in-flight probes and returns the
    /// number of candidates that will never be delivered.
    pub fn abandon(self) -> usize {
        self.queue.lock().clear();
        self.remaining
    }
}

//! # Progress Tracker
//!
//! A live `processed/total last-candidate` line for one wordlist.
//!
//! All increments go through [`ProgressTracker::advance`], which holds a lock
//! across both the counter update and the redraw, so concurrent callers can
//! neither lose an update nor render counts out of order. The counter stops
//! at `total`; extra calls are refused and reported as `false`.
//!
//! Console lines printed while the bar is live must go through
//! [`ProgressTracker::println`], which clears the bar, prints to stdout and
//! redraws it.
use std::fmt::Display;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub processed: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }
}

pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    bar: ProgressBar,
}

impl ProgressTracker {
    /// A tracker drawing on stderr.
    pub fn new(total: usize) -> Self {
        Self::with_target(total, ProgressDrawTarget::stderr())
    }

    /// A tracker that counts without drawing anything.
    pub fn hidden(total: usize) -> Self {
        Self::with_target(total, ProgressDrawTarget::hidden())
    }

    fn with_target(total: usize, target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template("{pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::with_draw_target(Some(total as u64), target).with_style(style);

        Self {
            state: Mutex::new(ProgressState {
                processed: 0,
                total,
            }),
            bar,
        }
    }

    /// Records one processed candidate. Returns `false`, changing nothing,
    /// once `total` has been reached.
    pub fn advance(&self, candidate: &str) -> bool {
        let mut state = self.state.lock();
        if state.processed >= state.total {
            return false;
        }
        state.processed += 1;
        self.bar.set_message(candidate.to_string());
        self.bar.set_position(state.processed as u64);
        true
    }

    pub fn state(&self) -> ProgressState {
        *self.state.lock()
    }

    /// Prints `line` to stdout without tearing the progress line.
    pub fn println(&self, line: impl Display) {
        self.bar.suspend(|| println!("{line}"));
    }

    /// Leaves the final counter on screen.
    pub fn finish(&self) {
        self.bar.finish();
    }

    /// Removes the progress line, e.g. when a run is interrupted.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_advance_counts_up_to_total() {
        let tracker = ProgressTracker::hidden(3);

        assert!(tracker.advance("admin"));
        assert!(tracker.advance(""));
        assert!(tracker.advance("robots.txt"));
        assert_eq!(tracker.state(), ProgressState { processed: 3, total: 3 });
        assert!(tracker.state().is_complete());
    }

    #[test]
    fn test_advance_never_overshoots() {
        let tracker = ProgressTracker::hidden(1);

        assert!(tracker.advance("a"));
        assert!(!tracker.advance("b"));
        assert_eq!(tracker.state().processed, 1);
    }

    #[test]
    fn test_empty_wordlist_is_complete_immediately() {
        let tracker = ProgressTracker::hidden(0);
        assert!(tracker.state().is_complete());
        assert!(!tracker.advance("x"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_advances_are_not_lost() {
        let tracker = Arc::new(ProgressTracker::hidden(500));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    let mut accepted = 0;
                    for i in 0..100 {
                        if tracker.advance(&format!("w{worker}-{i}")) {
                            accepted += 1;
                        }
                        tokio::task::yield_now().await;
                    }
                    accepted
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            accepted += handle.await.unwrap();
        }

        assert_eq!(accepted, 500);
        assert_eq!(tracker.state().processed, 500);
    }
}

//! Response memoization as an explicit decorator around another [`Probe`].
//!
//! Only successful results are stored; errors always reach the caller and
//! the next probe for that candidate goes back to the inner probe. Keys are
//! candidates, so one cache must not be shared between different targets.
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Probe, ProbeError, ProbeResult};

pub struct CachedProbe<P> {
    inner: P,
    entries: Mutex<HashMap<String, ProbeResult>>,
}

impl<P: Probe> CachedProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: Probe> Probe for CachedProbe<P> {
    async fn probe(&self, candidate: &str) -> Result<ProbeResult, ProbeError> {
        let cached = self.entries.lock().get(candidate).cloned();
        if let Some(cached) = cached {
            tracing::trace!(candidate, "cache hit");
            return Ok(cached);
        }

        let result = self.inner.probe(candidate).await?;
        self.entries
            .lock()
            .insert(candidate.to_string(), result.clone());
        Ok(result)
    }
}

//! # Path Probes
//!
//! A [`Probe`] turns one candidate into one classified [`ProbeResult`], or a
//! [`ProbeError`] when no response could be obtained.
//!
//! The trait is the seam between the worker pool and the network:
//!
//! - [`HttpProbe`]: the real thing, one `GET <base><candidate>` per call
//! - [`CachedProbe`]: memoizes another probe's results by candidate
//!
//! Any `Send + Sync` type can implement it, which is how the engine and the
//! pool are tested without sockets.
//!
//! ## Classification
//!
//! ```text
//! 2xx  -> hit
//! 5xx+ -> hit
//! else -> miss (1xx, 3xx, 4xx)
//! ```
use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cache;
pub use cache::CachedProbe;
pub mod http;
pub use http::{HttpProbe, ProbeConfig};

/// Performs one probe for one candidate.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self, candidate: &str) -> Result<ProbeResult, ProbeError>;
}

/// Outcome of a completed probe.
///
/// `bytes` and `title` are only populated for hits; misses report `0` and
/// an empty title because their bodies are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub candidate: String,
    pub is_hit: bool,
    pub status: u16,
    pub bytes: usize,
    pub title: String,
}

impl ProbeResult {
    pub fn miss(candidate: impl Into<String>, status: u16) -> Self {
        Self {
            candidate: candidate.into(),
            is_hit: false,
            status,
            bytes: 0,
            title: String::new(),
        }
    }

    pub fn hit(candidate: impl Into<String>, status: u16, bytes: usize, title: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            is_hit: true,
            status,
            bytes,
            title: title.into(),
        }
    }
}

/// Whether a status code means the path exists.
pub fn is_hit(status: u16) -> bool {
    (200..300).contains(&status) || status >= 500
}

/// What went wrong on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkErrorKind {
    Timeout,
    ConnectionFailure,
    TlsFailure,
    /// Malformed URL, broken response or body read failure.
    Protocol,
}

impl Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionFailure => write!(f, "connection failure"),
            Self::TlsFailure => write!(f, "tls failure"),
            Self::Protocol => write!(f, "protocol error"),
        }
    }
}

/// A probe that produced no response.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{kind} while probing {candidate:?}: {source}")]
    Network {
        candidate: String,
        kind: NetworkErrorKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ProbeError {
    pub fn network(
        candidate: impl Into<String>,
        kind: NetworkErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            candidate: candidate.into(),
            kind,
            source: source.into(),
        }
    }

    pub fn candidate(&self) -> &str {
        match self {
            Self::Network { candidate, .. } => candidate,
        }
    }

    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            Self::Network { kind, .. } => *kind,
        }
    }
}

//! Crate-level errors for setting up a run.
//!
//! Failures during a run are not surfaced here: an unreadable wordlist is a
//! [`WordlistError`](crate::wordlist::WordlistError) that skips one
//! dictionary, and a failed request is a
//! [`ProbeError`](crate::probe::ProbeError) that abandons one chunk.
use std::path::PathBuf;

use thiserror::Error;

use crate::utils::TargetUrlError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid target url: {0}")]
    Target(#[from] TargetUrlError),

    #[error("cannot read dictionary directory {}: {source}", path.display())]
    DictionaryDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

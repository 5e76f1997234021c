//! # DirStalker
//!
//! A library for discovering hidden paths on a web server by requesting
//! candidate names from wordlists and reporting the ones that answer.
//!
//! ## Features
//!
//! - **Target parsing** - `http`/`https` base URLs with DNS, IPv4 and IPv6 hosts
//! - **Dictionary resolution** - named wordlists or every `*.txt` in a directory
//! - **Chunked streaming** - wordlists are read in bounded chunks, never whole
//! - **Bounded concurrency** - a worker pool caps in-flight requests across chunks
//! - **Classification** - `2xx` and `5xx+` are hits, with page title and size
//! - **Live progress** - one `processed/total candidate` line per dictionary
//! - **Cancellation** - a token interrupts the run between or during chunks
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! dirstalker = { path = "../dirstalker" }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Usage Examples
//!
//! ### Target Parsing
//!
//! ```rust
//! use dirstalker::utils::{HostKind, TargetUrl};
//!
//! let target = TargetUrl::new("http://127.0.0.1:8000/").unwrap();
//! assert_eq!(target.host_kind, HostKind::IPv4);
//! assert_eq!(target.port, 8000);
//! assert_eq!(target.candidate_url("admin"), "http://127.0.0.1:8000/admin");
//! ```
//!
//! ### Streaming a Wordlist
//!
//! ```rust,no_run
//! use dirstalker::wordlist::WordlistSource;
//!
//! # async fn demo() -> Result<(), dirstalker::wordlist::WordlistError> {
//! let mut source = WordlistSource::open("dicts/common.txt").await?;
//! println!("{} candidates", source.total().await?);
//!
//! while let Some(chunk) = source.next_chunk(1024).await? {
//!     println!("chunk {} has {} candidates", chunk.seq(), chunk.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### A Full Run
//!
//! See [`scanner`] for the engine, its state machine and failure policy.
//!
//! ## Architecture
//!
//! - **`utils`** - target URL parsing and dictionary resolution
//! - **`wordlist`** - line counting and chunked reading of one wordlist
//! - **`probe`** - the `Probe` trait, its HTTP implementation and a cache
//! - **`progress`** - the serialized progress counter and console line
//! - **`scanner`** - the worker pool, output formatters and the engine
//! - **`error`** - errors raised while setting up a run
//!
//! ## Error Handling
//!
//! ```rust
//! use dirstalker::utils::{TargetUrl, TargetUrlError};
//!
//! match TargetUrl::new("ftp://example.com/") {
//!     Err(TargetUrlError::InvalidScheme(input)) => assert_eq!(input, "ftp://example.com/"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

pub mod error;
pub use error::Error;

pub mod probe;

pub mod progress;

pub mod scanner;

pub mod utils;

pub mod wordlist;

#[cfg(test)]
pub(crate) mod testing;

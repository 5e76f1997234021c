//! # Wordlist Source
//!
//! Streams a wordlist as a sequence of bounded [`Chunk`]s.
//!
//! A chunk is filled line by line until the raw byte length of the lines
//! read so far reaches the chunk hint, so every non-empty chunk holds at
//! least one candidate and the final chunk may be smaller. Each candidate
//! is the line with surrounding whitespace trimmed. Blank lines are kept
//! as empty candidates, which probe the base URL itself. Bytes that are not
//! valid UTF-8 are replaced with `U+FFFD` rather than failing the wordlist.
//!
//! Reading every chunk in order yields every line of the file exactly once.
//! [`WordlistSource::total`] counts lines and rewinds, so it can be called
//! before (or after) chunking without losing anything.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), dirstalker::wordlist::WordlistError> {
//! use dirstalker::wordlist::WordlistSource;
//!
//! let mut source = WordlistSource::open("dicts/common.txt").await?;
//! let total = source.total().await?;
//! while let Some(chunk) = source.next_chunk(1024).await? {
//!     println!("chunk {} of {total}: {} candidates", chunk.seq(), chunk.len());
//! }
//! # Ok(())
//! # }
//! ```
use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, AsyncSeek, AsyncSeekExt, BufReader},
};

/// Default chunk hint in bytes.
pub const DEFAULT_CHUNK_BYTES: usize = 1024;

/// A dictionary that could not be read.
#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("cannot open wordlist {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read wordlist {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An ordered batch of candidates handed to the worker pool as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    seq: usize,
    candidates: Vec<String>,
}

impl Chunk {
    pub fn new(seq: usize, candidates: Vec<String>) -> Self {
        Self { seq, candidates }
    }

    /// Position of this chunk in its wordlist, starting at 0.
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<String> {
        self.candidates
    }
}

/// A restartable, ordered stream of candidates.
pub struct WordlistSource<R> {
    reader: R,
    path: PathBuf,
    next_seq: usize,
}

impl WordlistSource<BufReader<File>> {
    /// Opens the wordlist at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, WordlistError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|source| WordlistError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R> WordlistSource<R>
where
    R: AsyncBufRead + AsyncSeek + Unpin,
{
    /// Wraps an already opened reader. `path` is only used in errors.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            next_seq: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts the lines of the wordlist, then rewinds to the start.
    ///
    /// A final line without a trailing newline still counts.
    pub async fn total(&mut self) -> Result<usize, WordlistError> {
        self.rewind().await?;

        let mut count = 0;
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|source| self.read_error(source))?;
            if n == 0 {
                break;
            }
            count += 1;
        }

        self.rewind().await?;
        Ok(count)
    }

    /// Reads the next chunk, or `None` once the input is exhausted.
    pub async fn next_chunk(&mut self, max_bytes: usize) -> Result<Option<Chunk>, WordlistError> {
        let mut candidates = Vec::new();
        let mut consumed = 0;
        let mut line = Vec::new();

        while candidates.is_empty() || consumed < max_bytes {
            line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|source| self.read_error(source))?;
            if n == 0 {
                break;
            }
            consumed += n;
            candidates.push(String::from_utf8_lossy(&line).trim().to_string());
        }

        if candidates.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk::new(self.next_seq, candidates);
        self.next_seq += 1;
        Ok(Some(chunk))
    }

    async fn rewind(&mut self) -> Result<(), WordlistError> {
        self.reader
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|source| self.read_error(source))?;
        self.next_seq = 0;
        Ok(())
    }

    fn read_error(&self, source: std::io::Error) -> WordlistError {
        WordlistError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

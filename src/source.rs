//! Where the bytes come from.
//!
//! A [`Source`] is either a live stream the buffer refills from, or nothing at all when every
//! byte was seeded up front. Only the stream variant ever performs I/O.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::{File, Metadata};
use std::io::{self, Read};

/// The backing store of a line buffer.
#[derive(Debug)]
pub enum Source<R> {
    /// Bytes are pulled from the reader on demand.
    Stream(R),

    /// All bytes already live in the buffer; there is nothing to pull.
    Materialized,
}

impl<R: Read> Source<R> {
    /// Reads at most `buf.len()` bytes into `buf`, returning how many were read.
    ///
    /// A [`Materialized`](Source::Materialized) source is always at its end and reads `0`.
    /// Interrupted reads are retried.
    ///
    /// # Errors
    ///
    /// Returns any other I/O error reported by the stream.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Self::Stream(reader) = self else {
            return Ok(0);
        };

        loop {
            match reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R> Source<R> {
    /// Returns `true` if this source is backed by a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

/// Kinds of file a stream reader refuses to read lines from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory.
    Directory,

    /// A block device.
    BlockDevice,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::BlockDevice => f.write_str("block device"),
        }
    }
}

impl SourceKind {
    /// Classifies `metadata`, returning the rejected kind if lines cannot be streamed from it.
    ///
    /// Block devices are only recognised where the platform distinguishes them; elsewhere this
    /// only rejects directories.
    pub fn of(metadata: &Metadata) -> Option<Self> {
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            return Some(Self::Directory);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_block_device() {
                return Some(Self::BlockDevice);
            }
        }

        None
    }
}

/// Checks that `file` is something lines can be streamed from.
///
/// On Windows descriptors carry no such distinction and every file is accepted.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSource`] for directories and block devices, or
/// [`Error::Metadata`] if the file cannot be inspected.
pub fn ensure_streamable(file: &File) -> Result<()> {
    if cfg!(windows) {
        return Ok(());
    }

    let metadata = file.metadata().map_err(Error::Metadata)?;
    match SourceKind::of(&metadata) {
        Some(kind) => Err(Error::UnsupportedSource(kind)),
        None => Ok(()),
    }
}

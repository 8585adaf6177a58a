//! Errors reported by the line reader.
//!
//! Only conditions that stop the reader from producing lines are errors. Reaching the end of the
//! source and cutting a line short at the growth ceiling are ordinary outcomes and never show up
//! here.

use crate::source::SourceKind;
use std::collections::TryReserveError;
use std::io;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of an init or read operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Allocating or growing the line storage failed.
    #[error("failed to allocate line buffer storage")]
    Alloc(#[from] TryReserveError),

    /// Reading from the backing stream failed.
    #[error("failed to read from the line source")]
    Io(#[from] io::Error),

    /// Querying the kind of the backing file failed.
    #[error("failed to inspect the line source")]
    Metadata(#[source] io::Error),

    /// The backing file is not something lines can be streamed from.
    #[error("cannot read lines from a {0}")]
    UnsupportedSource(SourceKind),
}

impl Error {
    /// Returns the [`io::ErrorKind`] behind this error, if it came from the operating system.
    ///
    /// This is the closest thing to a process-wide error code the reader records.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(e) | Self::Metadata(e) => Some(e.kind()),
            Self::Alloc(_) | Self::UnsupportedSource(_) => None,
        }
    }
}

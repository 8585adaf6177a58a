//! Handle-style entry points for batch clients.
//!
//! These wrap [`LineReader`] for callers that drive a reader through an optional handle: opening
//! yields `None` on any failure, closing an absent handle is harmless, and seeding either extends
//! an existing handle or creates one.
//!
//! ```
//! use batch_readline::batch::{FragmentHandle, close, read_line, seed_from_fragment};
//!
//! let mut handle: FragmentHandle = seed_from_fragment(None, "SELECT 1");
//! handle = seed_from_fragment(handle, "SELECT 2");
//!
//! let reader = handle.as_mut().unwrap();
//! assert_eq!(read_line(reader, false), Some(&b"SELECT 1 SELECT 2"[..]));
//! assert_eq!(read_line(reader, false), None);
//!
//! close(&mut handle);
//! close(&mut handle); // Closing again does nothing
//! ```

use crate::ReadLine;
use crate::reader::LineReader;
use std::fs::File;
use std::io::{self, Read};
use tracing::warn;

/// Opens a line reader over `file` whose buffer may grow up to `max_capacity` bytes.
///
/// Returns `None` if `file` is a directory or block device, cannot be inspected, or the buffer
/// cannot be allocated. Nothing stays allocated in that case.
pub fn open_stream_source(file: File, max_capacity: usize) -> Option<LineReader<File>> {
    match LineReader::open_with(file, max_capacity) {
        Ok(reader) => Some(reader),
        Err(e) => {
            warn!(error = %e, "refusing line source");
            None
        }
    }
}

/// Returns the next line from `handle`, see [`ReadLine::read_line`].
pub fn read_line<R: Read>(handle: &mut LineReader<R>, binary_mode: bool) -> Option<&[u8]> {
    handle.read_line(binary_mode)
}

/// Releases the reader behind `handle`, leaving `None` behind.
///
/// Does nothing if `handle` is already `None`.
pub fn close<R>(handle: &mut Option<LineReader<R>>) {
    drop(handle.take());
}

/// Appends `text` to the reader behind `handle`, creating a fragment reader if there is none.
///
/// Returns `None` if the buffer cannot be allocated or extended. The reader passed in is
/// released in that case.
pub fn seed_from_fragment<R>(
    handle: Option<LineReader<R>>,
    text: impl AsRef<[u8]>,
) -> Option<LineReader<R>> {
    let seeded = match handle {
        Some(mut reader) => reader.seed_fragment(text).map(|()| reader),
        None => LineReader::with_fragment(text),
    };

    match seeded {
        Ok(reader) => Some(reader),
        Err(e) => {
            warn!(error = %e, "failed to seed line fragment");
            None
        }
    }
}

/// A handle with no stream behind it, as produced by seeding from scratch.
pub type FragmentHandle = Option<LineReader<io::Empty>>;

//! Growable line storage and the filler that keeps it supplied.
//!
//! The [`LineBuffer`] owns the bytes a line reader hands out and three cursors into them. It is
//! refilled from a [`Source`] only when the unread part holds no complete line, and on each refill
//! it drops the lines already delivered, keeping exactly the unconsumed remainder at the front.
//!
//! # Example
//!
//! ```
//! use batch_readline::buffer::{FillOutcome, LineBuffer};
//! use batch_readline::source::Source;
//! use std::io::Cursor;
//!
//! let mut source = Source::Stream(Cursor::new(b"SELECT 1;\nSELECT".to_vec()));
//! let mut buffer = LineBuffer::with_capacity(16, 64).unwrap();
//!
//! // The first refill pulls one chunk
//! assert_eq!(buffer.fill(&mut source).unwrap(), FillOutcome::Filled(16));
//!
//! // A second refill hits the end and closes the last line with a terminator
//! buffer.finish_line(10);
//! buffer.begin_line();
//! assert_eq!(buffer.fill(&mut source).unwrap(), FillOutcome::Filled(1));
//! assert_eq!(buffer.unconsumed(), b"SELECT\n");
//! ```

use crate::constants::{FRAGMENT_SEPARATOR, SENTINEL, TERMINATOR};
use crate::error::Result;
use crate::source::Source;
use std::io::Read;
use tracing::{debug, trace};

/// Outcome of a single [`LineBuffer::fill`].
///
/// I/O and allocation failures are reported through the surrounding `Result` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// New bytes were appended after the unconsumed remainder.
    ///
    /// Contains the number of new bytes, including a terminator synthesized at end-of-source.
    Filled(usize),

    /// The source is exhausted and nothing was appended.
    Eof,

    /// There is no room for another chunk and the buffer may not grow any further.
    ///
    /// The source is not exhausted; the caller is expected to cut the current line short.
    Capped,
}

/// Owned line storage with cursors kept as offsets.
///
/// Storage is always one byte longer than the logical capacity so that a [`SENTINEL`] fits after
/// the last valid byte.
///
/// # Invariants
///
/// `0 <= start_of_line <= end_of_line <= end <= cap <= max_cap` and
/// `storage.len() == cap + 1` and `storage[end] == SENTINEL` hold between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    /// Byte storage, `cap + 1` bytes long.
    storage: Vec<u8>,
    /// Logical capacity.
    cap: usize,
    /// Ceiling for `cap`.
    max_cap: usize,
    /// Read granularity.
    chunk: usize,
    /// First byte of the line being delivered.
    start_of_line: usize,
    /// One past the last byte delivered so far.
    end_of_line: usize,
    /// One past the last valid byte.
    end: usize,
    /// Whether the source has been drained.
    at_end_of_source: bool,
}

impl LineBuffer {
    /// Allocates an empty buffer of `chunk` bytes that may grow up to `max_cap` bytes.
    ///
    /// A zero `chunk` is raised to 1, and `max_cap` is raised to at least the chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if the storage cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_readline::buffer::LineBuffer;
    /// let buffer = LineBuffer::with_capacity(4096, 1024).unwrap();
    /// assert_eq!(buffer.cap(), 4096);
    /// assert_eq!(buffer.max_cap(), 4096); // Raised to fit the first chunk
    /// ```
    #[expect(clippy::arithmetic_side_effects, reason = "Reserve fails before overflow")]
    pub fn with_capacity(chunk: usize, max_cap: usize) -> Result<Self> {
        let chunk = chunk.max(1);

        let mut storage = Vec::new();
        storage.try_reserve_exact(chunk.saturating_add(1))?;
        storage.resize(chunk + 1, SENTINEL);

        Ok(Self {
            storage,
            cap: chunk,
            max_cap: max_cap.max(chunk),
            chunk,
            start_of_line: 0,
            end_of_line: 0,
            end: 0,
            at_end_of_source: false,
        })
    }

    /// Creates a fully materialized buffer holding `text` as its only content.
    ///
    /// See [`seed`](Self::seed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if the storage cannot be allocated.
    pub fn from_fragment(text: &[u8]) -> Result<Self> {
        let mut buffer = Self {
            storage: Vec::new(),
            cap: 0,
            max_cap: 0,
            chunk: 1,
            start_of_line: 0,
            end_of_line: 0,
            end: 0,
            at_end_of_source: true,
        };
        buffer.seed(text)?;
        Ok(buffer)
    }

    /// Returns the logical capacity in bytes.
    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the capacity ceiling in bytes.
    #[inline]
    pub fn max_cap(&self) -> usize {
        self.max_cap
    }

    /// Returns the read granularity in bytes.
    #[inline]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Returns the offset of the first byte of the current line.
    #[inline]
    pub fn start_of_line(&self) -> usize {
        self.start_of_line
    }

    /// Returns the offset one past the last byte delivered.
    #[inline]
    pub fn end_of_line(&self) -> usize {
        self.end_of_line
    }

    /// Returns the offset one past the last valid byte.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns `true` once the source has been drained or the buffer was seeded.
    #[inline]
    pub fn at_end_of_source(&self) -> bool {
        self.at_end_of_source
    }

    /// Returns the valid content, from the start of the storage up to [`end`](Self::end).
    ///
    /// Bytes before [`start_of_line`](Self::start_of_line) are already delivered lines that have
    /// not been compacted away yet.
    #[expect(clippy::indexing_slicing, reason = "Safe by invariant")]
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.storage[..self.end]
    }

    /// Returns the bytes not yet delivered, from [`end_of_line`](Self::end_of_line) to
    /// [`end`](Self::end).
    #[expect(clippy::indexing_slicing, reason = "Safe by invariant")]
    #[inline]
    pub fn unconsumed(&self) -> &[u8] {
        &self.storage[self.end_of_line..self.end]
    }

    /// Starts a new line where the previous one ended, returning its offset.
    #[inline]
    pub fn begin_line(&mut self) -> usize {
        self.start_of_line = self.end_of_line;
        self.start_of_line
    }

    /// Marks everything before `end_of_line` as delivered.
    ///
    /// The offset is clamped to `start_of_line..=end`.
    #[inline]
    pub fn finish_line(&mut self, end_of_line: usize) {
        self.end_of_line = end_of_line.clamp(self.start_of_line, self.end);
    }

    /// Returns the offset of the first [`TERMINATOR`] at or after `from`, if there is one before
    /// [`end`](Self::end).
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe by invariant"
    )]
    #[inline]
    pub fn find_terminator(&self, from: usize) -> Option<usize> {
        let from = from.min(self.end);
        self.storage[from..self.end]
            .iter()
            .position(|&b| b == TERMINATOR)
            .map(|i| from + i)
    }

    /// Returns the bytes in `start..end`, clamped to the valid content.
    #[expect(clippy::indexing_slicing, reason = "Safe by clamping")]
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.end);
        &self.storage[start.min(end)..end]
    }

    /// Writes a [`SENTINEL`] at `offset` so that the bytes before it read as a bounded string.
    ///
    /// Only offsets within the delivered line, or [`end`](Self::end) itself, are written. Others
    /// are ignored so that no unread byte is ever overwritten.
    #[expect(clippy::indexing_slicing, reason = "Safe by bounds check")]
    #[inline]
    pub fn terminate_at(&mut self, offset: usize) {
        if offset == self.end || (self.start_of_line..self.end_of_line).contains(&offset) {
            self.storage[offset] = SENTINEL;
        }
    }

    /// Moves the unconsumed remainder, from `start_of_line` to `end`, to the front of the storage.
    ///
    /// All cursors shift by the same amount, so offsets taken relative to `start_of_line` stay
    /// valid. A [`SENTINEL`] is written after the moved bytes.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe by invariant"
    )]
    pub fn compact(&mut self) {
        let shift = self.start_of_line;
        if shift == 0 {
            return;
        }

        self.storage.copy_within(shift..self.end, 0);
        self.start_of_line = 0;
        self.end_of_line -= shift;
        self.end -= shift;
        self.storage[self.end] = SENTINEL;

        trace!(shift, remaining = self.end, "compacted line buffer");
    }

    /// Doubles the capacity if that stays within the ceiling.
    ///
    /// Returns `Ok(false)` without touching the buffer when doubling would exceed the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if the larger storage cannot be allocated.
    /// The buffer is unchanged in that case.
    #[expect(clippy::arithmetic_side_effects, reason = "Checked against the ceiling")]
    pub fn grow(&mut self) -> Result<bool> {
        let Some(next) = self.cap.checked_mul(2).filter(|&next| next <= self.max_cap) else {
            return Ok(false);
        };

        self.storage.try_reserve_exact(next + 1 - self.storage.len())?;
        self.storage.resize(next + 1, SENTINEL);
        self.cap = next;

        debug!(capacity = next, max_capacity = self.max_cap, "grew line buffer");
        Ok(true)
    }

    /// Pulls more bytes from `source` so that a complete line may become available.
    ///
    /// Grows the buffer while there is no room for a whole chunk after the unconsumed remainder,
    /// compacts, then issues one read of as many whole chunks as fit. When the source is
    /// exhausted and the remainder does not end with a [`TERMINATOR`], one is appended so that
    /// the last line is delimited like every other.
    ///
    /// Returns:
    ///
    /// - [`FillOutcome::Filled`] with the number of new bytes.
    /// - [`FillOutcome::Eof`] if the source is (or already was) exhausted.
    /// - [`FillOutcome::Capped`] if there is no room and the ceiling forbids growth. The buffer
    ///   does not count as exhausted in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if growing fails and
    /// [`Error::Io`](crate::Error::Io) if the read fails. The cursors stay consistent either way.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe by invariant"
    )]
    pub fn fill<R: Read>(&mut self, source: &mut Source<R>) -> Result<FillOutcome> {
        if self.at_end_of_source {
            // Everything read
            return Ok(FillOutcome::Eof);
        }

        let remaining = self.end - self.start_of_line;

        // Find room for at least one whole chunk, growing as needed
        let read_len = loop {
            let room = (self.cap - remaining) / self.chunk * self.chunk;
            if room > 0 {
                break room;
            }

            if !self.grow()? {
                debug!(
                    capacity = self.cap,
                    max_capacity = self.max_cap,
                    "line buffer cannot grow any further"
                );
                return Ok(FillOutcome::Capped);
            }
        };

        // Drop delivered lines
        self.compact();

        // Read in new data after the remainder
        let bytes_read = source.read_chunk(&mut self.storage[self.end..self.end + read_len])?;
        debug!(bytes_read, "filled line buffer");

        if bytes_read > 0 {
            self.end += bytes_read;
            self.storage[self.end] = SENTINEL;
            return Ok(FillOutcome::Filled(bytes_read));
        }

        self.at_end_of_source = true;

        // Pretend every nonempty source ends with a terminator
        if remaining > 0 && self.storage[self.end - 1] != TERMINATOR {
            self.storage[self.end] = TERMINATOR;
            self.end += 1;
            self.storage[self.end] = SENTINEL;
            debug!("terminated last line at end of source");
            return Ok(FillOutcome::Filled(1));
        }

        self.storage[self.end] = SENTINEL;
        debug!("reached end of source");
        Ok(FillOutcome::Eof)
    }

    /// Appends `text` as a final, fully materialized line.
    ///
    /// Everything buffered so far is kept, delivered or not, and all cursors go back to the
    /// start, so the joined content is delivered again from its first byte. If the buffer is not
    /// empty, `text` is joined to it by a single [`FRAGMENT_SEPARATOR`], which takes the place of
    /// its closing terminator. A [`TERMINATOR`] is appended after `text`.
    ///
    /// Afterwards the buffer counts as exhausted and its ceiling is pinned to its capacity, so it
    /// never reads or grows again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if the storage cannot be extended. The
    /// buffer is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use batch_readline::buffer::LineBuffer;
    /// let mut buffer = LineBuffer::from_fragment(b"SELECT 1").unwrap();
    /// buffer.seed(b"SELECT 2").unwrap();
    /// assert_eq!(buffer.unconsumed(), b"SELECT 1 SELECT 2\n");
    /// ```
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Sizes are checked by the reservation"
    )]
    pub fn seed(&mut self, text: &[u8]) -> Result<()> {
        let kept = self.end;
        let closes_with_terminator = kept > 0 && self.storage[self.end - 1] == TERMINATOR;
        let separator = usize::from(kept > 0 && !closes_with_terminator);

        // Content length after seeding, saturating so that the reservation reports overflow
        let len = kept
            .saturating_add(separator)
            .saturating_add(text.len())
            .saturating_add(1);

        // Reserve up front so a failure leaves everything as it was
        let storage_len = len.saturating_add(1);
        if storage_len > self.storage.len() {
            self.storage
                .try_reserve_exact(storage_len - self.storage.len())?;
            self.storage.resize(storage_len, SENTINEL);
        }

        let mut end = kept;
        if closes_with_terminator {
            self.storage[end - 1] = FRAGMENT_SEPARATOR;
        } else if separator > 0 {
            self.storage[end] = FRAGMENT_SEPARATOR;
            end += 1;
        }

        self.storage[end..end + text.len()].copy_from_slice(text);
        end += text.len();
        self.storage[end] = TERMINATOR;
        end += 1;
        self.storage[end] = SENTINEL;

        self.start_of_line = 0;
        self.end_of_line = 0;
        self.end = end;
        self.cap = self.storage.len() - 1;
        self.max_cap = self.cap;
        self.at_end_of_source = true;

        debug!(fragment_len = text.len(), content_len = end, "seeded line buffer");
        Ok(())
    }
}

#[cfg(test)]
impl LineBuffer {
    /// Replaces the content with `data`, growing as needed, with all cursors at the start.
    #[expect(clippy::arithmetic_side_effects, reason = "Okay in tests")]
    pub(crate) fn inject_test_data(&mut self, data: &[u8]) {
        if data.len() > self.cap {
            self.storage.resize(data.len() + 1, SENTINEL);
            self.cap = data.len();
            self.max_cap = self.max_cap.max(self.cap);
        }
        self.storage[..data.len()].copy_from_slice(data);
        self.storage[data.len()] = SENTINEL;
        self.start_of_line = 0;
        self.end_of_line = 0;
        self.end = data.len();
    }
}

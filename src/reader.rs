use crate::ReadLine;
use crate::buffer::{FillOutcome, LineBuffer};
use crate::constants::{CARRIAGE_RETURN, DEFAULT_MAX_SIZE, IO_SIZE, TERMINATOR};
use crate::error::{Error, Result};
use crate::source::{Source, ensure_streamable};
use std::fs::File;
use std::io::{self, Read};
use std::ops::Range;
use tracing::{debug, warn};

/// Reads logical lines from a stream or from seeded fragments within a fixed memory ceiling.
///
/// A stream reader starts with one chunk of buffer and doubles it whenever a line does not fit,
/// up to its maximum capacity. A line that still does not fit is delivered in pieces, each
/// flagged as [`truncated`](ReadLine::truncated).
///
/// A fragment reader holds all of its content up front and never reads or grows.
#[derive(Debug)]
pub struct LineReader<R = io::Empty> {
    buffer: LineBuffer,
    source: Source<R>,
    truncated: bool,
    last_error: Option<Error>,
    last_line_length: usize,
}

impl<R: Read> LineReader<R> {
    /// Creates a `LineReader` with default configuration.
    ///
    /// The buffer starts at [`IO_SIZE`] and can grow up to [`DEFAULT_MAX_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the initial buffer cannot be allocated.
    pub fn new(reader: R) -> Result<LineReader<R>> {
        LineReader::builder(reader).build()
    }

    /// Returns a [`LineReaderBuilder`] for configuring a new `LineReader`.
    pub fn builder(reader: R) -> LineReaderBuilder<R> {
        LineReaderBuilder {
            reader,
            chunk_size: None,
            max_capacity: None,
        }
    }
}

impl LineReader<File> {
    /// Creates a `LineReader` over `file` that may grow up to [`DEFAULT_MAX_SIZE`].
    ///
    /// # Errors
    ///
    /// See [`open_with`](Self::open_with).
    pub fn open(file: File) -> Result<Self> {
        Self::open_with(file, DEFAULT_MAX_SIZE)
    }

    /// Creates a `LineReader` over `file` that may grow up to `max_capacity` bytes.
    ///
    /// Directories and block devices are refused where the platform can tell them apart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSource`] for a directory or block device,
    /// [`Error::Metadata`] if the file cannot be inspected, and [`Error::Alloc`] if the initial
    /// buffer cannot be allocated.
    pub fn open_with(file: File, max_capacity: usize) -> Result<Self> {
        LineReader::builder(file)
            .max_capacity(max_capacity)
            .build_checked()
    }
}

impl LineReader {
    /// Creates a `LineReader` whose only content is `text`, delivered as one line.
    ///
    /// More fragments can be appended with [`seed_fragment`](Self::seed_fragment).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the buffer cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use batch_readline::{LineReader, ReadLine};
    ///
    /// let mut reader = LineReader::from_fragment("SELECT 1").unwrap();
    /// reader.seed_fragment("SELECT 2").unwrap();
    ///
    /// assert_eq!(reader.read_line(false), Some(&b"SELECT 1 SELECT 2"[..]));
    /// assert_eq!(reader.read_line(false), None);
    /// ```
    pub fn from_fragment(text: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_fragment(text)
    }
}

impl<R> LineReader<R> {
    /// Like [`LineReader::from_fragment`], for any stream type `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the buffer cannot be allocated.
    pub fn with_fragment(text: impl AsRef<[u8]>) -> Result<Self> {
        Ok(Self {
            buffer: LineBuffer::from_fragment(text.as_ref())?,
            source: Source::Materialized,
            truncated: false,
            last_error: None,
            last_line_length: 0,
        })
    }

    /// Appends `text` to everything buffered so far, joined by a single space, and rewinds to the
    /// first buffered byte.
    ///
    /// Lines already returned are returned again, followed by the joined last line.
    ///
    /// The reader stops reading from its stream, if it had one, and never grows again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the buffer cannot be extended. The reader is unchanged in
    /// that case.
    pub fn seed_fragment(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        self.buffer.seed(text.as_ref())?;
        self.source = Source::Materialized;
        self.truncated = false;
        self.last_error = None;
        Ok(())
    }

    /// Returns the current buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.cap()
    }

    /// Returns the capacity the buffer may grow to, in bytes.
    pub fn max_capacity(&self) -> usize {
        self.buffer.max_cap()
    }

    /// Returns a reference to the underlying buffer.
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }
}

impl<R: Read> LineReader<R> {
    /// Returns the next line, reporting failures instead of recording them.
    ///
    /// Behaves like [`ReadLine::read_line`] otherwise. Errors returned here are not stored in
    /// [`last_error`](ReadLine::last_error).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the buffer could not grow and [`Error::Io`] if the stream
    /// failed.
    pub fn try_read_line(&mut self, binary_mode: bool) -> Result<Option<&[u8]>> {
        let line = self.read_span(binary_mode)?;
        Ok(line.map(|line| self.buffer.slice(line.start, line.end)))
    }

    /// Returns an iterator over the remaining lines as owned byte vectors.
    ///
    /// The iterator stops after the first error, which it yields.
    pub fn lines(&mut self, binary_mode: bool) -> Lines<'_, R> {
        Lines {
            reader: self,
            binary_mode,
            done: false,
        }
    }

    /// Delivers the next line and strips it, returning its range in the buffer.
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "Lengths never exceed the span they are taken from"
    )]
    fn read_span(&mut self, binary_mode: bool) -> Result<Option<Range<usize>>> {
        let Some(raw) = self.next_raw_line()? else {
            return Ok(None);
        };

        let mut len = raw.len();
        let line = self.buffer.slice(raw.start, raw.end);
        if line.last() == Some(&TERMINATOR) {
            // Remove '\n'
            len -= 1;
            if !binary_mode && len > 0 && line.get(len - 1) == Some(&CARRIAGE_RETURN) {
                // Remove '\r'
                len -= 1;
            }
        }

        self.last_line_length = len;
        self.buffer.terminate_at(raw.start + len);
        Ok(Some(raw.start..raw.start + len))
    }

    /// Finds the next line, terminator included, refilling the buffer as needed.
    ///
    /// Returns `None` once the source is exhausted and every line has been delivered. A line the
    /// buffer cannot hold is cut at the end of what is buffered and flagged as truncated.
    #[expect(clippy::arithmetic_side_effects, reason = "Safe by buffer invariant")]
    fn next_raw_line(&mut self) -> Result<Option<Range<usize>>> {
        self.buffer.begin_line();

        // Bytes past the start of the line known to hold no terminator
        let mut scanned = 0;

        loop {
            let start = self.buffer.start_of_line();
            if let Some(pos) = self.buffer.find_terminator(start + scanned) {
                self.truncated = false;
                self.buffer.finish_line(pos + 1);
                return Ok(Some(start..pos + 1));
            }
            scanned = self.buffer.end() - start;

            match self.buffer.fill(&mut self.source)? {
                FillOutcome::Filled(_) => {}
                FillOutcome::Eof => {
                    // The remainder always ends with a terminator at this point, so anything left
                    // is only delivered as a last resort
                    let start = self.buffer.start_of_line();
                    let end = self.buffer.end();
                    if start == end {
                        return Ok(None);
                    }
                    self.truncated = false;
                    self.buffer.finish_line(end);
                    return Ok(Some(start..end));
                }
                FillOutcome::Capped => {
                    // Break the line at what we have
                    let start = self.buffer.start_of_line();
                    let end = self.buffer.end();
                    debug!(
                        length = end - start,
                        capacity = self.buffer.cap(),
                        "truncated line at buffer ceiling"
                    );
                    self.truncated = true;
                    self.buffer.finish_line(end);
                    return Ok(Some(start..end));
                }
            }
        }
    }
}

impl<R: Read> ReadLine for LineReader<R> {
    fn read_line(&mut self, binary_mode: bool) -> Option<&[u8]> {
        match self.read_span(binary_mode) {
            Ok(Some(line)) => Some(self.buffer.slice(line.start, line.end)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read line");
                self.last_error = Some(e);
                None
            }
        }
    }

    fn truncated(&self) -> bool {
        self.truncated
    }

    fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    fn last_line_length(&self) -> usize {
        self.last_line_length
    }

    fn is_at_end_of_source(&self) -> bool {
        self.buffer.at_end_of_source()
    }
}

/// A builder for constructing a [`LineReader`] with custom capacity settings.
///
/// A zero chunk size is raised to 1. If `max_capacity` is less than the chunk size, it is raised
/// to match.
#[must_use]
#[derive(Debug)]
pub struct LineReaderBuilder<R> {
    reader: R,
    chunk_size: Option<usize>,
    max_capacity: Option<usize>,
}

impl<R: Read> LineReaderBuilder<R> {
    /// Sets the read chunk, which is also the initial capacity. Defaults to [`IO_SIZE`].
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Sets the maximum buffer capacity. Defaults to [`DEFAULT_MAX_SIZE`].
    pub fn max_capacity(mut self, cap: usize) -> Self {
        self.max_capacity = Some(cap);
        self
    }

    /// Builds the [`LineReader`] with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the initial buffer cannot be allocated.
    pub fn build(self) -> Result<LineReader<R>> {
        let buffer = LineBuffer::with_capacity(
            self.chunk_size.unwrap_or(IO_SIZE),
            self.max_capacity.unwrap_or(DEFAULT_MAX_SIZE),
        )?;

        Ok(LineReader {
            buffer,
            source: Source::Stream(self.reader),
            truncated: false,
            last_error: None,
            last_line_length: 0,
        })
    }
}

impl LineReaderBuilder<File> {
    /// Builds the [`LineReader`] after checking that the file can be streamed from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSource`] for a directory or block device,
    /// [`Error::Metadata`] if the file cannot be inspected, and [`Error::Alloc`] if the initial
    /// buffer cannot be allocated.
    pub fn build_checked(self) -> Result<LineReader<File>> {
        ensure_streamable(&self.reader)?;
        self.build()
    }
}

/// Iterator over owned lines, created by [`LineReader::lines`].
#[derive(Debug)]
pub struct Lines<'a, R> {
    reader: &'a mut LineReader<R>,
    binary_mode: bool,
    done: bool,
}

impl<R: Read> Iterator for Lines<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.try_read_line(self.binary_mode) {
            Ok(Some(line)) => Some(Ok(line.to_vec())),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests;

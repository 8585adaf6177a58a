//! A bounded-memory line reader for feeding batch input to a statement splitter.
//!
//! [`LineReader`] delivers one logical line at a time from a file, a pipe, or command fragments
//! seeded in memory. Its buffer starts small and doubles only while a line does not fit, up to a
//! hard ceiling. A line longer than the ceiling is handed out in pieces flagged as truncated
//! rather than failing the read.
//!
//! # Quick start
//!
//! ```
//! use batch_readline::{LineReader, ReadLine};
//! use std::io::Cursor;
//!
//! let data = b"SELECT 1;\r\nSELECT 2;";
//! let mut reader = LineReader::new(Cursor::new(data.as_slice())).unwrap();
//!
//! // Newlines and the carriage returns before them are stripped
//! assert_eq!(reader.read_line(false), Some(&b"SELECT 1;"[..]));
//!
//! // The last line counts as terminated even without a newline
//! assert_eq!(reader.read_line(false), Some(&b"SELECT 2;"[..]));
//! assert_eq!(reader.read_line(false), None);
//! assert!(reader.last_error().is_none());
//! ```
//!
//! # Memory ceiling
//!
//! ```
//! use batch_readline::{LineReader, ReadLine};
//! use std::io::Cursor;
//!
//! let mut reader = LineReader::builder(Cursor::new(b"0123456789\n".to_vec()))
//!     .chunk_size(4)      // read 4 bytes at a time, starting with 4 bytes of buffer
//!     .max_capacity(8)    // never hold more than 8 bytes
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(reader.read_line(false), Some(&b"01234567"[..]));
//! assert!(reader.truncated());
//! assert_eq!(reader.read_line(false), Some(&b"89"[..]));
//! assert!(!reader.truncated());
//! ```
//!
//! # Crate organisation
//!
//! - [`LineReader`]: the primary type, reading lines from any [`Read`](std::io::Read) or from
//!   seeded fragments.
//! - [`LineReaderBuilder`]: configures chunk size and maximum capacity.
//! - [`ReadLine`]: the line consumer's view of a reader.
//! - [`batch`]: handle-style functions for clients that work with optional readers.
//! - [`buffer::LineBuffer`]: the growable storage and refill logic behind a reader.
//! - [`source`]: the backing stream and the check that refuses directories and block devices.
//! - [`constants`]: chunk and ceiling defaults and the bytes the reader treats specially.

pub mod batch;
pub mod buffer;
pub mod config;
pub mod constants;
mod error;
pub mod logger;
mod read;
mod reader;
pub mod source;

pub use error::{Error, Result};
pub use read::ReadLine;
pub use reader::{LineReader, LineReaderBuilder, Lines};

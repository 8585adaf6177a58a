//! Tests for the Reader
//!
//! These tests are in the same narrative order as the main file, and are designed to not depend on
//! things that we've yet to have written tests for, at least narratively.

#![expect(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Okay in tests"
)]

use super::*;
use pretty_assertions::assert_eq;
use std::io::Cursor;

/// A reader that fails after handing out its data once.
struct FailAfter {
    data: Option<Vec<u8>>,
}

impl Read for FailAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.take() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
        }
    }
}

fn reader(data: &[u8]) -> LineReader<Cursor<Vec<u8>>> {
    LineReader::new(Cursor::new(data.to_vec())).unwrap()
}

fn small_reader(data: &[u8], chunk: usize, max: usize) -> LineReader<Cursor<Vec<u8>>> {
    LineReader::builder(Cursor::new(data.to_vec()))
        .chunk_size(chunk)
        .max_capacity(max)
        .build()
        .unwrap()
}

/// Reads every remaining line into owned vectors.
fn collect<R: Read>(reader: &mut LineReader<R>, binary_mode: bool) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(line) = reader.read_line(binary_mode) {
        lines.push(line.to_vec());
    }
    lines
}

// -----------------------------------------------------------------------------
// LineReader - Creation
// -----------------------------------------------------------------------------

#[test]
fn test_reader_new() {
    let reader = reader(b"");

    // Check internal state matches expectations
    assert_eq!(reader.capacity(), IO_SIZE);
    assert_eq!(reader.max_capacity(), DEFAULT_MAX_SIZE);
    assert!(reader.source.is_stream());
    assert!(!reader.truncated());
    assert!(reader.last_error().is_none());
    assert_eq!(reader.last_line_length(), 0);
    assert!(!reader.is_at_end_of_source());
}

#[test]
fn test_reader_builder() {
    let reader = small_reader(b"", 16, 100);

    assert_eq!(reader.capacity(), 16);
    assert_eq!(reader.max_capacity(), 100);
    assert_eq!(reader.buffer().chunk(), 16);

    // The ceiling is raised to the first chunk
    let reader = small_reader(b"", 16, 4);
    assert_eq!(reader.max_capacity(), 16);
}

#[test]
fn test_reader_from_fragment() {
    let reader = LineReader::from_fragment("SELECT 1").unwrap();

    assert!(!reader.source.is_stream());
    assert!(reader.is_at_end_of_source());
    assert_eq!(reader.capacity(), reader.max_capacity());
}

// -----------------------------------------------------------------------------
// impl ReadLine - Line splitting
// -----------------------------------------------------------------------------

#[test]
fn test_reader_read_line() {
    let mut reader = reader(b"one\ntwo\n\nfour\n");

    assert_eq!(reader.read_line(false), Some(&b"one"[..]));
    assert_eq!(reader.last_line_length(), 3);
    assert_eq!(reader.read_line(false), Some(&b"two"[..]));

    // Empty lines are lines too
    assert_eq!(reader.read_line(false), Some(&b""[..]));
    assert_eq!(reader.last_line_length(), 0);

    assert_eq!(reader.read_line(false), Some(&b"four"[..]));
    assert_eq!(reader.read_line(false), None);
    assert!(reader.is_at_end_of_source());
    assert!(reader.last_error().is_none());
}

#[test]
fn test_reader_unterminated_last_line() {
    // Same lines with and without the final newline
    let mut terminated = reader(b"abc\n");
    let mut unterminated = reader(b"abc");

    assert_eq!(collect(&mut terminated, false), vec![b"abc".to_vec()]);
    assert_eq!(collect(&mut unterminated, false), vec![b"abc".to_vec()]);
}

#[test]
fn test_reader_empty_source() {
    let mut reader = reader(b"");

    assert_eq!(reader.read_line(false), None);
    assert!(reader.is_at_end_of_source());
    assert!(reader.last_error().is_none());
}

#[test]
fn test_reader_end_is_stable() {
    let mut reader = reader(b"only\n");

    assert_eq!(reader.read_line(false), Some(&b"only"[..]));

    // Every call after the end keeps returning None
    for _ in 0..3 {
        assert_eq!(reader.read_line(false), None);
        assert!(reader.last_error().is_none());
    }
}

#[test]
fn test_reader_line_is_sentinel_terminated() {
    let mut reader = reader(b"abc\r\ndef\n");

    let line = reader.read_line(false).unwrap();
    assert_eq!(line, b"abc");

    // The byte right after the returned line is a zero byte
    let start = reader.buffer().start_of_line();
    assert_eq!(reader.buffer().content()[start + 3], 0);

    // The next line is untouched
    assert_eq!(reader.read_line(false), Some(&b"def"[..]));
}

// -----------------------------------------------------------------------------
// impl ReadLine - Carriage returns
// -----------------------------------------------------------------------------

#[test]
fn test_reader_strips_carriage_return() {
    let mut reader = reader(b"abc\r\n");

    assert_eq!(reader.read_line(false), Some(&b"abc"[..]));
    assert_eq!(reader.last_line_length(), 3);
}

#[test]
fn test_reader_binary_mode_keeps_carriage_return() {
    let mut reader = reader(b"abc\r\n");

    assert_eq!(reader.read_line(true), Some(&b"abc\r"[..]));
    assert_eq!(reader.last_line_length(), 4);
}

#[test]
fn test_reader_strips_only_one_carriage_return() {
    let mut reader = reader(b"abc\r\r\n\r\n\rx\n");

    assert_eq!(reader.read_line(false), Some(&b"abc\r"[..]));

    // A bare CRLF is an empty line
    assert_eq!(reader.read_line(false), Some(&b""[..]));

    // A carriage return that does not precede the newline stays
    assert_eq!(reader.read_line(false), Some(&b"\rx"[..]));
}

#[test]
fn test_reader_unterminated_carriage_return() {
    // The synthesized newline makes this behave like "abc\r\n"
    let mut reader = reader(b"abc\r");

    assert_eq!(reader.read_line(false), Some(&b"abc"[..]));
}

// -----------------------------------------------------------------------------
// impl ReadLine - Growth and truncation
// -----------------------------------------------------------------------------

#[test]
fn test_reader_grows_for_long_lines() {
    let line = vec![b'x'; 100];
    let mut data = line.clone();
    data.push(b'\n');
    let mut reader = small_reader(&data, 8, 1024);

    assert_eq!(reader.read_line(false), Some(&line[..]));
    assert!(!reader.truncated());

    // 8 -> 16 -> 32 -> 64 -> 128 is the first capacity with a whole chunk free after 100 bytes
    assert_eq!(reader.capacity(), 128);
}

#[test]
fn test_reader_truncates_at_ceiling() {
    let mut reader = small_reader(b"abcdefghijkl\nmn\n", 4, 8);

    // The line is cut at what fits
    assert_eq!(reader.read_line(false), Some(&b"abcdefgh"[..]));
    assert!(reader.truncated());
    assert_eq!(reader.last_line_length(), 8);
    assert!(reader.last_error().is_none());
    assert!(!reader.is_at_end_of_source());

    // The rest of the line follows
    assert_eq!(reader.read_line(false), Some(&b"ijkl"[..]));
    assert!(!reader.truncated());

    assert_eq!(reader.read_line(false), Some(&b"mn"[..]));
    assert_eq!(reader.read_line(false), None);

    // Never grew past the ceiling
    assert_eq!(reader.capacity(), 8);
}

#[test]
fn test_reader_truncation_keeps_every_byte() {
    let data: Vec<u8> = (0..50).map(|i| b'a' + i % 26).collect();
    let mut reader = small_reader(&data, 4, 16);

    // Pieces glued back together give the whole line back
    let pieces = collect(&mut reader, false);
    assert!(pieces.len() > 1);
    assert_eq!(pieces.concat(), data);
}

// -----------------------------------------------------------------------------
// impl ReadLine - Errors
// -----------------------------------------------------------------------------

#[test]
fn test_reader_records_io_error() {
    let mut reader = LineReader::new(FailAfter {
        data: Some(b"one\ntw".to_vec()),
    })
    .unwrap();

    assert_eq!(reader.read_line(false), Some(&b"one"[..]));

    // The stream fails while looking for the end of "tw"
    assert_eq!(reader.read_line(false), None);
    let err = reader.last_error().unwrap();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.io_kind(), Some(io::ErrorKind::BrokenPipe));

    // A failure is not the end of the source
    assert!(!reader.is_at_end_of_source());
}

#[test]
fn test_reader_try_read_line_reports_error() {
    let mut reader = LineReader::new(FailAfter { data: None }).unwrap();

    let err = reader.try_read_line(false).unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    // Reported, not recorded
    assert!(reader.last_error().is_none());
}

#[test]
fn test_reader_try_read_line() {
    let mut reader = reader(b"a\r\nb");

    assert_eq!(reader.try_read_line(true).unwrap(), Some(&b"a\r"[..]));
    assert_eq!(reader.try_read_line(true).unwrap(), Some(&b"b"[..]));
    assert_eq!(reader.try_read_line(true).unwrap(), None);
}

// -----------------------------------------------------------------------------
// Fragments
// -----------------------------------------------------------------------------

#[test]
fn test_reader_fragments_join() {
    let mut reader = LineReader::from_fragment("SELECT 1").unwrap();
    reader.seed_fragment("SELECT 2").unwrap();

    assert_eq!(reader.read_line(false), Some(&b"SELECT 1 SELECT 2"[..]));
    assert_eq!(reader.read_line(false), None);
    assert!(reader.last_error().is_none());
}

#[test]
fn test_reader_fragment_with_newlines() {
    let mut reader = LineReader::from_fragment("SELECT 1;\nSELECT 2;").unwrap();

    // Embedded newlines still split lines
    assert_eq!(
        collect(&mut reader, false),
        vec![b"SELECT 1;".to_vec(), b"SELECT 2;".to_vec()]
    );
}

#[test]
fn test_reader_seed_after_reading() {
    let mut reader = LineReader::from_fragment("SELECT 1").unwrap();
    assert_eq!(reader.read_line(false), Some(&b"SELECT 1"[..]));
    assert_eq!(reader.read_line(false), None);

    // Seeding again delivers the joined text from the start
    reader.seed_fragment("SELECT 2").unwrap();
    assert_eq!(reader.read_line(false), Some(&b"SELECT 1 SELECT 2"[..]));
    assert_eq!(reader.read_line(false), None);
    assert!(reader.last_error().is_none());
}

#[test]
fn test_reader_seed_stream_reader() {
    let mut reader = reader(b"first\nsecond\nthird\n");
    assert_eq!(reader.read_line(false), Some(&b"first"[..]));

    // Everything buffered is delivered again; the stream itself is let go
    reader.seed_fragment("extra").unwrap();
    assert!(!reader.source.is_stream());
    assert_eq!(
        collect(&mut reader, false),
        vec![
            b"first".to_vec(),
            b"second".to_vec(),
            b"third extra".to_vec()
        ]
    );
}

#[test]
fn test_reader_fragment_never_grows() {
    let mut reader = LineReader::from_fragment("x".repeat(100)).unwrap();
    let capacity = reader.capacity();

    assert_eq!(reader.read_line(false).map(<[u8]>::len), Some(100));
    assert_eq!(reader.read_line(false), None);
    assert_eq!(reader.capacity(), capacity);
    assert!(!reader.truncated());
}

// -----------------------------------------------------------------------------
// Lines
// -----------------------------------------------------------------------------

#[test]
fn test_reader_lines() {
    let mut reader = reader(b"a\r\nb\r\n");

    let lines: Vec<Vec<u8>> = reader.lines(false).collect::<Result<_>>().unwrap();
    assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec()]);

    // Drained
    assert_eq!(reader.lines(false).count(), 0);
}

#[test]
fn test_reader_lines_stops_after_error() {
    let mut reader = LineReader::new(FailAfter {
        data: Some(b"ok\n".to_vec()),
    })
    .unwrap();

    let mut lines = reader.lines(false);
    assert_eq!(lines.next().unwrap().unwrap(), b"ok".to_vec());
    assert!(lines.next().unwrap().is_err());
    assert!(lines.next().is_none());
}

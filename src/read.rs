use crate::error::Error;

/// A source of logical lines for a statement splitter or similar consumer.
///
/// Each call to [`read_line`](ReadLine::read_line) lends out the next line with its terminator
/// removed. The line borrows the reader, so it is only valid until the next call. Reaching the
/// end of the input and failing both show up as `None`; [`last_error`](ReadLine::last_error)
/// tells them apart.
///
/// A line may be cut short when it does not fit the reader's memory ceiling. That is reported
/// through [`truncated`](ReadLine::truncated) and the rest of the line follows on the next call.
pub trait ReadLine {
    /// Returns the next line, or `None` at the end of the input or on failure.
    ///
    /// One trailing newline is removed. Unless `binary_mode` is set, a carriage return right
    /// before it is removed as well.
    fn read_line(&mut self, binary_mode: bool) -> Option<&[u8]>;

    /// Returns `true` if the last line returned was cut short by the memory ceiling.
    fn truncated(&self) -> bool;

    /// Returns the most recent failure, if any.
    fn last_error(&self) -> Option<&Error>;

    /// Returns the length of the last line returned, after stripping.
    fn last_line_length(&self) -> usize;

    /// Returns `true` once the underlying input has been drained.
    fn is_at_end_of_source(&self) -> bool;
}

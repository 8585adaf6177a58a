//! Buffer size constants and the bytes the reader treats specially.
//!
//! All stream reads are requested in whole multiples of a chunk, and a stream reader starts with
//! exactly one chunk of capacity. The capacity then doubles while the configured ceiling allows.
//!
//! # Size Hierarchy
//!
//! - [`IO_SIZE`]: The default chunk, read granularity and initial capacity (4 KiB)
//! - [`DEFAULT_MAX_SIZE`]: The default growth ceiling for stream readers (1 GiB)
//!
//! # Invariant
//!
//! - `IO_SIZE` is a power of 2 and a multiple of 1 KiB (1024 bytes)
//! - `DEFAULT_MAX_SIZE > IO_SIZE` and is a power of 2 multiple of `IO_SIZE`
//!
//! Together these guarantee that a reader built with the defaults reaches its ceiling exactly
//! through doubling, never stopping one step short of it.

/// Read chunk (4 KiB) used as the initial capacity and the unit of every read request.
pub const IO_SIZE: usize =
    // 2^12 = 4096 = 4 KiB
    1 << 12;

/// Default ceiling (1 GiB) a stream reader's buffer may grow to.
///
/// A single logical line longer than this is delivered in truncated pieces.
pub const DEFAULT_MAX_SIZE: usize =
    // 2^18 = 262144
    // 4 KiB * 256 Ki = 1 GiB
    IO_SIZE * (1 << 18);

/// Byte that ends a logical line.
pub const TERMINATOR: u8 = b'\n';

/// Byte stripped before a [`TERMINATOR`] unless binary mode is requested.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Byte placed between successive seeded fragments.
pub const FRAGMENT_SEPARATOR: u8 = b' ';

/// Byte kept just past the valid content of the buffer.
pub const SENTINEL: u8 = 0;

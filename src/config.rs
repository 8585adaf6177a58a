//! Command line and environment configuration of the `batch-readline` binary.

use crate::constants::{DEFAULT_MAX_SIZE, IO_SIZE};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_LOG_LEVEL: &str = "off";

/// Feeds logical lines from a file, stdin or command fragments to stdout.
#[derive(Debug, Parser)]
#[command(name = "batch-readline", version, about)]
pub struct Config {
    /// File to read lines from; stdin when absent
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Command fragment to read instead of FILE; repeated fragments are joined by spaces
    #[arg(short = 'e', long = "execute", value_name = "TEXT")]
    pub execute: Vec<String>,

    /// Keep carriage returns before newlines
    #[arg(long, default_value_t = false, env = "BATCH_BINARY")]
    pub binary: bool,

    /// Largest buffer, in bytes, a single line may occupy before it is truncated
    #[arg(long = "max-buffer", default_value_t = DEFAULT_MAX_SIZE, env = "BATCH_MAX_BUFFER")]
    pub max_buffer: usize,

    /// Read chunk and initial buffer size, in bytes
    #[arg(long = "chunk-size", default_value_t = IO_SIZE, env = "BATCH_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Fail instead of warning when a line is truncated
    #[arg(long = "abort-on-truncation", default_value_t = false)]
    pub abort_on_truncation: bool,

    #[arg(
        long = "log-level",
        default_value_t = String::from(DEFAULT_LOG_LEVEL),
        env = "LOG_LEVEL"
    )]
    pub log_level: String,

    #[arg(long = "log-file", env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// loads config from cli arguments
    #[must_use]
    pub fn from_cli<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::parse_from(args)
    }

    /// Returns `true` if lines come from `--execute` fragments rather than a stream.
    pub fn reads_fragments(&self) -> bool {
        !self.execute.is_empty()
    }
}

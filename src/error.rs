//! Error types shared by every tool.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading, filtering or writing records.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid or inconsistent command line arguments.
    #[error("{0}")]
    Argument(String),

    /// A filter expression failed to parse or evaluate.
    #[error("Filter expression error: {0}")]
    Expression(String),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an argument error.
    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }

    /// True for errors caused by the command line rather than the data.
    pub fn is_argument(&self) -> bool {
        matches!(self, Error::Argument(_))
    }

    /// True when the downstream consumer of standard output went away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

use std::io;

use thiserror::Error;

/// Result type alias for trajectory reading operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended in the middle of a record.
    #[error("unexpected end of stream while reading {0}")]
    UnexpectedEof(&'static str),

    /// The frame header magic is not one of the known xtc magic numbers.
    #[error("found invalid magic number '{0}' ({0:#x}), 1995 and 2023 are supported")]
    BadMagic(i32),

    /// The compressed coordinate block contradicts itself.
    #[error("corrupt compressed stream: {0}")]
    CorruptStream(&'static str),

    /// A line of a gro file did not match the fixed-column layout.
    #[error("malformed gro input at line {line}: {reason}")]
    ParseGro { line: usize, reason: String },

    /// Underlying file-system read failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Classify an error from a fixed-width read: running off the end of the
    /// stream mid-record is [`Error::UnexpectedEof`], anything else is i/o.
    pub(crate) fn from_read(err: io::Error, what: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof(what),
            _ => Self::Io(err),
        }
    }
}

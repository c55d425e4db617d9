//! Closed error taxonomy shared by every layer of the crate.

use std::fmt;
use thiserror::Error;

/// The kind of failure, independent of the message attached to it.
///
/// This is a closed set: callers can match on it exhaustively instead of
/// parsing error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller-supplied parameter violated a precondition.
    InvalidArgument,
    /// A query matched nothing when a result was required, or an
    /// attribute/text was absent when required.
    NotFound,
    /// A silo header/record violates the format, or source XML is malformed.
    InvalidData,
    /// Version mismatch, or an XPath construct outside the accepted grammar.
    Unsupported,
    /// Filesystem failure on load/save.
    Io,
    /// An invariant violation caught at runtime. Should never surface from a
    /// correctly built release.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidData => "invalid data",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Io => "io",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A byte or character offset into the input that triggered an error,
/// carried along so callers can point at the offending location.
pub type Position = usize;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind}: {message}")]
    Simple { kind: ErrorKind, message: String },

    #[error("{kind} at position {position}: {message}")]
    Positioned {
        kind: ErrorKind,
        message: String,
        position: Position,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error::Simple {
            kind,
            message: message.into(),
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Error::Positioned {
            kind,
            message: message.into(),
            position,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, message)
    }

    pub fn invalid_data_at(message: impl Into<String>, position: Position) -> Self {
        Self::at(ErrorKind::InvalidData, message, position)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn unsupported_at(message: impl Into<String>, position: Position) -> Self {
        Self::at(ErrorKind::Unsupported, message, position)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The kind of this error, useful for callers that want to branch
    /// without matching the whole enum.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Simple { kind, .. } => *kind,
            Error::Positioned { kind, .. } => *kind,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::fmt;

/// Error categories surfaced across the backend seam.
///
/// The harness never unwinds through a backend; every fallible backend
/// operation returns one of these wrapped in a [`BenchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    Fail,
    InvalidArg,
    NotFound,
    Io,
}

/// Structured error carried between backends and the harness.
#[derive(Debug, Clone)]
pub struct BenchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BenchError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unsupported,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Fail,
            message: message.into(),
        }
    }

    pub fn invalid_arg(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArg,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: message.into(),
        }
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Fail => "fail",
            ErrorKind::InvalidArg => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::Io => "io error",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

impl std::error::Error for BenchError {}

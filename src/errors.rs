use crate::importer::ScalarKind;
use crate::json::JsonError;
use std::fmt;

/// An error that can occur when decoding or encoding a chart
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps the error into its specific type
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the byte offset that the error occurs (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }

    /// Returns the dotted field path (eg: `c.a[3].N`) where decoding failed
    /// (if available)
    pub fn path(&self) -> Option<&str> {
        match *self.0 {
            ErrorKind::Structural { ref path, .. } => Some(path),
            ErrorKind::ValueKind { ref path, .. } => Some(path),
            ErrorKind::InvalidValue { ref path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// The input is not well formed JSON
    Syntax(JsonError),

    /// A token arrived that the active frame can't interpret: an unknown key,
    /// a container where a different shape was expected, too much nesting, or
    /// unbalanced input
    Structural {
        frame: &'static str,
        token: String,
        path: String,
        offset: usize,
    },

    /// A scalar of one kind arrived for a field bound to another kind
    ValueKind {
        path: String,
        expected: ScalarKind,
        found: &'static str,
        offset: usize,
    },

    /// A scalar of the right kind with unacceptable content
    InvalidValue {
        path: String,
        message: String,
        offset: usize,
    },

    /// The envelope version is missing or not recognized
    VersionMismatch { found: Option<String> },

    /// The input does not start with a JSON object
    UnrecognizedFormat,

    /// A decoded chart violates a model invariant
    Inconsistent(String),

    /// An error occurred reading or writing data
    Io(std::io::Error),
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::Syntax(ref err) => Some(err.offset()),
            ErrorKind::Structural { offset, .. } => Some(offset),
            ErrorKind::ValueKind { offset, .. } => Some(offset),
            ErrorKind::InvalidValue { offset, .. } => Some(offset),
            _ => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Syntax(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Syntax(ref err) => write!(f, "json syntax error: {}", err),
            ErrorKind::Structural {
                frame,
                ref token,
                ref path,
                offset,
            } => write!(
                f,
                "unexpected {} for {} at `{}` (offset: {})",
                token, frame, path, offset
            ),
            ErrorKind::ValueKind {
                ref path,
                expected,
                found,
                offset,
            } => write!(
                f,
                "expected {} value at `{}` but found {} (offset: {})",
                expected, path, found, offset
            ),
            ErrorKind::InvalidValue {
                ref path,
                ref message,
                offset,
            } => write!(
                f,
                "invalid value at `{}`: {} (offset: {})",
                path, message, offset
            ),
            ErrorKind::VersionMismatch { found: Some(ref x) } => {
                write!(f, "unrecognized ace version: {}", x)
            }
            ErrorKind::VersionMismatch { found: None } => {
                write!(f, "ace version is missing or follows the chart")
            }
            ErrorKind::UnrecognizedFormat => {
                write!(f, "unrecognized format: input does not start with a json object")
            }
            ErrorKind::Inconsistent(ref msg) => write!(f, "inconsistent chart: {}", msg),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<JsonError> for Error {
    fn from(error: JsonError) -> Self {
        Error::new(ErrorKind::Syntax(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

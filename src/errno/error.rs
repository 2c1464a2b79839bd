// Host filesystem errors

use super::Errno;
use std::io;
use thiserror::Error;

/// Errors returned by a host filesystem.
///
/// The shapes are closed: an entry was not found, the host reported an errno,
/// an operation wrapped an inner error with its path, or an opaque message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("file does not exist: {0}")]
    NotFound(String),

    #[error("{}", .0.description())]
    Errno(Errno),

    #[error("{op} {path}: {source}")]
    Path {
        op: &'static str,
        path: String,
        #[source]
        source: Box<HostError>,
    },

    #[error("{0}")]
    Other(String),
}

pub type HostResult<T> = Result<T, HostError>;

impl HostError {
    /// Wrap `source` with the operation and path that produced it.
    pub fn path(op: &'static str, path: impl Into<String>, source: impl Into<HostError>) -> Self {
        HostError::Path { op, path: path.into(), source: Box::new(source.into()) }
    }

    /// Whether the error means "no such file", at any wrapping depth.
    pub fn is_not_found(&self) -> bool {
        match self {
            HostError::NotFound(_) | HostError::Errno(Errno::ENOENT) => true,
            HostError::Path { source, .. } => source.is_not_found(),
            HostError::Errno(_) | HostError::Other(_) => false,
        }
    }

    /// The wrapped error one level down, or `self` when nothing is wrapped.
    pub fn unwrap_once(&self) -> &HostError {
        match self {
            HostError::Path { source, .. } => source,
            other => other,
        }
    }

    /// The errno carried directly by this error, without unwrapping.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            HostError::Errno(errno) => Some(*errno),
            _ => None,
        }
    }
}

impl From<Errno> for HostError {
    fn from(errno: Errno) -> Self {
        HostError::Errno(errno)
    }
}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        if let Some(errno) = err.raw_os_error().and_then(Errno::from_raw_os_error) {
            return HostError::Errno(errno);
        }
        match err.kind() {
            io::ErrorKind::NotFound => HostError::NotFound(err.to_string()),
            _ => HostError::Other(err.to_string()),
        }
    }
}

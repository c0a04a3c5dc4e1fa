//! Error types for the download module.
//!
//! Every failure a multipart download can end with maps onto one variant here.
//! The variants mirror the classic errno-style taxonomy callers already expect
//! from socket code (invalid argument, not found, bad descriptor, timeout),
//! plus the transport error itself, carried through untouched.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can end a multipart download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request is not `multipart/form-data`, the settings are unusable,
    /// or a resolved output path could not be opened for writing.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was rejected.
        reason: String,
    },

    /// An expected token never showed up: the boundary parameter, a boundary
    /// line, a header terminator, or a `filename` field.
    #[error("not found: {what}")]
    NotFound {
        /// The missing token.
        what: &'static str,
    },

    /// The filesystem refused to answer while resolving an output path.
    #[error("bad descriptor resolving {path}: {source}")]
    BadDescriptor {
        /// The path being examined.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No bytes arrived within the configured operations timeout (async mode).
    #[error("read timed out after {after:?}")]
    Timeout {
        /// The timeout that expired.
        after: Duration,
    },

    /// The input stream failed.
    #[error("transport error: {source}")]
    Transport {
        /// The error reported by the stream.
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing an open part file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The part file being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    /// Creates a bad descriptor error.
    pub fn bad_descriptor(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BadDescriptor {
            path: path.into(),
            source,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(source: std::io::Error) -> Self {
        Self::Transport { source }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for inactivity timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// No `From<std::io::Error>`: the same io::Error means different things
// depending on whether it came from the stream, path resolution, or a write.

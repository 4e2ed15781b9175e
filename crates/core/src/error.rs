//! Unified error types for nai-site.
//!
//! Display strings carry a stable code prefix so log lines can be grepped
//! without parsing.

use std::path::PathBuf;

use tokio_rusqlite::rusqlite;

/// Unified error types shared by the injector, the fetch policy and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A single content entry could not be turned into a document.
    #[error("INVALID_ENTRY: {slug}: {reason}")]
    InvalidEntry { slug: String, reason: String },

    /// The content list could not be read or is not a JSON array.
    #[error("CONTENT_LOAD: {0}")]
    ContentLoad(String),

    /// Filesystem operation failed.
    #[error("IO_ERROR: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The base document could not be rewritten.
    #[error("HTML_REWRITE: {0}")]
    HtmlRewrite(String),

    /// Transport-level network failure (no response was received).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A lifecycle event arrived in a state that does not accept it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),
}

impl Error {
    /// Wrap an IO error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidEntry { slug: "b".to_string(), reason: "missing field `title`".to_string() };
        assert!(err.to_string().starts_with("INVALID_ENTRY"));
        assert!(err.to_string().contains("b: missing field"));
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = Error::io("dist/index.html", std::io::Error::from(std::io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.starts_with("IO_ERROR"));
        assert!(msg.contains("dist/index.html"));
    }

    #[test]
    fn test_rusqlite_error_maps_to_database() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }
}

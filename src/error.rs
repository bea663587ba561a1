//! Error types for GridFile
//!
//! Every failure that can reach the user is a [`GridError`]. Errors raised
//! on behalf of a filesystem adaptor render as `<adaptor> adaptor: <reason>`
//! so users can tell which endpoint failed; the underlying cause is kept as
//! the error source and only shown when verbose diagnostics are requested.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GridFile operations
#[derive(Error, Debug)]
pub enum GridError {
    /// The requested copy mode cannot be performed (e.g. recursive stream)
    #[error("{adaptor} adaptor: {message}")]
    InvalidCombination { adaptor: String, message: String },

    /// The target already exists and the conflict policy forbids overwriting
    #[error("{adaptor} adaptor: Destination path already exists: {path}")]
    TargetExists { adaptor: String, path: String },

    /// The source path is missing
    #[error("{adaptor} adaptor: Source path does not exist: {path}")]
    SourceNotFound { adaptor: String, path: String },

    /// A directory was required but something else was found
    #[error("{adaptor} adaptor: Expected a directory: {path}")]
    DirectoryExpected { adaptor: String, path: String },

    /// A regular file was required but a directory was found
    #[error("{adaptor} adaptor: Expected a file but found a directory: {path}")]
    FileExpected { adaptor: String, path: String },

    /// Source and target name the same object
    #[error("{adaptor} adaptor: Source and destination are the same file: {path}")]
    SameSourceAndTarget { adaptor: String, path: String },

    /// I/O failure from the underlying filesystem
    #[error("{adaptor} adaptor: {context}")]
    TransferFailed {
        adaptor: String,
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Listing a path failed
    #[error("{adaptor} adaptor: Failed to list directory: {path}")]
    ListFailed {
        adaptor: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not reach the remote location
    #[error("{adaptor} adaptor: Failed to connect to '{location}': {message}")]
    Connection {
        adaptor: String,
        location: String,
        message: String,
    },

    /// Remote authentication was rejected
    #[error("{adaptor} adaptor: Authentication failed for '{user}@{location}': {message}")]
    Authentication {
        adaptor: String,
        user: String,
        location: String,
        message: String,
    },

    /// The adaptor needs a location and none was given
    #[error("{adaptor} adaptor: A location is required, use --location or an '{adaptor}:<location>:<path>' endpoint")]
    LocationRequired { adaptor: String },

    /// Operation not available on this adaptor
    #[error("{adaptor} adaptor: Unsupported operation: {operation}")]
    UnsupportedOperation { adaptor: String, operation: String },

    /// Unknown adaptor property key
    #[error("{adaptor} adaptor: Unknown property '{key}' (allowed: {allowed})")]
    InvalidProperty {
        adaptor: String,
        key: String,
        allowed: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error outside of any adaptor (standard streams, local setup)
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GridError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid combination error
    pub fn invalid_combination(adaptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCombination {
            adaptor: adaptor.into(),
            message: message.into(),
        }
    }

    /// Create a target exists error
    pub fn target_exists(adaptor: impl Into<String>, path: impl Into<String>) -> Self {
        Self::TargetExists {
            adaptor: adaptor.into(),
            path: path.into(),
        }
    }

    /// Create a source not found error
    pub fn source_not_found(adaptor: impl Into<String>, path: impl Into<String>) -> Self {
        Self::SourceNotFound {
            adaptor: adaptor.into(),
            path: path.into(),
        }
    }

    /// Wrap an I/O failure with the adaptor that produced it
    pub fn transfer(
        adaptor: impl Into<String>,
        context: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::TransferFailed {
            adaptor: adaptor.into(),
            context: context.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(
        adaptor: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Connection {
            adaptor: adaptor.into(),
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(
        adaptor: impl Into<String>,
        user: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Authentication {
            adaptor: adaptor.into(),
            user: user.into(),
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(adaptor: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            adaptor: adaptor.into(),
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for GridFile operations
pub type Result<T> = std::result::Result<T, GridError>;

/// Extension trait for attaching adaptor context to std::io::Result
pub trait IoResultExt<T> {
    /// Wrap an I/O error as a transfer failure of `adaptor`
    fn with_adaptor(self, adaptor: &str, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_adaptor(self, adaptor: &str, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| GridError::transfer(adaptor, context(), e))
    }
}

/// Render an error for the error stream.
///
/// The default is a single line. With `stacktrace` the full causal chain is
/// appended, one `Caused by:` section per source.
pub fn format_diagnostic(err: GridError, stacktrace: bool) -> String {
    let err = anyhow::Error::new(err);
    if stacktrace {
        format!("{:?}", err)
    } else {
        format!("{}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptor_prefix() {
        let err = GridError::target_exists("file", "/tmp/target.txt");
        assert_eq!(
            err.to_string(),
            "file adaptor: Destination path already exists: /tmp/target.txt"
        );
    }

    #[test]
    fn test_same_source_and_target() {
        let err = GridError::SameSourceAndTarget {
            adaptor: "file".to_string(),
            path: "/tmp/data.txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "file adaptor: Source and destination are the same file: /tmp/data.txt"
        );
    }

    #[test]
    fn test_diagnostic_single_line() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = GridError::ListFailed {
            adaptor: "file".to_string(),
            path: "/missing".to_string(),
            source: io_err,
        };
        let line = format_diagnostic(err, false);
        assert_eq!(line, "file adaptor: Failed to list directory: /missing");
        assert!(!line.contains("Caused by:"));
    }

    #[test]
    fn test_diagnostic_with_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = GridError::ListFailed {
            adaptor: "file".to_string(),
            path: "/missing".to_string(),
            source: io_err,
        };
        let text = format_diagnostic(err, true);
        assert!(text.starts_with("file adaptor: Failed to list directory"));
        assert!(text.contains("Caused by:"));
        assert!(text.contains("no such file"));
    }
}

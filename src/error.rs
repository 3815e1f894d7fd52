//! Centralized error types for the upload engine
//!
//! All engine errors are represented by the `UploadError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, UploadError>`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Coarse classification used by the orchestrator and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Pre-flight problem, nothing was sent
    Configuration,
    /// Connection, timeout or negative acknowledgement
    Transport,
    /// Reply present but malformed
    Protocol,
    /// User abort of a long transfer
    Cancelled,
}

/// All upload errors
#[derive(Debug)]
pub enum UploadError {
    // === Configuration ===
    /// Layout or controller state the hardware cannot accept
    Configuration { message: String },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
    /// Config or layout file could not be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Layout file could not be parsed
    LayoutParse { path: PathBuf, reason: String },
    /// Remote file name does not fit the close frame
    FileNameTooLong { name: String, max: usize },

    // === Transport ===
    /// TCP connect failed
    Connect {
        address: String,
        source: std::io::Error,
    },
    /// Read or write on an open connection failed
    Io {
        operation: &'static str,
        source: std::io::Error,
    },
    /// No complete reply inside the wait window
    Timeout {
        operation: &'static str,
        waited: Duration,
    },
    /// Reply arrived but is not a positive acknowledgement
    Rejected { operation: String, reply: String },
    /// Web server answered with a non-success status
    HttpStatus { path: String, status: u16 },

    // === Protocol ===
    /// Reply could not be interpreted
    Protocol { message: String },
    /// JSON reply lacks a required member
    MissingMember {
        member: &'static str,
        payload: String,
    },
    /// Positional row has the wrong number of fields
    FieldCount {
        expected: usize,
        found: usize,
        row: String,
    },
    /// Positional row belongs to another port
    PortMismatch { expected: u32, row: String },

    // === Cancellation ===
    /// Transfer aborted by the progress callback
    Cancelled,
}

impl UploadError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. }
            | Self::ConfigValidation { .. }
            | Self::ConfigRead { .. }
            | Self::LayoutParse { .. }
            | Self::FileNameTooLong { .. } => ErrorKind::Configuration,
            Self::Connect { .. }
            | Self::Io { .. }
            | Self::Timeout { .. }
            | Self::Rejected { .. }
            | Self::HttpStatus { .. } => ErrorKind::Transport,
            Self::Protocol { .. }
            | Self::MissingMember { .. }
            | Self::FieldCount { .. }
            | Self::PortMismatch { .. } => ErrorKind::Protocol,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigRead { source, .. }
            | Self::Connect { source, .. }
            | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "{}", message),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ConfigRead { path, .. } => write!(f, "Cannot read {}", path.display()),
            Self::LayoutParse { path, reason } => {
                write!(f, "Invalid layout {}: {}", path.display(), reason)
            }
            Self::FileNameTooLong { name, max } => {
                write!(f, "Remote file name '{}' is longer than {} bytes", name, max)
            }
            Self::Connect { address, source } => {
                write!(f, "Could not connect to {}: {}", address, source)
            }
            Self::Io { operation, source } => write!(f, "{} failed: {}", operation, source),
            Self::Timeout { operation, waited } => {
                write!(f, "{} timed out after {:?}", operation, waited)
            }
            Self::Rejected { operation, reply } => {
                write!(f, "{} rejected by controller: '{}'", operation, reply)
            }
            Self::HttpStatus { path, status } => {
                write!(f, "Request to {} returned HTTP {}", path, status)
            }
            Self::Protocol { message } => write!(f, "Protocol error: {}", message),
            Self::MissingMember { member, payload } => {
                write!(f, "Reply is missing '{}': {}", member, payload)
            }
            Self::FieldCount {
                expected,
                found,
                row,
            } => write!(
                f,
                "Invalid config data '{}' ({} fields, expected {})",
                row, found, expected
            ),
            Self::PortMismatch { expected, row } => {
                write!(f, "Mismatched output ports data port:'{}' data:'{}'", expected, row)
            }
            Self::Cancelled => write!(f, "Transfer cancelled"),
        }
    }
}

/// Alias for Result with UploadError
pub type Result<T> = std::result::Result<T, UploadError>;

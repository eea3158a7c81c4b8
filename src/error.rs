//! Error types for the jaw kinematics library.
//!
//! Per-frame processing never fails; these errors only surface at the
//! configuration, recording and report boundaries.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Landmark recording could not be decoded
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the recording
        line: usize,
        /// Decoder message
        message: String,
    },

    /// Report generation failed
    #[error("Report error: {0}")]
    ReportError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

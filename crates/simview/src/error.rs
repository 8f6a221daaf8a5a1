//! Error types for the simview client.
//!
//! Connection failures never reach consumers: the connection manager logs
//! them and reconnects. These errors surface only from configuration
//! loading and from the manager's internal per-connection loop.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

// ============================================================================
// Client Error Type
// ============================================================================

/// Client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// I/O error passthrough.
    ///
    /// Socket reads and writes, connection refused, connection reset.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The line stream could not be read.
    ///
    /// Raised for a line longer than the configured maximum or for bytes
    /// that are not valid UTF-8. The connection is dropped and
    /// re-established.
    #[error("Line stream error: {0}")]
    Codec(#[from] LinesCodecError),

    /// The server closed the connection.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from_conversion() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let client_error: ClientError = io_error.into();
        assert!(matches!(client_error, ClientError::Io(_)));
        assert!(client_error.to_string().contains("IO error"));
    }

    #[test]
    fn test_codec_error_from_conversion() {
        let client_error: ClientError = LinesCodecError::MaxLineLengthExceeded.into();
        assert!(matches!(client_error, ClientError::Codec(_)));
        assert!(client_error.to_string().contains("Line stream error"));
    }

    #[test]
    fn test_connection_closed_display() {
        assert_eq!(
            ClientError::ConnectionClosed.to_string(),
            "Connection closed by server"
        );
    }

    #[test]
    fn test_config_read_error_display() {
        let error = ClientError::ConfigRead {
            path: PathBuf::from("/etc/simview.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let display = error.to_string();
        assert!(display.contains("/etc/simview.toml"));
        assert!(display.contains("no such file"));
    }

    #[test]
    fn test_invalid_config_error_display() {
        let error = ClientError::InvalidConfig("port must be non-zero".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: port must be non-zero"
        );
    }
}

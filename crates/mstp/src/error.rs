//! Error types for the spanning tree engine.
//!
//! Protocol anomalies never stop the engine: a malformed BPDU is counted and
//! reported back to the caller of the receive entry point, and everything
//! else recovers through the state machines' own timers.

use std::io;
use thiserror::Error;

use crate::PortIndex;

/// Result type alias for engine operations.
pub type MstpResult<T> = Result<T, MstpError>;

#[derive(Debug, Error)]
pub enum MstpError {
    /// A received frame or BPDU failed validation and was dropped.
    #[error("Malformed BPDU: {reason}")]
    MalformedBpdu {
        /// What the decoder rejected.
        reason: String,
    },

    /// A configuration call was rejected; the bridge is unchanged.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfiguration {
        /// The parameter that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A transmit buffer was too short for the encoded BPDU.
    #[error("Transmit buffer too small: BPDU needs {needed} bytes, buffer has {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// The host had no transmit buffer for the port.
    #[error("Port {port} is unreachable: no transmit buffer")]
    UnreachablePort { port: PortIndex },

    /// Reading or writing a configuration file failed.
    #[error("Configuration file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A configuration file could not be parsed.
    #[error("Configuration file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A configuration could not be serialized.
    #[error("Configuration serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl MstpError {
    /// Creates a malformed BPDU error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedBpdu {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors the engine recovers from on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::MalformedBpdu { .. } | Self::UnreachablePort { .. })
    }
}

impl From<mstp_types::ParseError> for MstpError {
    fn from(err: mstp_types::ParseError) -> Self {
        Self::invalid_config("identifier", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        let err = MstpError::invalid_config("hello_time", "must be 1-2");
        assert_eq!(err.to_string(), "Invalid configuration for hello_time: must be 1-2");

        let err = MstpError::malformed("truncated");
        assert_eq!(err.to_string(), "Malformed BPDU: truncated");

        let err = MstpError::BufferTooSmall { needed: 36, available: 10 };
        assert_eq!(err.to_string(), "Transmit buffer too small: BPDU needs 36 bytes, buffer has 10");
    }

    #[test]
    fn test_is_transient() {
        assert!(MstpError::malformed("x").is_transient());
        assert!(MstpError::UnreachablePort { port: 1 }.is_transient());
        assert!(!MstpError::invalid_config("x", "y").is_transient());
        assert!(!MstpError::BufferTooSmall { needed: 36, available: 10 }.is_transient());
    }

    #[test]
    fn test_from_parse_error() {
        let err: MstpError = mstp_types::ParseError::InvalidVlanId(0).into();
        assert!(matches!(err, MstpError::InvalidConfiguration { .. }));
    }
}

//! Error types for httpsql.
//!
//! Defines the error enum shared by the transport, the decoder and the
//! query coordinator.

use thiserror::Error;

/// Main error type for httpsql operations.
///
/// Errors are `Clone` because a single failed round trip is reported to every
/// caller that joined it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpSqlError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("Transport error (HTTP {status}): {body}")]
    Transport {
        /// Numeric HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// A cell could not be converted to its declared type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid client options or configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (lost background task, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpSqlError {
    /// Creates a transport error from a status code and response body.
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    /// Creates a network error with the given message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the HTTP status carried by a transport error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for failures of the HTTP round trip itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Network(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "Transport Error",
            Self::Network(_) => "Network Error",
            Self::Decode(_) => "Decode Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using HttpSqlError.
pub type Result<T> = std::result::Result<T, HttpSqlError>;

//! Error types for the ZIPBUM client.

use thiserror::Error;

use crate::transport::TransportError;
use crate::view::RenderError;

/// A shared error type for the entire ZIPBUM client.
///
/// Transport failures and render-invariant violations convert into it
/// automatically, so controllers can use `?` across layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZipbumError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login rejected or session cookie missing
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The backend refused to open a new conversation (HTTP 429).
    #[error("Rate limited: the backend refused to open a new conversation")]
    RateLimited,

    /// Network, HTTP or decode failure of a single backend call
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Message view invariant violation
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZipbumError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is the distinguished rate-limit refusal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Check if this wraps a transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ZipbumError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ZipbumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ZipbumError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ZipbumError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ZipbumError>`.
pub type Result<T> = std::result::Result<T, ZipbumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_convert_transparently() {
        let err: ZipbumError = TransportError::Http {
            status: 500,
            body: "boom".to_string(),
        }
        .into();

        assert!(err.is_transport());
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ZipbumError::from(parse);
        assert!(matches!(err, ZipbumError::Serialization { ref format, .. } if format == "JSON"));
    }
}

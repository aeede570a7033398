//! Error types for the service registry.
//!
//! Every fallible registry operation returns [`Result<T>`]. The variants are
//! split by who is allowed to raise them:
//!
//! - [`Error::InvalidIdentity`] and [`Error::InvalidLocation`] are produced at
//!   the request boundary, before the store is touched.
//! - [`Error::NotFound`] is the routine answer to a query for an identity that
//!   has no current registration. Callers are expected to match on it.
//! - [`Error::Transport`], [`Error::Configuration`] and [`Error::Io`] belong to
//!   the server/client plumbing. The store and the registry service never
//!   return them.
//!
//! ```
//! use registry_common::{Error, ServiceIdentity};
//!
//! let err = ServiceIdentity::new("model", "").unwrap_err();
//! assert!(matches!(err, Error::InvalidIdentity { field: "version", .. }));
//! ```

use thiserror::Error;

use crate::types::ServiceIdentity;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A name or version failed validation.
    #[error("Invalid identity: {field} {reason}")]
    InvalidIdentity {
        field: &'static str,
        reason: String,
    },

    /// The advertised host/port cannot describe a reachable endpoint.
    #[error("Invalid location: {reason}")]
    InvalidLocation {
        reason: String,
    },

    /// No service is currently registered under the identity.
    #[error("Service not found: {identity}")]
    NotFound {
        identity: ServiceIdentity,
    },

    /// Connection, handshake or credential failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration file or command-line value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an InvalidIdentity error.
    pub fn invalid_identity(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an InvalidLocation error.
    pub fn invalid_location(reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            reason: reason.into(),
        }
    }

    /// Creates a NotFound error.
    pub fn not_found(identity: ServiceIdentity) -> Self {
        Self::NotFound { identity }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true for the routine "nothing registered" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true when the caller sent a malformed request.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity { .. } | Self::InvalidLocation { .. }
        )
    }
}

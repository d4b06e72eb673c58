//! Error types for tenant pool operations.

use std::sync::Arc;

use thiserror::Error;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur while acquiring a tenant connection.
///
/// A failed connection attempt is observed by every caller that was waiting
/// on it, so the error is `Clone`; underlying causes are wrapped in `Arc`.
#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// No credential is configured for the tenant. No connection attempt
    /// is made in this case.
    #[error("no credential configured for tenant {key}")]
    MissingCredential {
        /// The tenant key, rendered for display.
        key: String,
    },

    /// The underlying connection attempt was rejected.
    #[error("failed to connect to tenant {key}: {source}")]
    ConnectFailed {
        /// The tenant key, rendered for display.
        key: String,
        /// The underlying cause.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Internal pool error.
    #[error("internal pool error: {0}")]
    Internal(String),
}

impl PoolError {
    /// Create a missing-credential error.
    pub fn missing_credential(key: impl std::fmt::Display) -> Self {
        Self::MissingCredential {
            key: key.to_string(),
        }
    }

    /// Create a connect-failed error wrapping the underlying cause.
    pub fn connect_failed(
        key: impl std::fmt::Display,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConnectFailed {
            key: key.to_string(),
            source: Arc::from(source.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a missing-credential error.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoolError::missing_credential(5);
        assert_eq!(err.to_string(), "no credential configured for tenant 5");
        assert!(err.is_missing_credential());

        let err = PoolError::connect_failed(7, "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to connect to tenant 7: connection refused"
        );
    }

    #[test]
    fn test_error_clone_shares_source() {
        let err = PoolError::connect_failed("acme", "tls handshake failed");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}

//! Error types for store queries.

use storedash_pool::PoolError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while querying a store's database.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Acquiring the store's connection failed.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// Query execution failed. The store's pooled connection is left
    /// untouched: a failed query does not imply a broken connection.
    #[error("query failed: {0}")]
    Query(#[source] tokio_postgres::Error),

    /// A result row did not have the expected shape.
    #[error("row decode error: {0}")]
    Decode(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a query error wrapping the underlying cause.
    pub fn query(source: tokio_postgres::Error) -> Self {
        Self::Query(source)
    }

    /// Create a row decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error came from the pool (as opposed to query
    /// execution on a live handle).
    pub fn is_pool_error(&self) -> bool {
        matches!(self, Self::Pool(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_conversion() {
        let err: StoreError = PoolError::missing_credential(9).into();
        assert!(err.is_pool_error());
        assert_eq!(
            err.to_string(),
            "pool error: no credential configured for tenant 9"
        );
    }

    #[test]
    fn test_decode_error_display() {
        let err = StoreError::decode("column total_revenue: type mismatch");
        assert_eq!(
            err.to_string(),
            "row decode error: column total_revenue: type mismatch"
        );
    }
}

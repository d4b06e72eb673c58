//! Connection factory for store databases.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use storedash_pool::{ConnectionFactory, CredentialResolver, PoolError, PoolResult};

use crate::config::PgConfig;
use crate::types::StoreId;

/// A live connection to one store's database.
///
/// The handle is owned by the pool and lent out per call; dropping the last
/// reference closes the connection.
#[derive(Debug)]
pub struct StoreHandle {
    client: Client,
}

impl StoreHandle {
    /// The underlying tokio-postgres client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Opens store databases: resolves the store's credential, derives the
/// database name from the store id, connects once. No internal retries.
pub struct PgStoreFactory {
    config: PgConfig,
    credentials: Arc<dyn CredentialResolver>,
}

impl PgStoreFactory {
    /// Create a factory from a base config and a credential resolver.
    pub fn new(config: PgConfig, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// The base configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }
}

#[async_trait]
impl ConnectionFactory for PgStoreFactory {
    type Key = StoreId;
    type Handle = StoreHandle;

    async fn connect(&self, key: &StoreId) -> PoolResult<StoreHandle> {
        // No credential, no network call.
        let secret = self
            .credentials
            .resolve(&key.to_string())
            .ok_or_else(|| PoolError::missing_credential(key))?;

        debug!(store = %key, database = %self.config.database_for(*key), "connecting");

        let (client, connection) = self
            .config
            .to_pg_config(*key, &secret)
            .connect(NoTls)
            .await
            .map_err(|e| PoolError::connect_failed(key, e))?;

        // The connection object drives the socket; it resolves once the
        // client is dropped.
        let store = *key;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(store = %store, error = %e, "connection task ended with error");
            }
        });

        Ok(StoreHandle { client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storedash_pool::StaticCredentials;

    #[tokio::test]
    async fn missing_credential_fails_without_connecting() {
        let config = PgConfig::builder().host("localhost").build().unwrap();
        let factory = PgStoreFactory::new(config, Arc::new(StaticCredentials::new()));

        let err = factory.connect(&StoreId::new(42)).await.unwrap_err();
        assert!(err.is_missing_credential());
    }

    // Successful connects are covered by integration against a real
    // PostgreSQL cluster; unit tests stop at credential resolution.
}

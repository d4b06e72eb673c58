//! Query execution against pooled store handles.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::debug;

use storedash_pool::{ConnectionFactory, CredentialResolver, PoolConfig, TenantPool};

use crate::config::PgConfig;
use crate::error::{StoreError, StoreResult};
use crate::factory::{PgStoreFactory, StoreHandle};
use crate::types::StoreId;

/// Runs queries against a store's database.
///
/// Implemented by [`StoreExecutor`]; the trait exists so higher layers can
/// be tested without a database.
#[async_trait]
pub trait StoreQuerier: Send + Sync {
    /// Execute a query against a store, binding `params` positionally, and
    /// return the rows in database order.
    async fn query(
        &self,
        store: StoreId,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Vec<Row>>;
}

/// A pooled handle that can run a single query.
///
/// Implemented by [`StoreHandle`]; the executor is generic over it so query
/// semantics (in particular, that a failed query leaves the handle pooled)
/// can be exercised without a database.
#[async_trait]
pub trait QueryHandle: Send + Sync + 'static {
    /// Run one query, binding `params` positionally.
    async fn run(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>>;
}

#[async_trait]
impl QueryHandle for StoreHandle {
    async fn run(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        if params.is_empty() {
            self.client().query(sql, &[]).await
        } else {
            match self.client().prepare(sql).await {
                Ok(stmt) => self.client().query(&stmt, params).await,
                Err(e) => Err(e),
            }
        }
        .map_err(StoreError::query)
    }
}

/// The query executor: acquires a store's handle from the pool and runs
/// queries on it. Handle lifecycle stays with the pool — the executor never
/// closes a connection, and a failed query does not evict one.
pub struct StoreExecutor<F: ConnectionFactory = PgStoreFactory> {
    pool: TenantPool<F>,
}

impl StoreExecutor {
    /// Create an executor with its own tenant pool over store databases.
    pub fn new(
        config: PgConfig,
        credentials: Arc<dyn CredentialResolver>,
        pool_config: PoolConfig,
    ) -> Self {
        Self::with_pool(TenantPool::new(
            PgStoreFactory::new(config, credentials),
            pool_config,
        ))
    }
}

impl<F: ConnectionFactory> StoreExecutor<F> {
    /// Create an executor over a prebuilt pool.
    pub fn with_pool(pool: TenantPool<F>) -> Self {
        Self { pool }
    }

    /// The underlying tenant pool.
    pub fn pool(&self) -> &TenantPool<F> {
        &self.pool
    }
}

#[async_trait]
impl<F> StoreQuerier for StoreExecutor<F>
where
    F: ConnectionFactory<Key = StoreId>,
    F::Handle: QueryHandle,
{
    async fn query(
        &self,
        store: StoreId,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Vec<Row>> {
        let handle = self.pool.acquire(&store).await?;
        debug!(store = %store, sql = %sql.split_whitespace().collect::<Vec<_>>().join(" "), "executing query");

        let rows = handle.run(sql, params).await?;

        debug!(store = %store, rows = rows.len(), "query completed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use storedash_pool::PoolResult;

    use super::*;

    struct FlakyHandle {
        /// Number of upcoming queries that should fail.
        failures: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QueryHandle for FlakyHandle {
        async fn run(
            &self,
            _sql: &str,
            _params: &[&(dyn ToSql + Sync)],
        ) -> StoreResult<Vec<Row>> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::decode("relation \"orders\" does not exist"));
            }
            Ok(Vec::new())
        }
    }

    struct FlakyFactory {
        connects: Arc<AtomicUsize>,
        failures: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConnectionFactory for FlakyFactory {
        type Key = StoreId;
        type Handle = FlakyHandle;

        async fn connect(&self, _key: &StoreId) -> PoolResult<FlakyHandle> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(FlakyHandle {
                failures: Arc::clone(&self.failures),
            })
        }
    }

    #[tokio::test]
    async fn failed_query_keeps_handle_pooled() {
        let connects = Arc::new(AtomicUsize::new(0));
        let executor = StoreExecutor::with_pool(TenantPool::new(
            FlakyFactory {
                connects: Arc::clone(&connects),
                failures: Arc::new(AtomicUsize::new(1)),
            },
            PoolConfig::default(),
        ));
        let store = StoreId::new(5);

        let err = executor.query(store, "SELECT 1", &[]).await.unwrap_err();
        assert!(!err.is_pool_error());
        assert!(executor.pool().contains(&store));

        // The next query reuses the pooled connection without reconnecting.
        let rows = executor.query(store, "SELECT 1", &[]).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    // Successful query execution over a real handle is covered by
    // integration against a PostgreSQL cluster.
}

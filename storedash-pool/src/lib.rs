//! # storedash-pool
//!
//! Per-tenant database connection pooling for Storedash.
//!
//! Every store ("tenant") lives in its own isolated database, reachable with a
//! per-store credential. This crate owns the lifecycle of those connections:
//!
//! - **Lazy creation**: a tenant's connection is opened on first use
//! - **Connect deduplication**: concurrent callers for the same uncached
//!   tenant share a single in-flight connection attempt
//! - **Idle eviction**: a connection untouched for the idle window is closed
//!   and removed; the next request reconnects from scratch
//!
//! The pool is generic over the tenant key and the connection handle; the
//! concrete PostgreSQL binding lives in `storedash-postgres`.
//!
//! # Example
//!
//! ```rust,ignore
//! use storedash_pool::{PoolConfig, TenantPool};
//!
//! let pool = TenantPool::new(factory, PoolConfig::default());
//!
//! // First acquire connects; later acquires reuse the handle.
//! let handle = pool.acquire(&store_id).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod pool;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use credentials::{CredentialResolver, EnvCredentials, StaticCredentials};
pub use error::{PoolError, PoolResult};
pub use factory::{ConnectionFactory, TenantKey};
pub use pool::TenantPool;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::PoolConfig;
    pub use crate::credentials::CredentialResolver;
    pub use crate::error::{PoolError, PoolResult};
    pub use crate::factory::ConnectionFactory;
    pub use crate::pool::TenantPool;
}

//! # storedash-postgres
//!
//! PostgreSQL binding for Storedash: every store lives in its own database
//! (`store_{id}`), opened with a per-store credential and pooled by
//! `storedash-pool`.
//!
//! This crate provides:
//! - A [`ConnectionFactory`] implementation that resolves the store's
//!   credential and opens its database
//! - A query executor running positional parameterized queries over
//!   pool-owned handles
//! - The dashboard queries (summary, order/revenue series, locations)
//! - The access directory mapping a user to the stores they may see
//!
//! [`ConnectionFactory`]: storedash_pool::ConnectionFactory
//!
//! # Example
//!
//! ```rust,ignore
//! use storedash_postgres::{PgConfig, StoreExecutor, StoreId};
//! use storedash_pool::{EnvCredentials, PoolConfig};
//! use std::sync::Arc;
//!
//! let executor = StoreExecutor::new(
//!     PgConfig::from_env()?,
//!     Arc::new(EnvCredentials::new("STORE_{key}_TOKEN")),
//!     PoolConfig::default(),
//! );
//!
//! let rows = executor
//!     .query(StoreId::new(5), "SELECT 1", &[])
//!     .await?;
//! ```

pub mod config;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod executor;
pub mod factory;
pub mod types;

pub use config::{PgConfig, PgConfigBuilder};
pub use dashboard::{
    AnalyticsSummary, CustomerLocation, Dashboard, DashboardService, OrdersPoint, RevenuePoint,
};
pub use directory::{AccessDirectory, Directory, StoreAccess};
pub use error::{StoreError, StoreResult};
pub use executor::{QueryHandle, StoreExecutor, StoreQuerier};
pub use factory::{PgStoreFactory, StoreHandle};
pub use types::StoreId;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::PgConfig;
    pub use crate::dashboard::{Dashboard, DashboardService};
    pub use crate::directory::{AccessDirectory, Directory};
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::executor::StoreExecutor;
    pub use crate::types::StoreId;
}

//! Connection factory trait.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;

use crate::error::PoolResult;

/// Bounds required of a tenant key.
///
/// Store ids are integers in practice, but nothing in the pool depends on
/// that; any hashable, displayable key works.
pub trait TenantKey: Eq + Hash + Clone + Display + Debug + Send + Sync + 'static {}

impl<K> TenantKey for K where K: Eq + Hash + Clone + Display + Debug + Send + Sync + 'static {}

/// Opens a new connection to a tenant's database.
///
/// A factory call is a single external attempt: it must not retry
/// internally. Retry policy belongs to the caller; the pool itself only
/// clears the failed entry so the next request starts fresh.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// The tenant key type.
    type Key: TenantKey;
    /// The live connection handle produced on success.
    type Handle: Send + Sync + 'static;

    /// Open a connection to the tenant's database.
    ///
    /// Fails with [`PoolError::MissingCredential`] before any network call
    /// when the tenant has no resolvable secret, or with
    /// [`PoolError::ConnectFailed`] when the open is rejected.
    ///
    /// [`PoolError::MissingCredential`]: crate::error::PoolError::MissingCredential
    /// [`PoolError::ConnectFailed`]: crate::error::PoolError::ConnectFailed
    async fn connect(&self, key: &Self::Key) -> PoolResult<Self::Handle>;
}

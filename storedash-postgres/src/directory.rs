//! The access directory: which stores may a user see.
//!
//! Cross-store user-access mappings live in one designated store's database
//! (the directory store). Lookup failures are downgraded to an empty list:
//! absence of access is not a fatal condition for the dashboard. The failure
//! is still logged at warn level so an unreachable directory does not hide
//! behind "user has no stores".

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dashboard::get;
use crate::error::StoreResult;
use crate::executor::StoreQuerier;
use crate::types::StoreId;

/// A store a user may access, with their access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAccess {
    pub store_id: StoreId,
    pub store_name: String,
    pub store_url: String,
    pub access_level: String,
}

/// Lookup of a user's accessible stores.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The stores the user may access, ordered by store name. Empty on
    /// lookup failure.
    async fn user_stores(&self, email: &str) -> Vec<StoreAccess>;
}

const USER_STORES_SQL: &str = "
    SELECT s.store_id, s.store_name, s.store_url, usa.access_level
    FROM stores s
    JOIN user_store_access usa ON s.store_id = usa.store_id
    JOIN users u ON usa.user_id = u.user_id
    WHERE u.email = $1
    ORDER BY s.store_name
";

/// Directory backed by the designated directory store's database.
pub struct AccessDirectory {
    querier: Arc<dyn StoreQuerier>,
    directory_store: StoreId,
}

impl AccessDirectory {
    /// Create a directory over the given store.
    pub fn new(querier: Arc<dyn StoreQuerier>, directory_store: StoreId) -> Self {
        Self {
            querier,
            directory_store,
        }
    }

    async fn fetch(&self, email: &str) -> StoreResult<Vec<StoreAccess>> {
        let rows = self
            .querier
            .query(self.directory_store, USER_STORES_SQL, &[&email])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(StoreAccess {
                    store_id: StoreId::new(get(row, "store_id")?),
                    store_name: get(row, "store_name")?,
                    store_url: get(row, "store_url")?,
                    access_level: get(row, "access_level")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Directory for AccessDirectory {
    async fn user_stores(&self, email: &str) -> Vec<StoreAccess> {
        match self.fetch(email).await {
            Ok(stores) => stores,
            Err(err) => {
                warn!(error = %err, "access directory lookup failed, returning no stores");
                Vec::new()
            }
        }
    }
}

//! Common types for the store data layer.

use serde::{Deserialize, Serialize};

/// Identifier of a store (tenant). Each store has its own database and
/// credential.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StoreId(i32);

impl StoreId {
    /// Create a store id.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for StoreId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_id_display() {
        assert_eq!(StoreId::new(5).to_string(), "5");
    }

    #[test]
    fn test_store_id_serde_transparent() {
        let id: StoreId = serde_json::from_str("7").unwrap();
        assert_eq!(id, StoreId::new(7));
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}

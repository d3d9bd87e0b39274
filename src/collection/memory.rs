//! In-process blueprint store

use super::error::StoreResult;
use super::types::{BlueprintStore, validate_keys};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// One `mark_found` invocation as received by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkFoundCall {
    pub user_id: String,
    pub blueprint: String,
    pub found: bool,
}

/// Keeps found flags in memory and remembers every call it received.
#[derive(Debug, Default)]
pub struct MemoryStore {
    found: RwLock<HashMap<String, BTreeSet<String>>>,
    calls: RwLock<Vec<MarkFoundCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blueprints currently flagged as found for `user_id`, sorted by name
    pub async fn found_for(&self, user_id: &str) -> Vec<String> {
        self.found
            .read()
            .await
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<MarkFoundCall> {
        self.calls.read().await.clone()
    }
}

impl BlueprintStore for MemoryStore {
    async fn mark_found(&self, user_id: &str, blueprint: &str, found: bool) -> StoreResult<()> {
        self.calls.write().await.push(MarkFoundCall {
            user_id: user_id.to_string(),
            blueprint: blueprint.to_string(),
            found,
        });
        validate_keys(user_id, blueprint)?;

        let mut users = self.found.write().await;
        let set = users.entry(user_id.to_string()).or_default();
        if found {
            set.insert(blueprint.to_string());
        } else {
            set.remove(blueprint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::StoreError;

    #[tokio::test]
    async fn test_mark_and_unmark() {
        let store = MemoryStore::new();

        store.mark_found("user-1", "frag_grenade", true).await.unwrap();
        store.mark_found("user-1", "anvil", true).await.unwrap();
        store.mark_found("user-2", "anvil", true).await.unwrap();
        assert_eq!(store.found_for("user-1").await, vec!["anvil", "frag_grenade"]);

        store.mark_found("user-1", "anvil", false).await.unwrap();
        assert_eq!(store.found_for("user-1").await, vec!["frag_grenade"]);
        assert_eq!(store.found_for("user-2").await, vec!["anvil"]);
        assert_eq!(store.calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_empty_keys() {
        let store = MemoryStore::new();

        let err = store.mark_found(" ", "anvil", true).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyUserId));
        let err = store.mark_found("user-1", "", true).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyBlueprint));
        assert!(store.found_for("user-1").await.is_empty());
    }
}

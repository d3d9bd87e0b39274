//! Blueprint store backed by a JSON document on disk
//!
//! Layout: `{ "<user id>": ["<blueprint>", ...] }` with names kept sorted.

use super::error::{StoreError, StoreResult};
use super::types::{BlueprintStore, validate_keys};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Collection = BTreeMap<String, BTreeSet<String>>;

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; a missing file is an empty collection.
    pub async fn load(&self) -> StoreResult<BTreeMap<String, BTreeSet<String>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Collection::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&self, collection: &Collection) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(collection)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

impl BlueprintStore for JsonFileStore {
    async fn mark_found(&self, user_id: &str, blueprint: &str, found: bool) -> StoreResult<()> {
        validate_keys(user_id, blueprint)?;
        let _guard = self.lock.lock().await;

        let mut collection = self.load().await?;
        let changed = if found {
            collection
                .entry(user_id.to_string())
                .or_default()
                .insert(blueprint.to_string())
        } else {
            collection
                .get_mut(user_id)
                .map(|set| set.remove(blueprint))
                .unwrap_or(false)
        };

        if changed {
            self.save(&collection).await?;
            log::debug!(
                "💾 {} '{}' for user '{}' in {:?}",
                if found { "Marked" } else { "Unmarked" },
                blueprint,
                user_id,
                self.path
            );
        }
        Ok(())
    }
}

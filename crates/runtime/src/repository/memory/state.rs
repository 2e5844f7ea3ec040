//! In-memory StateRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use cadence_core::EntityId;
use serde_json::Value;

use crate::repository::{RepositoryError, Result, StateRepository};

/// In-memory implementation of StateRepository.
pub struct InMemoryStateRepo {
    blobs: RwLock<HashMap<(EntityId, String), Value>>,
}

impl InMemoryStateRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStateRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRepository for InMemoryStateRepo {
    fn save(&self, owner: EntityId, key: &str, value: &Value) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        blobs.insert((owner, key.to_string()), value.clone());
        Ok(())
    }

    fn load(&self, owner: EntityId, key: &str) -> Result<Option<Value>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(blobs.get(&(owner, key.to_string())).cloned())
    }

    fn exists(&self, owner: EntityId, key: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(&(owner, key.to_string())))
            .unwrap_or(false)
    }

    fn delete(&self, owner: EntityId, key: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        blobs.remove(&(owner, key.to_string()));
        Ok(())
    }

    fn list_owners(&self) -> Result<Vec<EntityId>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut owners: Vec<EntityId> = blobs.keys().map(|(owner, _)| *owner).collect();
        owners.sort_unstable();
        owners.dedup();
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn save_load_delete() {
        let repo = InMemoryStateRepo::new();
        let owner = EntityId(4);
        assert_eq!(repo.load(owner, "effects").unwrap(), None);

        repo.save(owner, "effects", &json!([1, 2])).unwrap();
        repo.save(EntityId(2), "action_queue", &json!([])).unwrap();
        assert!(repo.exists(owner, "effects"));
        assert_eq!(repo.load(owner, "effects").unwrap(), Some(json!([1, 2])));
        assert_eq!(repo.list_owners().unwrap(), vec![EntityId(2), owner]);

        repo.delete(owner, "effects").unwrap();
        repo.delete(owner, "effects").unwrap();
        assert!(!repo.exists(owner, "effects"));
        assert_eq!(repo.len(), 1);
    }
}

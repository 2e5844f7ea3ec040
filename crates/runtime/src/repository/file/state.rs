//! File-based StateRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use cadence_core::EntityId;
use serde_json::Value;

use crate::repository::{RepositoryError, Result, StateRepository};

/// File-based implementation of StateRepository.
///
/// # File Format
///
/// Each blob is stored as pretty-printed JSON at `{base}/{owner}/{key}.json`.
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written blob.
pub struct FileStateRepository {
    base_dir: PathBuf,
}

impl FileStateRepository {
    /// Create a new file-based state repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn owner_dir(&self, owner: EntityId) -> PathBuf {
        self.base_dir.join(owner.0.to_string())
    }

    fn blob_path(&self, owner: EntityId, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(RepositoryError::CorruptedData(format!(
                "invalid blob key `{key}`"
            )));
        }
        Ok(self.owner_dir(owner).join(format!("{key}.json")))
    }
}

impl StateRepository for FileStateRepository {
    fn save(&self, owner: EntityId, key: &str, value: &Value) -> Result<()> {
        let path = self.blob_path(owner, key)?;
        let temp_path = path.with_extension("json.tmp");
        fs::create_dir_all(self.owner_dir(owner))?;

        let bytes = serde_json::to_vec_pretty(value)?;

        // Write to temp file
        fs::write(&temp_path, bytes)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved {}[{}] to {}", key, owner, path.display());

        Ok(())
    }

    fn load(&self, owner: EntityId, key: &str) -> Result<Option<Value>> {
        let path = self.blob_path(owner, key)?;

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let value: Value = serde_json::from_slice(&bytes)?;

        tracing::debug!("Loaded {}[{}] from {}", key, owner, path.display());

        Ok(Some(value))
    }

    fn exists(&self, owner: EntityId, key: &str) -> bool {
        self.blob_path(owner, key)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    fn delete(&self, owner: EntityId, key: &str) -> Result<()> {
        let path = self.blob_path(owner, key)?;

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted {}[{}]", key, owner);
        }

        Ok(())
    }

    fn list_owners(&self) -> Result<Vec<EntityId>> {
        let mut owners = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir()
                && let Some(name) = path.file_name().and_then(|s| s.to_str())
                && let Ok(id) = name.parse::<u32>()
            {
                owners.push(EntityId(id));
            }
        }

        owners.sort_unstable();
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn blobs_survive_a_new_repository() {
        let dir = TempDir::new().unwrap();
        let owner = EntityId(12);
        {
            let repo = FileStateRepository::new(dir.path()).unwrap();
            repo.save(owner, "action_queue", &json!([{"type": "strike"}]))
                .unwrap();
        }

        let repo = FileStateRepository::new(dir.path()).unwrap();
        assert!(repo.exists(owner, "action_queue"));
        assert_eq!(
            repo.load(owner, "action_queue").unwrap(),
            Some(json!([{"type": "strike"}]))
        );
        assert_eq!(repo.list_owners().unwrap(), vec![owner]);
        assert!(!dir.path().join("12/action_queue.json.tmp").exists());

        repo.delete(owner, "action_queue").unwrap();
        assert_eq!(repo.load(owner, "action_queue").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(dir.path()).unwrap();
        assert!(repo.save(EntityId(1), "../escape", &json!(null)).is_err());
        assert!(!repo.exists(EntityId(1), "a/b"));
    }

    #[test]
    fn corrupt_blobs_surface_as_errors() {
        let dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("3")).unwrap();
        fs::write(dir.path().join("3/effects.json"), b"{not json").unwrap();
        assert!(matches!(
            repo.load(EntityId(3), "effects"),
            Err(RepositoryError::Json(_))
        ));
    }
}

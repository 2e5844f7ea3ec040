//! Repository contract for per-entity blob storage.

use cadence_core::EntityId;
use serde_json::Value;

use super::Result;

/// Well-known keys under which the engine stores per-entity state.
pub mod keys {
    pub const ACTION_QUEUE: &str = "action_queue";
    pub const COUNTER_QUEUE: &str = "counter_queue";
    pub const EFFECTS: &str = "effects";
}

/// Per-entity keyed blob storage.
///
/// This is for DYNAMIC data that changes while actors act:
/// - action queues with their suspended current action
/// - counteract queues
/// - effect handlers
///
/// Writes are not transactional; a crash between computing new state and
/// saving it loses that increment.
pub trait StateRepository: Send + Sync {
    /// Save a blob under `(owner, key)`, replacing any previous value.
    fn save(&self, owner: EntityId, key: &str, value: &Value) -> Result<()>;

    /// Load the blob stored under `(owner, key)`.
    fn load(&self, owner: EntityId, key: &str) -> Result<Option<Value>>;

    /// Check if a blob exists
    fn exists(&self, owner: EntityId, key: &str) -> bool;

    /// Delete a blob; missing blobs are not an error.
    fn delete(&self, owner: EntityId, key: &str) -> Result<()>;

    /// Entities that have anything stored.
    fn list_owners(&self) -> Result<Vec<EntityId>> {
        Ok(vec![])
    }
}

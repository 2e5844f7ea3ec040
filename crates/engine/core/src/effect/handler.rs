use serde::{Deserialize, Serialize};
use tracing::warn;

use super::instance::{EffectInstance, EffectKey, EffectRecord};
use crate::error::PersistError;
use crate::ids::EntityId;
use crate::registry::Registry;

/// How to find an effect on a handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectQuery {
    /// First instance of a type, whatever its name.
    Kind(String),
    /// Instance by name, optionally restricted to a type.
    Named { kind: Option<String>, name: String },
    /// The instance with exactly this key.
    Exact(EffectKey),
}

impl EffectQuery {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kind(kind.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            kind: None,
            name: name.into(),
        }
    }

    pub fn kind_named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            kind: Some(kind.into()),
            name: name.into(),
        }
    }

    pub fn matches(&self, key: &EffectKey) -> bool {
        match self {
            Self::Kind(kind) => key.kind == *kind,
            Self::Named { kind, name } => {
                kind.as_ref().is_none_or(|k| key.kind == *k)
                    && key.name.as_deref() == Some(name.as_str())
            }
            Self::Exact(exact) => exact == key,
        }
    }
}

impl From<&EffectKey> for EffectQuery {
    fn from(key: &EffectKey) -> Self {
        Self::Exact(key.clone())
    }
}

/// Per-owner registry of live effects, at most one per [`EffectKey`].
#[derive(Debug)]
pub struct EffectsHandler {
    owner: EntityId,
    effects: Vec<EffectInstance>,
}

impl EffectsHandler {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            effects: Vec::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn position(&self, query: &EffectQuery) -> Option<usize> {
        self.effects.iter().position(|e| query.matches(e.key()))
    }

    pub fn has(&self, query: &EffectQuery) -> bool {
        self.position(query).is_some()
    }

    pub fn get(&self, query: &EffectQuery) -> Option<&EffectInstance> {
        self.effects.iter().find(|e| query.matches(e.key()))
    }

    pub fn get_mut(&mut self, query: &EffectQuery) -> Option<&mut EffectInstance> {
        self.effects.iter_mut().find(|e| query.matches(e.key()))
    }

    /// Total stacks of the matching effect, zero when absent.
    pub fn stacks(&self, query: &EffectQuery) -> u32 {
        self.get(query).map_or(0, EffectInstance::stacks)
    }

    /// Registers a new instance. An instance already holding the same key is
    /// replaced, keeping the one-per-key invariant.
    pub fn insert(&mut self, instance: EffectInstance) -> Option<EffectInstance> {
        let query = EffectQuery::from(instance.key());
        match self.position(&query) {
            Some(index) => Some(std::mem::replace(&mut self.effects[index], instance)),
            None => {
                self.effects.push(instance);
                None
            }
        }
    }

    pub fn take(&mut self, query: &EffectQuery) -> Option<EffectInstance> {
        let index = self.position(query)?;
        Some(self.effects.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.effects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EffectInstance> {
        self.effects.iter_mut()
    }

    /// Keys of every live effect, in registration order.
    pub fn list(&self) -> Vec<EffectKey> {
        self.effects.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Drops every effect without running hooks, returning them so their
    /// timers can be cancelled.
    pub fn drain(&mut self) -> Vec<EffectInstance> {
        std::mem::take(&mut self.effects)
    }

    pub fn to_records(&self) -> Result<Vec<EffectRecord>, PersistError> {
        self.effects.iter().map(EffectInstance::to_record).collect()
    }

    /// Rebuilds a handler, skipping records whose type is unknown or whose
    /// state no longer decodes.
    pub fn from_records(owner: EntityId, records: Vec<EffectRecord>, registry: &Registry) -> Self {
        let mut handler = Self::new(owner);
        for record in records {
            let kind = record.kind.clone();
            match EffectInstance::from_record(record, registry) {
                Ok(instance) => {
                    handler.insert(instance);
                }
                Err(e) => {
                    warn!(target: "cadence::effects", owner = %owner, effect = %kind, error = %e, "skipping unreadable effect");
                }
            }
        }
        handler
    }
}

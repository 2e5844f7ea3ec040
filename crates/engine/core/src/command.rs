//! Deferred cross-entity mutations.
//!
//! Hooks run while their own action or effect is checked out of its slot, so
//! they cannot touch queues or handlers directly. They push [`Command`]s
//! instead, and the runtime applies them in order once the hook's transition
//! has finished.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{Args, Move, Outcome};
use crate::effect::{AddOptions, Effect, EffectQuery, RemoveSpec};
use crate::ids::{ActionId, EntityId};

/// A named trigger for the reaction dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub key: String,
    #[serde(default)]
    pub payload: Value,
}

impl Trigger {
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    /// The `on_<move>` trigger fired when an action ends.
    pub fn on_move(mv: &str, payload: Value) -> Self {
        Self::new(format!("on_{mv}"), payload)
    }
}

/// What to add: an effect looked up by type tag, or a prepared instance.
#[derive(Debug)]
pub enum EffectSpec {
    Tag(String),
    Instance(Box<dyn Effect>),
}

impl EffectSpec {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn instance(effect: impl Effect + 'static) -> Self {
        Self::Instance(Box::new(effect))
    }

    /// Type tag of the effect this spec resolves to.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Tag(tag) => tag,
            Self::Instance(effect) => effect.type_tag(),
        }
    }
}

/// How an enqueued action enters the target queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EnqueueMode {
    /// Append to the backlog.
    Add,
    /// Insert at the head of the backlog.
    Next,
    /// Insert at the head and end the current action.
    Override,
}

/// A mutation requested by a hook.
#[derive(Debug)]
pub enum Command {
    /// Register `attacker`'s current action `action` on `defender`'s counteract queue.
    OpenCounterWindow {
        attacker: EntityId,
        action: ActionId,
        defender: EntityId,
    },
    /// Remove an entry from `defender`'s counteract queue.
    CloseCounterWindow {
        defender: EntityId,
        attacker: EntityId,
        action: ActionId,
    },
    /// Force `actor`'s current action, if it is still `action`, to resolve.
    Resolve {
        actor: EntityId,
        action: ActionId,
        outcome: Outcome,
    },
    Enqueue {
        actor: EntityId,
        mv: Box<dyn Move>,
        args: Args,
        mode: EnqueueMode,
    },
    AddEffect {
        owner: EntityId,
        effect: EffectSpec,
        options: AddOptions,
    },
    RemoveEffect {
        owner: EntityId,
        query: EffectQuery,
        spec: RemoveSpec,
    },
    Trigger { owner: EntityId, trigger: Trigger },
}

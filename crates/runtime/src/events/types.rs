//! Event types for different topics.

use cadence_core::{
    ActionId, CounterRef, EffectKey, EnqueueMode, EntityId, Outcome, Source, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Action queue and lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEvent {
    Queued {
        actor: EntityId,
        action: ActionId,
        name: String,
        mode: EnqueueMode,
    },
    /// Became current; `start` follows after the promotion delay.
    Promoted { actor: EntityId, action: ActionId },
    Started {
        actor: EntityId,
        action: ActionId,
        name: String,
    },
    Suspended {
        actor: EntityId,
        action: ActionId,
        resume_at: Timestamp,
    },
    Ended {
        actor: EntityId,
        action: ActionId,
        name: String,
        outcome: Outcome,
    },
    /// The backlog ran dry.
    Idle { actor: EntityId },
    Cleared { actor: EntityId },
}

/// Effect stacking and ticking events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectEvent {
    Created {
        owner: EntityId,
        effect: EffectKey,
    },
    Added {
        owner: EntityId,
        effect: EffectKey,
        source: Source,
        stacks: u32,
        total: u32,
    },
    /// Incoming stacks were offset against an effect they negate.
    Negated {
        owner: EntityId,
        effect: String,
        negated: EffectKey,
        stacks: u32,
    },
    Removed {
        owner: EntityId,
        effect: EffectKey,
        source: Source,
        stacks: u32,
        total: u32,
    },
    Ticked {
        owner: EntityId,
        effect: EffectKey,
        source: Source,
    },
    Deleted {
        owner: EntityId,
        effect: EffectKey,
    },
}

/// Counteract queue events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterEvent {
    Opened {
        defender: EntityId,
        counter: CounterRef,
    },
    /// `counter` is now the head of the defender's queue.
    Opportunity {
        defender: EntityId,
        counter: CounterRef,
    },
    Closed {
        defender: EntityId,
        counter: CounterRef,
    },
}

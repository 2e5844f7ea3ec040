//! Synchronous action and effect engine shared by the runtime and content crates.
//!
//! `cadence-core` defines the per-actor action state machine, the action and
//! counteract queues, and the stacked, sourced effect model. Nothing in here
//! blocks or performs I/O: time is read from a [`Scheduler`], collaborators are
//! reached through the capability traits in [`capability`], and cross-entity
//! mutations are emitted as [`Command`]s for the runtime to apply.
pub mod action;
pub mod capability;
pub mod command;
pub mod config;
pub mod effect;
pub mod error;
pub mod ids;
pub mod registry;
pub mod schedule;
pub mod text;
pub mod time;

#[cfg(test)]
mod testing;

pub use action::{
    Action, ActionContext, ActionQueue, ActionRecord, ActionSnapshot, ActionState, Args,
    Continuation, CounterRef, CounteractQueue, EndArgs, EndReport, Move, Outcome,
    PartRequirement, Removal, RestorePlan, SkillCheck, Step, Suspension, Transition, Verdict,
    WorldView,
};
pub use capability::{
    Containment, Host, MessageSink, MoveReactions, PartInventory, Progression, SkillChecker, Tag,
};
pub use command::{Command, EffectSpec, EnqueueMode, Trigger};
pub use config::EngineConfig;
pub use effect::{
    AddOptions, AreaEffect, Effect, EffectContext, EffectInstance, EffectKey, EffectQuery,
    EffectRecord, EffectsHandler, Offset, RemoveSpec, Source, SourceFilter, SourceParseError,
    Sources, StackChange, StackCount, TickDecision,
};
pub use error::{ActionError, CadenceError, ErrorSeverity, PersistError, RegistryError, Result};
pub use ids::{ActionId, EntityId, PartId, TimerHandle};
pub use registry::{Persist, Registry, Tagged};
pub use schedule::{Fired, ManualScheduler, Scheduler, Task};
pub use time::Timestamp;

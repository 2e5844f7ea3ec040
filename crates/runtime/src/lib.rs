//! Runtime orchestration for the cadence action and effect engine.
//!
//! This crate wires the synchronous engine from `cadence-core` to tokio:
//! timers become spawned tasks, state is persisted through a
//! [`StateRepository`], and callers reach the engine through an
//! [`EngineHandle`] backed by a single worker task.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`engine`] applies queue, counter and effect operations and routes timers
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`reactions`] holds named trigger subscriptions
//! - [`repository`] persists per-entity state
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod engine;
pub mod events;
pub mod reactions;
pub mod repository;
pub mod runtime;
pub mod scheduler;

mod workers;

pub use api::{EngineHandle, Result, RuntimeError};
pub use engine::Engine;
pub use events::{ActionEvent, CounterEvent, EffectEvent, Event, EventBus, Topic};
pub use reactions::{
    DispatchReport, FnReaction, Reaction, ReactionContext, ReactionCriticality, ReactionError,
    ReactionRegistry,
};
pub use repository::{
    FileStateRepository, InMemoryStateRepo, RepositoryError, StateRepository, keys,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use scheduler::TokioScheduler;

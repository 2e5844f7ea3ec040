//! The engine that owns every loaded queue and effect handler.
//!
//! [`Engine`] is synchronous and single-threaded: every public call runs to
//! completion, and the only suspension point is the [`Scheduler`]. Whoever
//! owns the engine feeds each [`Fired`](cadence_core::Fired) timer back through
//! [`Engine::fire`]; the async worker does this with tokio timers, tests do
//! it with [`ManualScheduler`](cadence_core::ManualScheduler).
//!
//! State is loaded lazily per entity from the [`StateRepository`] and written
//! back after every mutation. A failed write is logged and the entity's
//! in-memory state is thrown away and reloaded from the store.
//!
//! Modules are organized by responsibility:
//! - `actions` drives the action state machine and the per-actor queue
//! - `counter` maintains counteract queues and their prompts
//! - `effects` adds, removes and ticks effects
//! - `commands` applies deferred commands and schedules reactions
//! - `dispatch` routes fired timers
//! - `persist` loads, saves, reloads and restores

mod actions;
mod commands;
mod counter;
mod dispatch;
mod effects;
mod persist;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cadence_core::{
    ActionId, ActionQueue, CounterRef, CounteractQueue, EffectsHandler, EngineConfig, EntityId,
    Host, Registry, Scheduler, TimerHandle, Timestamp, WorldView,
};

use crate::events::EventBus;
use crate::reactions::ReactionRegistry;
use crate::repository::StateRepository;

/// Drives actions, counter windows and effects for any number of entities.
pub struct Engine<H: Host, S: Scheduler> {
    host: H,
    scheduler: S,
    store: Arc<dyn StateRepository>,
    registry: Arc<Registry>,
    config: EngineConfig,
    events: EventBus,
    reactions: ReactionRegistry,
    queues: HashMap<EntityId, ActionQueue>,
    counters: HashMap<EntityId, CounteractQueue>,
    effects: HashMap<EntityId, EffectsHandler>,
    /// Reaction timers not yet fired.
    pending_reactions: HashSet<TimerHandle>,
}

impl<H: Host, S: Scheduler> Engine<H, S> {
    pub fn new(
        host: H,
        scheduler: S,
        store: Arc<dyn StateRepository>,
        registry: Arc<Registry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            host,
            scheduler,
            store,
            registry,
            config,
            events: EventBus::new(),
            reactions: ReactionRegistry::new(),
            queues: HashMap::new(),
            counters: HashMap::new(),
            effects: HashMap::new(),
            pending_reactions: HashSet::new(),
        }
    }

    /// Publishes to `events` instead of a private bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_reactions(mut self, reactions: ReactionRegistry) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn reactions_mut(&mut self) -> &mut ReactionRegistry {
        &mut self.reactions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    /// Entities with any state loaded.
    pub fn loaded(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self
            .queues
            .keys()
            .chain(self.counters.keys())
            .chain(self.effects.keys())
            .copied()
            .collect();
        entities.sort();
        entities.dedup();
        entities
    }
}

/// Read-only view of the loaded queues handed to action hooks.
struct World<'a> {
    queues: &'a HashMap<EntityId, ActionQueue>,
    counters: &'a HashMap<EntityId, CounteractQueue>,
}

impl WorldView for World<'_> {
    fn counter_current(&self, defender: EntityId) -> Option<CounterRef> {
        self.counters
            .get(&defender)
            .and_then(|queue| queue.current().cloned())
    }

    fn counter_dc(&self, actor: EntityId, action: ActionId) -> Option<i32> {
        self.queues
            .get(&actor)?
            .current()
            .filter(|current| current.id() == action)?
            .counter_dc()
    }
}

use serde_json::Value;

use super::behavior::Move;
use super::counter::CounterRef;
use super::types::{Args, Outcome};
use crate::capability::Host;
use crate::command::{Command, EffectSpec, EnqueueMode, Trigger};
use crate::effect::{AddOptions, EffectQuery, RemoveSpec};
use crate::ids::{ActionId, EntityId};
use crate::time::Timestamp;

/// Read-only view of other actors' queues.
pub trait WorldView {
    /// Head of `defender`'s counteract queue.
    fn counter_current(&self, defender: EntityId) -> Option<CounterRef>;

    /// `counter_dc` of `actor`'s current action, if it is still `action`.
    fn counter_dc(&self, actor: EntityId, action: ActionId) -> Option<i32>;
}

/// What a move hook can see and do.
pub struct ActionContext<'a> {
    actor: EntityId,
    action: ActionId,
    now: Timestamp,
    host: &'a mut dyn Host,
    world: &'a dyn WorldView,
    commands: &'a mut Vec<Command>,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        actor: EntityId,
        action: ActionId,
        now: Timestamp,
        host: &'a mut dyn Host,
        world: &'a dyn WorldView,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            actor,
            action,
            now,
            host,
            world,
            commands,
        }
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn action_id(&self) -> ActionId {
        self.action
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    /// Sends `text` to the actor.
    pub fn msg(&mut self, text: &str) {
        self.host.msg(self.actor, text);
    }

    /// The counter opportunity the actor would react to right now.
    pub fn counter_current(&self) -> Option<CounterRef> {
        self.world.counter_current(self.actor)
    }

    /// Difficulty to beat when countering `counter`.
    pub fn counter_dc(&self, counter: &CounterRef) -> Option<i32> {
        self.world.counter_dc(counter.attacker, counter.action)
    }

    /// Lets `defender` counter this action until it ends.
    pub fn open_counter_window(&mut self, defender: EntityId) {
        self.commands.push(Command::OpenCounterWindow {
            attacker: self.actor,
            action: self.action,
            defender,
        });
    }

    /// Drops `counter` from `defender`'s counteract queue.
    pub fn close_counter(&mut self, defender: EntityId, counter: &CounterRef) {
        self.commands.push(Command::CloseCounterWindow {
            defender,
            attacker: counter.attacker,
            action: counter.action,
        });
    }

    /// Consumes the actor's opportunity on `counter` and forces the
    /// attacking action to resolve with `outcome`.
    pub fn resolve_counter(&mut self, counter: &CounterRef, outcome: Outcome) {
        self.close_counter(self.actor, counter);
        self.commands.push(Command::Resolve {
            actor: counter.attacker,
            action: counter.action,
            outcome,
        });
    }

    pub fn enqueue(&mut self, actor: EntityId, mv: Box<dyn Move>, args: Args, mode: EnqueueMode) {
        self.commands.push(Command::Enqueue {
            actor,
            mv,
            args,
            mode,
        });
    }

    pub fn add_effect(&mut self, owner: EntityId, effect: EffectSpec, options: AddOptions) {
        self.commands.push(Command::AddEffect {
            owner,
            effect,
            options,
        });
    }

    pub fn remove_effect(&mut self, owner: EntityId, query: EffectQuery, spec: RemoveSpec) {
        self.commands.push(Command::RemoveEffect { owner, query, spec });
    }

    pub fn trigger(&mut self, owner: EntityId, key: &str, payload: Value) {
        self.commands.push(Command::Trigger {
            owner,
            trigger: Trigger::new(key, payload),
        });
    }
}

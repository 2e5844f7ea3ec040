use serde_json::Value;

use super::instance::{AddOptions, EffectKey};
use super::stacks::{RemoveSpec, Sources};
use super::EffectQuery;
use crate::capability::Host;
use crate::command::{Command, EffectSpec, Trigger};
use crate::ids::EntityId;
use crate::time::Timestamp;

/// What an effect hook can see and do.
pub struct EffectContext<'a> {
    owner: EntityId,
    key: &'a EffectKey,
    now: Timestamp,
    sources: &'a Sources,
    host: &'a mut dyn Host,
    commands: &'a mut Vec<Command>,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        owner: EntityId,
        key: &'a EffectKey,
        now: Timestamp,
        sources: &'a Sources,
        host: &'a mut dyn Host,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            owner,
            key,
            now,
            sources,
            host,
            commands,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Key of the instance whose hook is running.
    pub fn key(&self) -> &EffectKey {
        self.key
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Stacks per source at the time the hook runs.
    pub fn sources(&self) -> &Sources {
        self.sources
    }

    pub fn stacks(&self) -> u32 {
        self.sources.total()
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    /// Sends `text` to the owner.
    pub fn msg(&mut self, text: &str) {
        self.host.msg(self.owner, text);
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

    /// Removes stacks from this very effect once the hook returns.
    pub fn remove_self(&mut self, spec: RemoveSpec) {
        let query = EffectQuery::from(self.key);
        self.remove_effect(self.owner, query, spec);
    }

    pub fn trigger(&mut self, owner: EntityId, key: &str, payload: Value) {
        self.commands.push(Command::Trigger {
            owner,
            trigger: Trigger::new(key, payload),
        });
    }
}

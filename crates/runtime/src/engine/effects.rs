//! Effect stacking, negation and per-source tick chains.

use cadence_core::effect::stacks::offset;
use cadence_core::{
    AddOptions, Command, EffectInstance, EffectKey, EffectQuery, EffectSpec, EffectsHandler,
    EntityId, Host, RemoveSpec, Scheduler, Source, StackChange, Task, TickDecision,
};
use tracing::debug;

use super::Engine;
use crate::api::Result;
use crate::events::EffectEvent;

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Adds stacks of an effect, creating it if `owner` has none yet.
    ///
    /// An existing instance is found by type and, when `options.name` is set,
    /// by name. Stacks are first offset against every effect the new one
    /// negates; whatever is left is added. Zero stacks is a no-op.
    pub fn add_effect(
        &mut self,
        owner: EntityId,
        effect: EffectSpec,
        options: AddOptions,
    ) -> Result<()> {
        if options.stacks == 0 {
            debug!(target: "cadence::effects", owner = %owner, effect = effect.type_tag(), "adding zero stacks");
            return Ok(());
        }
        self.ensure_effects(owner)?;

        let kind = effect.type_tag().to_string();
        let query = match &options.name {
            Some(name) => EffectQuery::kind_named(kind.as_str(), name.as_str()),
            None => EffectQuery::kind(kind.as_str()),
        };
        let handler = self
            .effects
            .entry(owner)
            .or_insert_with(|| EffectsHandler::new(owner));

        let (key, fresh) = match handler.get(&query) {
            Some(existing) => (existing.key().clone(), None),
            None => {
                let behavior = match effect {
                    EffectSpec::Tag(tag) => self.registry.create_effect(&tag)?,
                    EffectSpec::Instance(behavior) => behavior,
                };
                let instance = EffectInstance::new(behavior, &options);
                (instance.key().clone(), Some(instance))
            }
        };
        let negates = match &fresh {
            Some(instance) => instance.negates(),
            None => handler
                .get(&query)
                .map(EffectInstance::negates)
                .unwrap_or_default(),
        };

        let mut commands = Vec::new();
        let mut stacks = options.stacks;
        for negated in negates {
            let negated_query = EffectQuery::kind(negated);
            let held = self
                .effects
                .get(&owner)
                .map_or(0, |handler| handler.stacks(&negated_query));
            if held == 0 {
                continue;
            }
            let offset = offset(stacks, held);
            if let Some(negated_key) = self
                .effects
                .get(&owner)
                .and_then(|handler| handler.get(&negated_query))
                .map(|instance| instance.key().clone())
            {
                self.events.publish(EffectEvent::Negated {
                    owner,
                    effect: key.kind.clone(),
                    negated: negated_key,
                    stacks: offset.consumed,
                });
            }
            self.remove_stacks(
                owner,
                &negated_query,
                RemoveSpec::any_source(offset.consumed),
                &mut commands,
            );
            stacks = offset.remaining;
            if stacks == 0 {
                debug!(
                    target: "cadence::effects",
                    owner = %owner,
                    effect = %key,
                    "fully negated"
                );
                self.save_effects(owner);
                self.apply(commands);
                return Ok(());
            }
        }

        let now = self.scheduler.now();
        let handler = self
            .effects
            .entry(owner)
            .or_insert_with(|| EffectsHandler::new(owner));
        let created = fresh.is_some();
        if let Some(instance) = fresh {
            handler.insert(instance);
        }
        let Some(instance) = handler.get_mut(&EffectQuery::from(&key)) else {
            return Ok(());
        };

        let change = StackChange {
            source: options.source,
            stacks,
        };
        let already_ticking = instance.timer(&change.source).is_some();
        instance.add(owner, now, &mut self.host, &mut commands, change, created);
        let total = instance.stacks();
        let start_chain = instance.is_ticking() && !already_ticking;

        if created {
            debug!(target: "cadence::effects", owner = %owner, effect = %key, "created");
            self.events.publish(EffectEvent::Created {
                owner,
                effect: key.clone(),
            });
        }
        self.events.publish(EffectEvent::Added {
            owner,
            effect: key.clone(),
            source: change.source,
            stacks,
            total,
        });

        if start_chain {
            self.tick(owner, &key, change.source, &mut commands);
        }
        self.save_effects(owner);
        self.apply(commands);
        Ok(())
    }

    /// Removes stacks from the matching effect, deleting it once none are left.
    pub fn remove_effect(
        &mut self,
        owner: EntityId,
        query: EffectQuery,
        spec: RemoveSpec,
    ) -> Result<Vec<StackChange>> {
        self.ensure_effects(owner)?;
        let mut commands = Vec::new();
        let changes = self.remove_stacks(owner, &query, spec, &mut commands);
        if !changes.is_empty() {
            self.save_effects(owner);
        }
        self.apply(commands);
        Ok(changes)
    }

    /// Deletes the matching effect whatever its stacks.
    pub fn delete_effect(&mut self, owner: EntityId, query: EffectQuery) -> Result<bool> {
        self.ensure_effects(owner)?;
        let mut commands = Vec::new();
        let deleted = self.delete_instance(owner, &query, &mut commands);
        if deleted {
            self.save_effects(owner);
        }
        self.apply(commands);
        Ok(deleted)
    }

    /// Drops every effect on `owner` without running any hooks.
    pub fn clear_effects(&mut self, owner: EntityId) -> Result<()> {
        self.ensure_effects(owner)?;
        if let Some(handler) = self.effects.get_mut(&owner) {
            for mut instance in handler.drain() {
                for handle in instance.starve() {
                    self.scheduler.cancel(handle);
                }
            }
        }
        debug!(target: "cadence::effects", owner = %owner, "effects cleared");
        self.save_effects(owner);
        Ok(())
    }

    /// Total stacks of the matching effect, zero when absent.
    pub fn effect_stacks(&mut self, owner: EntityId, query: &EffectQuery) -> Result<u32> {
        self.ensure_effects(owner)?;
        Ok(self
            .effects
            .get(&owner)
            .map_or(0, |handler| handler.stacks(query)))
    }

    /// Loaded effects of `owner`.
    pub fn effects(&mut self, owner: EntityId) -> Result<Option<&EffectsHandler>> {
        self.ensure_effects(owner)?;
        Ok(self.effects.get(&owner))
    }

    fn remove_stacks(
        &mut self,
        owner: EntityId,
        query: &EffectQuery,
        spec: RemoveSpec,
        commands: &mut Vec<Command>,
    ) -> Vec<StackChange> {
        let now = self.scheduler.now();
        let Some(instance) = self
            .effects
            .get_mut(&owner)
            .and_then(|handler| handler.get_mut(query))
        else {
            return Vec::new();
        };
        let changes = instance.remove(owner, now, &mut self.host, commands, spec.source, spec.stacks);
        let key = instance.key().clone();
        let total = instance.stacks();

        for change in &changes {
            self.events.publish(EffectEvent::Removed {
                owner,
                effect: key.clone(),
                source: change.source,
                stacks: change.stacks,
                total,
            });
        }
        if total == 0 {
            self.delete_instance(owner, &EffectQuery::from(&key), commands);
        }
        changes
    }

    fn delete_instance(
        &mut self,
        owner: EntityId,
        query: &EffectQuery,
        commands: &mut Vec<Command>,
    ) -> bool {
        let now = self.scheduler.now();
        let Some(mut instance) = self
            .effects
            .get_mut(&owner)
            .and_then(|handler| handler.take(query))
        else {
            return false;
        };
        for handle in instance.starve() {
            self.scheduler.cancel(handle);
        }
        instance.delete(owner, now, &mut self.host, commands);
        debug!(target: "cadence::effects", owner = %owner, effect = %instance.key(), "deleted");
        self.events.publish(EffectEvent::Deleted {
            owner,
            effect: instance.key().clone(),
        });
        true
    }

    /// One step of `source`'s tick chain: stop on a starved effect or a
    /// removed source, wait out the rest of the period, or fire and re-arm.
    pub(super) fn tick(
        &mut self,
        owner: EntityId,
        key: &EffectKey,
        source: Source,
        commands: &mut Vec<Command>,
    ) {
        let now = self.scheduler.now();
        let Some(instance) = self
            .effects
            .get_mut(&owner)
            .and_then(|handler| handler.get_mut(&EffectQuery::from(key)))
        else {
            return;
        };

        let (delay, fired) = match instance.tick_decision(now, &source) {
            TickDecision::Stop => {
                instance.disarm(&source);
                debug!(
                    target: "cadence::effects",
                    owner = %owner,
                    effect = %key,
                    source = %source,
                    "tick chain stopped"
                );
                return;
            }
            TickDecision::Wait(remaining) => (remaining, false),
            TickDecision::Fire => {
                instance.fire_tick(owner, now, &mut self.host, commands, source);
                (instance.duration(), true)
            }
        };

        let task = Task::Tick {
            owner,
            effect: key.clone(),
            source,
        };
        let handle = self.scheduler.schedule(delay, task);
        if let Some(stale) = instance.arm(source, handle) {
            self.scheduler.cancel(stale);
        }

        if fired {
            debug!(
                target: "cadence::effects",
                owner = %owner,
                effect = %key,
                source = %source,
                "ticked"
            );
            self.events.publish(EffectEvent::Ticked {
                owner,
                effect: key.clone(),
                source,
            });
            self.save_effects(owner);
        }
    }
}

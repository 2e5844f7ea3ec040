//! Lazy loading, saving and reload-on-failure.
//!
//! Every entity's action queue, counteract queue and effects live under
//! their own key in the store. They are loaded on first use, and loading
//! schedules whatever resumption the saved state calls for: a current
//! action resumes after the resume delay, a backlog-only queue advances
//! after it, and each ticking effect source restarts its chain after the
//! effect resume delay.

use cadence_core::{
    ActionQueue, ActionRecord, CounterRef, CounteractQueue, EffectRecord, EffectsHandler,
    EntityId, Host, PersistError, Scheduler, Task,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::Engine;
use crate::api::{Result, RuntimeError};
use crate::repository::keys;

fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| PersistError::encode(what, e).into())
}

/// Decodes a stored list one entry at a time. Entries that fail to decode
/// are logged and dropped; only a value that is not a list at all is an
/// error.
fn decode_list<T: DeserializeOwned>(what: &'static str, owner: EntityId, value: Value) -> Result<Vec<T>> {
    let entries: Vec<Value> =
        serde_json::from_value(value).map_err(|e| PersistError::decode(what, e))?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(target: "cadence::persist", owner = %owner, what, error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Loads every kind of state `entity` has, scheduling its resumption.
    pub fn restore(&mut self, entity: EntityId) -> Result<()> {
        self.ensure_queue(entity)?;
        self.ensure_counters(entity)?;
        self.ensure_effects(entity)?;
        Ok(())
    }

    /// Restores every entity the store knows about and returns how many
    /// loaded. An entity that fails to load is logged and skipped.
    pub fn restore_all(&mut self) -> Result<usize> {
        let owners = self.store.list_owners()?;
        let mut restored = 0;
        for owner in &owners {
            match self.restore(*owner) {
                Ok(()) => restored += 1,
                Err(e) => {
                    error!(target: "cadence::persist", owner = %owner, error = %e, "restore failed; skipping");
                }
            }
        }
        info!(
            target: "cadence::persist",
            entities = restored,
            failed = owners.len() - restored,
            "restored from store"
        );
        Ok(restored)
    }

    /// Cancels every timer. A cold shutdown first clears every loaded queue,
    /// ending current actions without prompting anyone.
    pub fn shutdown(&mut self, cold: bool) {
        if cold {
            let actors: Vec<EntityId> = self.queues.keys().copied().collect();
            for actor in actors {
                if let Err(e) = self.clear(actor, true) {
                    warn!(target: "cadence::persist", actor = %actor, error = %e, "clear at shutdown failed");
                }
            }
        }

        for queue in self.queues.values_mut() {
            if let Some(handle) = queue.take_promotion() {
                self.scheduler.cancel(handle);
            }
            if let Some(handle) = queue.current_mut().and_then(|current| current.take_timer()) {
                self.scheduler.cancel(handle);
            }
        }
        for handler in self.effects.values_mut() {
            for instance in handler.iter_mut() {
                for handle in instance.take_timers() {
                    self.scheduler.cancel(handle);
                }
            }
        }
        for handle in self.pending_reactions.drain() {
            self.scheduler.cancel(handle);
        }
        info!(target: "cadence::persist", cold, "engine shut down");
    }

    pub(super) fn ensure_queue(&mut self, actor: EntityId) -> Result<()> {
        if self.queues.contains_key(&actor) {
            return Ok(());
        }
        let queue = self.load_queue(actor)?;
        self.queues.insert(actor, queue);
        self.schedule_queue_restore(actor);
        Ok(())
    }

    pub(super) fn ensure_counters(&mut self, defender: EntityId) -> Result<()> {
        if self.counters.contains_key(&defender) {
            return Ok(());
        }
        let records: Vec<CounterRef> = match self.store.load(defender, keys::COUNTER_QUEUE)? {
            Some(value) => decode_list("counteract queue", defender, value)?,
            None => Vec::new(),
        };

        let mut live = Vec::with_capacity(records.len());
        for counter in records {
            if let Err(e) = self.ensure_queue(counter.attacker) {
                warn!(
                    target: "cadence::persist",
                    attacker = %counter.attacker,
                    error = %e,
                    "dropping counter whose attacker failed to load"
                );
                continue;
            }
            if self.current_action(counter.attacker) == Some(counter.action) {
                live.push(counter);
            } else {
                debug!(
                    target: "cadence::persist",
                    defender = %defender,
                    attacker = %counter.attacker,
                    "dropping counter for a finished action"
                );
            }
        }
        self.counters
            .insert(defender, CounteractQueue::from_records(live));
        Ok(())
    }

    pub(super) fn ensure_effects(&mut self, owner: EntityId) -> Result<()> {
        if self.effects.contains_key(&owner) {
            return Ok(());
        }
        let handler = self.load_effects(owner)?;
        self.effects.insert(owner, handler);
        self.schedule_effect_restore(owner);
        Ok(())
    }

    fn load_queue(&self, actor: EntityId) -> Result<ActionQueue> {
        let Some(value) = self.store.load(actor, keys::ACTION_QUEUE)? else {
            return Ok(ActionQueue::new());
        };
        let records: Vec<ActionRecord> = decode_list("action queue", actor, value)?;
        Ok(ActionQueue::from_records(records, &self.registry))
    }

    fn load_effects(&self, owner: EntityId) -> Result<EffectsHandler> {
        let Some(value) = self.store.load(owner, keys::EFFECTS)? else {
            return Ok(EffectsHandler::new(owner));
        };
        let records: Vec<EffectRecord> = decode_list("effects", owner, value)?;
        Ok(EffectsHandler::from_records(owner, records, &self.registry))
    }

    fn schedule_queue_restore(&mut self, actor: EntityId) {
        let delay = self.config.resume_delay();
        let Some(queue) = self.queues.get_mut(&actor) else {
            return;
        };
        let task = match queue.current() {
            Some(current) => Task::Resume {
                actor,
                action: current.id(),
            },
            None if queue.backlog_len() > 0 => Task::Advance { actor },
            None => return,
        };
        debug!(target: "cadence::persist", actor = %actor, ?task, "queue restore scheduled");
        let handle = self.scheduler.schedule(delay, task);
        if let Some(stale) = queue.set_promotion(handle) {
            self.scheduler.cancel(stale);
        }
    }

    fn schedule_effect_restore(&mut self, owner: EntityId) {
        let delay = self.config.effect_resume_delay();
        let Some(handler) = self.effects.get_mut(&owner) else {
            return;
        };
        for instance in handler.iter_mut() {
            for source in instance.ticking_sources() {
                let task = Task::Tick {
                    owner,
                    effect: instance.key().clone(),
                    source,
                };
                let handle = self.scheduler.schedule(delay, task);
                if let Some(stale) = instance.arm(source, handle) {
                    self.scheduler.cancel(stale);
                }
            }
        }
    }

    pub(super) fn save_queue(&mut self, actor: EntityId) {
        let Some(queue) = self.queues.get(&actor) else {
            return;
        };
        let result = queue
            .to_records()
            .map_err(RuntimeError::from)
            .and_then(|records| encode("action queue", &records))
            .and_then(|value| self.store.save(actor, keys::ACTION_QUEUE, &value).map_err(RuntimeError::from));
        if let Err(e) = result {
            error!(
                target: "cadence::persist",
                actor = %actor,
                error = %e,
                "failed to save action queue; reloading from store"
            );
            self.reload_queue(actor);
        }
    }

    pub(super) fn save_counters(&mut self, defender: EntityId) {
        let Some(queue) = self.counters.get(&defender) else {
            return;
        };
        let result = encode("counteract queue", &queue.to_records())
            .and_then(|value| self.store.save(defender, keys::COUNTER_QUEUE, &value).map_err(RuntimeError::from));
        if let Err(e) = result {
            error!(
                target: "cadence::persist",
                defender = %defender,
                error = %e,
                "failed to save counteract queue; reloading from store"
            );
            self.counters.remove(&defender);
            if let Err(e) = self.ensure_counters(defender) {
                error!(target: "cadence::persist", defender = %defender, error = %e, "reload failed");
            }
        }
    }

    pub(super) fn save_effects(&mut self, owner: EntityId) {
        let Some(handler) = self.effects.get(&owner) else {
            return;
        };
        let result = handler
            .to_records()
            .map_err(RuntimeError::from)
            .and_then(|records| encode("effects", &records))
            .and_then(|value| self.store.save(owner, keys::EFFECTS, &value).map_err(RuntimeError::from));
        if let Err(e) = result {
            error!(
                target: "cadence::persist",
                owner = %owner,
                error = %e,
                "failed to save effects; reloading from store"
            );
            self.reload_effects(owner);
        }
    }

    /// Throws away `actor`'s in-memory queue and reloads it without
    /// scheduling anything: the stored current action may already have ended
    /// in memory and must not end twice. If the reload fails too the queue
    /// stays unloaded and the next use retries.
    fn reload_queue(&mut self, actor: EntityId) {
        if let Some(stale) = self.queues.remove(&actor) {
            for handle in stale.timers() {
                self.scheduler.cancel(handle);
            }
        }
        match self.load_queue(actor) {
            Ok(queue) => {
                self.queues.insert(actor, queue);
            }
            Err(e) => {
                error!(target: "cadence::persist", actor = %actor, error = %e, "reload failed");
            }
        }
    }

    fn reload_effects(&mut self, owner: EntityId) {
        if let Some(mut stale) = self.effects.remove(&owner) {
            for mut instance in stale.drain() {
                for handle in instance.take_timers() {
                    self.scheduler.cancel(handle);
                }
            }
        }
        if let Err(e) = self.ensure_effects(owner) {
            error!(target: "cadence::persist", owner = %owner, error = %e, "reload failed");
        }
    }
}

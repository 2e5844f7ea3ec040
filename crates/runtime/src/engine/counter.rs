//! Counteract queue maintenance.

use cadence_core::text::with_article;
use cadence_core::{ActionId, CounterRef, EntityId, Host, Scheduler};
use tracing::{debug, warn};

use super::Engine;
use crate::events::CounterEvent;

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Head of `defender`'s counteract queue, if loaded.
    pub fn counter_current(&self, defender: EntityId) -> Option<&CounterRef> {
        self.counters.get(&defender)?.current()
    }

    /// Entries in `defender`'s counteract queue.
    pub fn counter_len(&self, defender: EntityId) -> usize {
        self.counters.get(&defender).map_or(0, |queue| queue.len())
    }

    /// Opens a counter window for `attacker`'s current action on `defender`.
    pub(super) fn open_counter_window(
        &mut self,
        attacker: EntityId,
        action: ActionId,
        defender: EntityId,
    ) {
        let Some(current) = self
            .queues
            .get_mut(&attacker)
            .and_then(|queue| queue.current_mut())
            .filter(|current| current.id() == action)
        else {
            debug!(
                target: "cadence::counter",
                attacker = %attacker,
                action = %action,
                "window for an action that is no longer current"
            );
            return;
        };
        current.note_countering(defender);
        let counter = CounterRef {
            attacker,
            action,
            kind: current.kind().to_string(),
            name: current.name().to_string(),
        };
        self.save_queue(attacker);
        self.counter_add(defender, counter);
    }

    /// Replaces any entry from the same attacker and prompts the defender
    /// when the head changed.
    pub(super) fn counter_add(&mut self, defender: EntityId, counter: CounterRef) {
        if let Err(e) = self.ensure_counters(defender) {
            warn!(
                target: "cadence::counter",
                defender = %defender,
                error = %e,
                "counteract queue unavailable"
            );
            return;
        }
        let queue = self.counters.entry(defender).or_default();
        let head_changed = queue.add(counter.clone());
        self.events
            .publish(CounterEvent::Opened { defender, counter });
        self.save_counters(defender);
        if head_changed {
            self.counter_prompt(defender);
        }
    }

    /// Idempotent. Prompts the defender with the new head when the removed
    /// entry was the head.
    pub(super) fn counter_remove(&mut self, defender: EntityId, attacker: EntityId, action: ActionId) {
        if let Err(e) = self.ensure_counters(defender) {
            warn!(
                target: "cadence::counter",
                defender = %defender,
                error = %e,
                "counteract queue unavailable"
            );
            return;
        }
        let Some(queue) = self.counters.get_mut(&defender) else {
            return;
        };
        let counter = queue
            .iter()
            .find(|c| c.attacker == attacker && c.action == action)
            .cloned();
        let removal = queue.remove(attacker, action);
        if let Some(counter) = counter.filter(|_| removal.removed) {
            self.events
                .publish(CounterEvent::Closed { defender, counter });
            self.save_counters(defender);
        }
        if removal.was_current {
            self.counter_prompt(defender);
        }
    }

    fn counter_prompt(&mut self, defender: EntityId) {
        let Some(current) = self.counter_current(defender).cloned() else {
            return;
        };
        let by = self.host.display_name(current.attacker, defender);
        self.host.msg(
            defender,
            &format!(
                "You have an opportunity to counteract {} by {by}.",
                with_article(&current.name)
            ),
        );
        self.host.on_counter_opportunity(defender, &current);
        self.events.publish(CounterEvent::Opportunity {
            defender,
            counter: current,
        });
    }
}

//! Routing of fired timers.
//!
//! A fire is honoured only while its handle is still the one armed on its
//! target; anything else is a timer that was cancelled or superseded after
//! it had already been sent.

use cadence_core::{
    ActionId, EffectKey, EffectQuery, EntityId, Fired, Host, Scheduler, Source, Task, TimerHandle,
    Trigger,
};
use tracing::{debug, trace, warn};

use super::Engine;
use super::actions::Entry;

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Handles one fired timer.
    pub fn fire(&mut self, fired: Fired) {
        let Fired { handle, task } = fired;
        self.scheduler.retire(handle);
        trace!(target: "cadence::worker", ?handle, ?task, "timer fired");

        match task {
            Task::Promote { actor, action } => self.on_promote(handle, actor, action),
            Task::Resume { actor, action } => self.on_resume(handle, actor, action),
            Task::Advance { actor } => self.on_advance(handle, actor),
            Task::Continue { actor, action } => self.on_continue(handle, actor, action),
            Task::Tick {
                owner,
                effect,
                source,
            } => self.on_tick(handle, owner, effect, source),
            Task::React { owner, trigger } => self.on_react(handle, owner, trigger),
        }
    }

    /// Takes the promotion slot if `handle` still holds it.
    fn claim_promotion(&mut self, handle: TimerHandle, actor: EntityId) -> bool {
        let Some(queue) = self.queues.get_mut(&actor) else {
            return false;
        };
        if queue.promotion() != Some(handle) {
            debug!(target: "cadence::actions", actor = %actor, ?handle, "stale promotion timer");
            return false;
        }
        queue.take_promotion();
        true
    }

    fn on_promote(&mut self, handle: TimerHandle, actor: EntityId, action: ActionId) {
        if !self.claim_promotion(handle, actor) {
            return;
        }
        let Some(current) = self
            .queues
            .get_mut(&actor)
            .filter(|queue| queue.is_current(action))
            .and_then(|queue| queue.take_current())
        else {
            return;
        };
        self.start(current);
    }

    fn on_resume(&mut self, handle: TimerHandle, actor: EntityId, action: ActionId) {
        if !self.claim_promotion(handle, actor) {
            return;
        }
        let Some(current) = self
            .queues
            .get_mut(&actor)
            .filter(|queue| queue.is_current(action))
            .and_then(|queue| queue.take_current())
        else {
            return;
        };
        self.restore_current(current);
    }

    fn on_advance(&mut self, handle: TimerHandle, actor: EntityId) {
        if !self.claim_promotion(handle, actor) {
            return;
        }
        let idle = self
            .queues
            .get(&actor)
            .is_some_and(|queue| queue.current().is_none());
        if idle {
            self.next(actor);
        }
    }

    fn on_continue(&mut self, handle: TimerHandle, actor: EntityId, action: ActionId) {
        let Some(queue) = self.queues.get_mut(&actor) else {
            return;
        };
        let armed = queue
            .current()
            .is_some_and(|current| current.id() == action && current.timer() == Some(handle));
        if !armed {
            debug!(target: "cadence::actions", actor = %actor, action = %action, "stale continuation timer");
            return;
        }
        let Some(mut current) = queue.take_current() else {
            return;
        };
        current.take_timer();
        match current.wake() {
            Some(transition) => self.drive(current, Entry::Resume(transition), true),
            None => {
                warn!(
                    target: "cadence::actions",
                    actor = %actor,
                    action = %action,
                    "continuation fired without a suspension"
                );
                queue.set_current(current);
            }
        }
    }

    fn on_tick(&mut self, handle: TimerHandle, owner: EntityId, effect: EffectKey, source: Source) {
        let armed = self
            .effects
            .get(&owner)
            .and_then(|handler| handler.get(&EffectQuery::from(&effect)))
            .is_some_and(|instance| instance.timer(&source) == Some(handle));
        if !armed {
            debug!(
                target: "cadence::effects",
                owner = %owner,
                effect = %effect,
                source = %source,
                "stale tick timer"
            );
            return;
        }
        let mut commands = Vec::new();
        self.tick(owner, &effect, source, &mut commands);
        self.apply(commands);
    }

    fn on_react(&mut self, handle: TimerHandle, owner: EntityId, trigger: Trigger) {
        if !self.pending_reactions.remove(&handle) {
            return;
        }
        let report = self.reactions.dispatch(owner, &trigger);
        debug!(
            target: "cadence::reactions",
            owner = %owner,
            trigger = %trigger.key,
            ran = report.ran,
            failed = report.failed,
            detached = report.detached,
            "dispatched"
        );
    }
}

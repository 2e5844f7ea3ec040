//! Action queue operations and the transition loop.

use std::time::Duration;

use cadence_core::{
    Action, ActionContext, ActionId, Args, EndArgs, EndReport, EnqueueMode, EntityId, Host, Move,
    Outcome, RestorePlan, Scheduler, Task, Transition, Trigger,
};
use serde_json::json;
use tracing::{debug, warn};

use super::{Engine, World};
use crate::api::Result;
use crate::events::ActionEvent;

/// Where [`Engine::drive`] enters the state machine.
pub(super) enum Entry {
    Start,
    Resume(Transition),
}

/// Where the transition loop stopped.
enum Halt {
    Suspended(Duration),
    Ended(Option<EndReport>),
}

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Queues `mv` for `actor`.
    pub fn enqueue(
        &mut self,
        actor: EntityId,
        mv: Box<dyn Move>,
        args: Args,
        mode: EnqueueMode,
    ) -> Result<ActionId> {
        self.ensure_queue(actor)?;
        let action = Action::new(actor, mv, args);
        let id = action.id();
        self.events.publish(ActionEvent::Queued {
            actor,
            action: id,
            name: action.name().to_string(),
            mode,
        });

        match mode {
            EnqueueMode::Add => self.add(action),
            EnqueueMode::Next => self.add_next(action),
            EnqueueMode::Override => self.override_current(action),
        }
        Ok(id)
    }

    fn add(&mut self, action: Action) {
        let actor = action.actor();
        let queue = self.queues.entry(actor).or_default();
        queue.push_back(action);
        if queue.current().is_some() {
            self.save_queue(actor);
        } else {
            self.next(actor);
        }
    }

    fn add_next(&mut self, action: Action) {
        let actor = action.actor();
        let queue = self.queues.entry(actor).or_default();
        if queue.backlog_len() == 0 {
            self.add(action);
            return;
        }
        queue.push_front(action);
        self.save_queue(actor);
    }

    fn override_current(&mut self, action: Action) {
        let actor = action.actor();
        let queue = self.queues.entry(actor).or_default();
        queue.push_front(action);
        match queue.take_current() {
            Some(current) => {
                let end = EndArgs::new(current.args().to_vec());
                self.drive(current, Entry::Resume(Transition::End(end)), true);
            }
            None => self.next(actor),
        }
    }

    /// Promotes the backlog head, or goes idle when there is none.
    pub fn next(&mut self, actor: EntityId) {
        let delay = self.config.promotion_delay();
        let queue = self.queues.entry(actor).or_default();
        if let Some(stale) = queue.take_promotion() {
            self.scheduler.cancel(stale);
        }
        if let Some(leftover) = queue.take_current() {
            warn!(
                target: "cadence::actions",
                actor = %actor,
                action = %leftover.id(),
                "next() found a current action; dropping it"
            );
        }

        match queue.pop_front() {
            Some(action) => {
                let id = action.id();
                queue.set_current(action);
                let handle = self
                    .scheduler
                    .schedule(delay, Task::Promote { actor, action: id });
                queue.set_promotion(handle);
                debug!(target: "cadence::actions", actor = %actor, action = %id, "promoted");
                self.events
                    .publish(ActionEvent::Promoted { actor, action: id });
            }
            None => {
                debug!(target: "cadence::actions", actor = %actor, "queue idle");
                self.events.publish(ActionEvent::Idle { actor });
            }
        }

        self.host.prompt(actor);
        self.save_queue(actor);
    }

    /// Empties the backlog and force-ends the current action without
    /// promoting anything. A shutdown-time clear does not prompt the actor.
    pub fn clear(&mut self, actor: EntityId, shutdown: bool) -> Result<()> {
        self.ensure_queue(actor)?;
        let queue = self.queues.entry(actor).or_default();
        let dropped = queue.clear_backlog();
        if let Some(stale) = queue.take_promotion() {
            self.scheduler.cancel(stale);
        }
        if let Some(current) = queue.take_current() {
            let end = EndArgs::new(current.args().to_vec());
            self.drive(current, Entry::Resume(Transition::End(end)), false);
        }

        debug!(
            target: "cadence::actions",
            actor = %actor,
            dropped = dropped.len(),
            shutdown,
            "queue cleared"
        );
        self.events.publish(ActionEvent::Cleared { actor });
        self.save_queue(actor);
        if !shutdown {
            self.host.prompt(actor);
        }
        Ok(())
    }

    /// Status of the current action followed by the backlog.
    pub fn display(&mut self, actor: EntityId) -> Result<String> {
        self.ensure_queue(actor)?;
        Ok(self
            .queues
            .get(&actor)
            .map(|queue| queue.display())
            .unwrap_or_else(|| "You are not planning to do anything.".to_string()))
    }

    /// Id of `actor`'s current action, if loaded.
    pub fn current_action(&self, actor: EntityId) -> Option<ActionId> {
        self.queues
            .get(&actor)
            .and_then(|queue| queue.current())
            .map(Action::id)
    }

    /// Number of actions waiting behind the current one.
    pub fn backlog_len(&self, actor: EntityId) -> usize {
        self.queues.get(&actor).map_or(0, |queue| queue.backlog_len())
    }

    /// Forces `actor`'s current action to resolve, if it is still `action`.
    pub(super) fn resolve(&mut self, actor: EntityId, action: ActionId, outcome: Outcome) {
        let Some(queue) = self.queues.get_mut(&actor) else {
            return;
        };
        if !queue.is_current(action) {
            debug!(
                target: "cadence::actions",
                actor = %actor,
                action = %action,
                "resolve for an action that is no longer current"
            );
            return;
        }
        let Some(current) = queue.take_current() else {
            return;
        };
        let end = EndArgs::new(current.args().to_vec());
        let transition = match outcome {
            Outcome::Succeeded => Transition::Succeed(end),
            Outcome::Failed => Transition::Fail(end),
            Outcome::Ended => Transition::End(end),
        };
        self.drive(current, Entry::Resume(transition), true);
    }

    /// Runs the promoted current action's `start`.
    pub(super) fn start(&mut self, action: Action) {
        let actor = action.actor();
        if let Err(e) = self.ensure_counters(actor) {
            warn!(
                target: "cadence::actions",
                actor = %actor,
                error = %e,
                "counteract queue unavailable at start"
            );
        }
        self.events.publish(ActionEvent::Started {
            actor,
            action: action.id(),
            name: action.name().to_string(),
        });
        self.drive(action, Entry::Start, true);
    }

    /// Picks a reloaded current action back up.
    pub(super) fn restore_current(&mut self, mut action: Action) {
        match action.restore_plan(self.scheduler.now()) {
            RestorePlan::Start => self.start(action),
            RestorePlan::Wait(delay) => {
                let actor = action.actor();
                let id = action.id();
                let handle = self
                    .scheduler
                    .schedule(delay, Task::Continue { actor, action: id });
                if let Some(stale) = action.arm(handle) {
                    self.scheduler.cancel(stale);
                }
                debug!(
                    target: "cadence::actions",
                    actor = %actor,
                    action = %id,
                    ?delay,
                    "restored suspended action"
                );
                self.queues.entry(actor).or_default().set_current(action);
            }
        }
    }

    /// Runs transitions on a checked-out action until it suspends or ends,
    /// then applies the commands its hooks emitted. `advance` controls
    /// whether an end promotes the next queued action.
    pub(super) fn drive(&mut self, mut action: Action, entry: Entry, advance: bool) {
        let actor = action.actor();
        let id = action.id();
        let mut commands = Vec::new();
        let mut next = entry;

        let halt = loop {
            let now = self.scheduler.now();
            let world = World {
                queues: &self.queues,
                counters: &self.counters,
            };
            let mut ctx = ActionContext::new(actor, id, now, &mut self.host, &world, &mut commands);
            let transition = match next {
                Entry::Start => action.begin(&mut ctx),
                Entry::Resume(Transition::Do(args)) => action.perform(&mut ctx, args),
                Entry::Resume(Transition::Succeed(end)) => action.succeed(&mut ctx, end),
                Entry::Resume(Transition::Fail(end)) => action.fail(&mut ctx, end),
                Entry::Resume(Transition::End(end)) => {
                    if let Some(handle) = action.take_timer() {
                        self.scheduler.cancel(handle);
                    }
                    break Halt::Ended(action.finish(&mut ctx, end));
                }
                Entry::Resume(Transition::Suspend(delay)) => break Halt::Suspended(delay),
            };
            next = Entry::Resume(transition);
        };

        match halt {
            Halt::Suspended(delay) => self.suspend(action, delay),
            Halt::Ended(Some(report)) => self.conclude(action, report, advance),
            Halt::Ended(None) => {}
        }
        self.apply(commands);
    }

    fn suspend(&mut self, mut action: Action, delay: Duration) {
        let actor = action.actor();
        let id = action.id();
        let handle = self
            .scheduler
            .schedule(delay, Task::Continue { actor, action: id });
        if let Some(stale) = action.arm(handle) {
            self.scheduler.cancel(stale);
        }
        if let Some(suspension) = action.suspension() {
            debug!(
                target: "cadence::actions",
                actor = %actor,
                action = %id,
                resume_at = %suspension.resume_at,
                "suspended"
            );
            self.events.publish(ActionEvent::Suspended {
                actor,
                action: id,
                resume_at: suspension.resume_at,
            });
        }
        if let Some(displaced) = self.queues.entry(actor).or_default().set_current(action) {
            warn!(
                target: "cadence::actions",
                actor = %actor,
                action = %displaced.id(),
                "suspending action displaced another current action"
            );
        }
        self.save_queue(actor);
    }

    fn conclude(&mut self, action: Action, report: EndReport, advance: bool) {
        let actor = action.actor();
        let id = action.id();
        for defender in &report.countering {
            self.counter_remove(*defender, actor, id);
        }

        let payload = json!({
            "action": id,
            "args": report.end.args,
            "exp": report.end.exp,
            "outcome": report.end.outcome,
        });
        self.schedule_reaction(actor, Trigger::on_move(action.name(), payload));

        debug!(
            target: "cadence::actions",
            actor = %actor,
            action = %id,
            outcome = %report.end.outcome,
            "ended"
        );
        self.events.publish(ActionEvent::Ended {
            actor,
            action: id,
            name: action.name().to_string(),
            outcome: report.end.outcome,
        });

        if advance {
            self.next(actor);
        }
    }
}

//! Deferred commands emitted by action and effect hooks.

use cadence_core::{Command, EntityId, Host, Scheduler, Task, Trigger};
use tracing::{debug, warn};

use super::Engine;

impl<H: Host, S: Scheduler> Engine<H, S> {
    /// Applies commands in emission order. Failures are logged per command.
    pub(super) fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.apply_one(command);
        }
    }

    fn apply_one(&mut self, command: Command) {
        match command {
            Command::OpenCounterWindow {
                attacker,
                action,
                defender,
            } => self.open_counter_window(attacker, action, defender),
            Command::CloseCounterWindow {
                defender,
                attacker,
                action,
            } => self.counter_remove(defender, attacker, action),
            Command::Resolve {
                actor,
                action,
                outcome,
            } => self.resolve(actor, action, outcome),
            Command::Enqueue {
                actor,
                mv,
                args,
                mode,
            } => {
                if let Err(e) = self.enqueue(actor, mv, args, mode) {
                    warn!(target: "cadence::actions", actor = %actor, error = %e, "deferred enqueue failed");
                }
            }
            Command::AddEffect {
                owner,
                effect,
                options,
            } => {
                let tag = effect.type_tag().to_string();
                if let Err(e) = self.add_effect(owner, effect, options) {
                    warn!(target: "cadence::effects", owner = %owner, effect = %tag, error = %e, "deferred add failed");
                }
            }
            Command::RemoveEffect { owner, query, spec } => {
                if let Err(e) = self.remove_effect(owner, query, spec) {
                    warn!(target: "cadence::effects", owner = %owner, error = %e, "deferred remove failed");
                }
            }
            Command::Trigger { owner, trigger } => self.schedule_reaction(owner, trigger),
        }
    }

    /// Fires `trigger` on `owner` after the reaction delay. Fire and forget.
    pub fn trigger(&mut self, owner: EntityId, trigger: Trigger) {
        self.schedule_reaction(owner, trigger);
    }

    pub(super) fn schedule_reaction(&mut self, owner: EntityId, trigger: Trigger) {
        debug!(target: "cadence::reactions", owner = %owner, trigger = %trigger.key, "scheduled");
        let handle = self
            .scheduler
            .schedule(self.config.reaction_delay(), Task::React { owner, trigger });
        self.pending_reactions.insert(handle);
    }
}

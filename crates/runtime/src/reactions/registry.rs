//! Reaction registry keyed by trigger.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::{EntityId, Trigger};
use tracing::{debug, error, warn};

use super::{Reaction, ReactionContext, ReactionCriticality, ReactionError};

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub ran: usize,
    pub failed: usize,
    pub detached: usize,
}

/// Registry of reactions, either global or scoped to one owner.
///
/// A global reaction runs for a trigger key on every owner; a scoped one
/// only for its owner. Both kinds are merged and run by priority (lower
/// values first, global before scoped on ties).
#[derive(Default)]
pub struct ReactionRegistry {
    global: HashMap<String, Vec<Arc<dyn Reaction>>>,
    scoped: HashMap<(EntityId, String), Vec<Arc<dyn Reaction>>>,
}

impl ReactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `reaction` to `key` on every owner.
    pub fn subscribe(&mut self, key: impl Into<String>, reaction: Arc<dyn Reaction>) {
        self.global.entry(key.into()).or_default().push(reaction);
    }

    /// Subscribes `reaction` to `key` on `owner` only.
    pub fn subscribe_for(
        &mut self,
        owner: EntityId,
        key: impl Into<String>,
        reaction: Arc<dyn Reaction>,
    ) {
        self.scoped
            .entry((owner, key.into()))
            .or_default()
            .push(reaction);
    }

    /// Drops every reaction scoped to `owner`.
    pub fn forget(&mut self, owner: EntityId) {
        self.scoped.retain(|(scope, _), _| *scope != owner);
    }

    /// Number of reactions that would run for `key` on `owner`.
    pub fn count(&self, owner: EntityId, key: &str) -> usize {
        let global = self.global.get(key).map_or(0, Vec::len);
        let scoped = self
            .scoped
            .get(&(owner, key.to_string()))
            .map_or(0, Vec::len);
        global + scoped
    }

    pub fn is_empty(&self) -> bool {
        self.global.values().all(Vec::is_empty) && self.scoped.values().all(Vec::is_empty)
    }

    /// Runs every reaction for `trigger` on `owner`. Detached reactions are
    /// unsubscribed; nothing is propagated.
    pub fn dispatch(&mut self, owner: EntityId, trigger: &Trigger) -> DispatchReport {
        let scope = (owner, trigger.key.clone());
        let mut reactions: Vec<Arc<dyn Reaction>> = self
            .global
            .get(&trigger.key)
            .into_iter()
            .chain(self.scoped.get(&scope))
            .flatten()
            .cloned()
            .collect();
        reactions.sort_by_key(|r| r.priority());

        let ctx = ReactionContext { owner, trigger };
        let mut report = DispatchReport::default();
        let mut detached = Vec::new();

        for reaction in reactions {
            match reaction.react(&ctx) {
                Ok(()) => report.ran += 1,
                Err(ReactionError::Detached(reason)) => {
                    warn!(
                        target: "cadence::reactions",
                        reaction = reaction.name(),
                        trigger = %trigger.key,
                        owner = %owner,
                        reason = %reason,
                        "Dropping detached reaction"
                    );
                    report.detached += 1;
                    detached.push(reaction);
                }
                Err(e) => {
                    report.failed += 1;
                    self.handle_reaction_error(reaction.as_ref(), &trigger.key, e);
                }
            }
        }

        if !detached.is_empty() {
            let gone = |r: &Arc<dyn Reaction>| detached.iter().any(|d| Arc::ptr_eq(d, r));
            if let Some(list) = self.global.get_mut(&trigger.key) {
                list.retain(|r| !gone(r));
            }
            if let Some(list) = self.scoped.get_mut(&scope) {
                list.retain(|r| !gone(r));
            }
        }

        report
    }

    fn handle_reaction_error(&self, reaction: &dyn Reaction, key: &str, error: ReactionError) {
        match reaction.criticality() {
            ReactionCriticality::Important => error!(
                target: "cadence::reactions",
                reaction = reaction.name(),
                trigger = key,
                error = ?error,
                "Reaction failed, continuing"
            ),
            ReactionCriticality::Optional => debug!(
                target: "cadence::reactions",
                reaction = reaction.name(),
                trigger = key,
                error = ?error,
                "Optional reaction failed"
            ),
        }
    }
}

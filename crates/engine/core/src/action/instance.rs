use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::behavior::Move;
use super::context::ActionContext;
use super::types::{ActionState, Args, Continuation, EndArgs, Outcome, Suspension, Step, Verdict};
use crate::error::PersistError;
use crate::ids::{ActionId, EntityId, PartId, TimerHandle};
use crate::registry::Registry;
use crate::text::numbered_name;
use crate::time;

/// Next phase the engine should run for an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Do(Args),
    Succeed(EndArgs),
    Fail(EndArgs),
    End(EndArgs),
    /// The action is waiting; arm a timer for this long.
    Suspend(Duration),
}

/// Produced exactly once, when an action ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndReport {
    pub end: EndArgs,
    /// Defenders whose counteract queues still reference this action.
    pub countering: Vec<EntityId>,
}

/// How a reloaded current action picks up again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestorePlan {
    /// Never started; run `start` fresh.
    Start,
    /// Continue the saved suspension after this delay.
    Wait(Duration),
}

/// One action instance and its lifecycle state.
#[derive(Debug)]
pub struct Action {
    id: ActionId,
    actor: EntityId,
    state: ActionState,
    args: Args,
    suspended: Option<Suspension>,
    parts_to_use: Option<BTreeMap<String, Vec<PartId>>>,
    counter_dc: Option<i32>,
    countering: Vec<EntityId>,
    timer: Option<TimerHandle>,
    behavior: Box<dyn Move>,
}

impl Action {
    pub fn new(actor: EntityId, behavior: Box<dyn Move>, args: Args) -> Self {
        Self {
            id: ActionId::new(),
            actor,
            state: ActionState::Created,
            args,
            suspended: None,
            parts_to_use: None,
            counter_dc: None,
            countering: Vec::new(),
            timer: None,
            behavior,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn kind(&self) -> &'static str {
        self.behavior.type_tag()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn suspension(&self) -> Option<&Suspension> {
        self.suspended.as_ref()
    }

    pub fn parts_to_use(&self) -> Option<&BTreeMap<String, Vec<PartId>>> {
        self.parts_to_use.as_ref()
    }

    pub fn counter_dc(&self) -> Option<i32> {
        self.counter_dc
    }

    pub fn behavior(&self) -> &dyn Move {
        self.behavior.as_ref()
    }

    pub fn status(&self) -> String {
        self.behavior.status()
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn arm(&mut self, handle: TimerHandle) -> Option<TimerHandle> {
        self.timer.replace(handle)
    }

    pub fn take_timer(&mut self) -> Option<TimerHandle> {
        self.timer.take()
    }

    /// Remembers that `defender` holds this action in its counteract queue.
    pub fn note_countering(&mut self, defender: EntityId) {
        if !self.countering.contains(&defender) {
            self.countering.push(defender);
        }
    }

    pub fn countering(&self) -> &[EntityId] {
        &self.countering
    }

    /// `start`: move checks, part admission, then the skill check.
    pub fn begin(&mut self, ctx: &mut ActionContext<'_>) -> Transition {
        self.state = ActionState::Started;
        let args = self.args.clone();

        match self.behavior.prepare(ctx, &args) {
            Verdict::Proceed => {}
            Verdict::End => return Transition::End(EndArgs::new(args)),
            Verdict::Fail => return Transition::Fail(EndArgs::new(args)),
        }

        let mut reserved = BTreeMap::new();
        for requirement in self.behavior.required_parts() {
            let host = ctx.host();
            let mut parts = host.search_parts(self.actor, &requirement.category, false);
            if parts.len() >= requirement.count {
                parts = host.search_parts(self.actor, &requirement.category, true);
            }
            if parts.len() < requirement.count {
                debug!(
                    target: "cadence::actions",
                    actor = %self.actor,
                    action = %self.id,
                    category = %requirement.category,
                    needed = requirement.count,
                    usable = parts.len(),
                    "admission denied"
                );
                ctx.msg(&format!(
                    "You need to use {} for that.",
                    numbered_name(&requirement.category, requirement.count)
                ));
                return Transition::End(EndArgs::new(args));
            }
            reserved.insert(requirement.category, parts);
        }

        if let Some(check) = self.behavior.skill_check() {
            let host = ctx.host();
            if !host.has_skills(self.actor) {
                return Transition::End(EndArgs::new(args));
            }
            if !host.use_skill(self.actor, &check.skill, check.difficulty) {
                debug!(
                    target: "cadence::actions",
                    actor = %self.actor,
                    skill = %check.skill,
                    difficulty = check.difficulty,
                    "skill check failed"
                );
                return Transition::Fail(EndArgs::new(args));
            }
            self.counter_dc = host.skill_value(self.actor, &check.skill);
        }

        self.parts_to_use = Some(reserved);
        Transition::Do(args)
    }

    /// `do`: caps the reserved parts, then runs the move.
    pub fn perform(&mut self, ctx: &mut ActionContext<'_>, args: Args) -> Transition {
        if let Some(parts) = self.parts_to_use.as_mut() {
            for cap in self.behavior.max_used_parts() {
                if let Some(list) = parts.get_mut(&cap.category) {
                    list.truncate(cap.count);
                }
            }
        }

        match self.behavior.perform(ctx, &args) {
            Step::Succeed => Transition::Succeed(EndArgs::new(args)),
            Step::Fail => Transition::Fail(EndArgs::new(args)),
            Step::End => Transition::End(EndArgs::new(args)),
            Step::Wait { delay, then } => {
                self.state = ActionState::Waiting;
                self.suspended = Some(Suspension {
                    resume_at: time::after(ctx.now(), delay),
                    continuation: then,
                });
                ctx.host().prompt(self.actor);
                Transition::Suspend(delay)
            }
        }
    }

    pub fn succeed(&mut self, ctx: &mut ActionContext<'_>, mut end: EndArgs) -> Transition {
        self.state = ActionState::Succeeded;
        end.outcome = Outcome::Succeeded;
        self.behavior.on_succeed(ctx, &mut end);
        Transition::End(end)
    }

    pub fn fail(&mut self, ctx: &mut ActionContext<'_>, mut end: EndArgs) -> Transition {
        self.state = ActionState::Failed;
        end.outcome = Outcome::Failed;
        self.behavior.on_fail(ctx, &mut end);
        Transition::End(end)
    }

    /// `end`. Returns `None` if the action already ended, so its side
    /// effects can never fire twice. The caller cancels the timer first and
    /// advances the queue afterwards.
    pub fn finish(&mut self, ctx: &mut ActionContext<'_>, end: EndArgs) -> Option<EndReport> {
        if self.state.is_terminal() {
            warn!(
                target: "cadence::actions",
                actor = %self.actor,
                action = %self.id,
                "end requested twice; ignoring"
            );
            return None;
        }
        self.state = ActionState::Ended;
        self.suspended = None;
        self.behavior.on_end(ctx, &end);

        let actor = self.actor;
        if let Some(exp) = end.exp.filter(|exp| *exp > 0) {
            if !ctx.host().grant_exp(actor, exp) {
                debug!(target: "cadence::actions", actor = %actor, exp, "no experience accumulator");
            }
        }

        let name = self.behavior.name();
        ctx.host().on_move(actor, name, &end);

        if let Some(parts) = &self.parts_to_use {
            let host = ctx.host();
            let affected: BTreeSet<PartId> = parts
                .values()
                .flatten()
                .flat_map(|part| host.affected_parts(actor, *part))
                .collect();
            for part in affected {
                host.mark_used(actor, part, name);
            }
        }

        Some(EndReport {
            end,
            countering: std::mem::take(&mut self.countering),
        })
    }

    /// Leaves the suspension and yields the transition it was waiting for.
    pub fn wake(&mut self) -> Option<Transition> {
        let suspension = self.suspended.take()?;
        self.state = ActionState::Started;
        let end = || EndArgs::new(self.args.clone());
        Some(match suspension.continuation {
            Continuation::Do { args } => Transition::Do(args),
            Continuation::Succeed => Transition::Succeed(end()),
            Continuation::Fail => Transition::Fail(end()),
            Continuation::End => Transition::End(end()),
        })
    }

    /// Decides how a just-reloaded current action resumes at `now`.
    pub fn restore_plan(&self, now: time::Timestamp) -> RestorePlan {
        match &self.suspended {
            Some(suspension) => RestorePlan::Wait(time::until(now, suspension.resume_at)),
            None => RestorePlan::Start,
        }
    }

    /// Persisted form. `queued_args` is `None` for the current action.
    pub fn to_record(&self, queued_args: Option<Args>) -> Result<ActionRecord, PersistError> {
        Ok(ActionRecord {
            kind: self.kind().to_string(),
            state: ActionSnapshot {
                id: self.id,
                actor: self.actor,
                phase: self.state,
                args: self.args.clone(),
                suspended: self.suspended.clone(),
                parts_to_use: self.parts_to_use.clone(),
                counter_dc: self.counter_dc,
                countering: self.countering.clone(),
                data: self
                    .behavior
                    .save_state()
                    .map_err(|e| PersistError::encode("action state", e))?,
            },
            args: queued_args,
        })
    }

    pub fn from_record(record: ActionRecord, registry: &Registry) -> Result<Self, PersistError> {
        let ActionRecord { kind, state, .. } = record;
        let behavior = registry.decode_move(&kind, state.data)?;
        Ok(Self {
            id: state.id,
            actor: state.actor,
            state: state.phase,
            args: state.args,
            suspended: state.suspended,
            parts_to_use: state.parts_to_use,
            counter_dc: state.counter_dc,
            countering: state.countering,
            timer: None,
            behavior,
        })
    }
}

/// Engine-owned fields of a persisted action plus the move's own state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSnapshot {
    pub id: ActionId,
    pub actor: EntityId,
    pub phase: ActionState,
    #[serde(default)]
    pub args: Args,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended: Option<Suspension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts_to_use: Option<BTreeMap<String, Vec<PartId>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_dc: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countering: Vec<EntityId>,
    pub data: Value,
}

/// One `(type, state, args)` entry of a persisted queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: ActionSnapshot,
    /// Start arguments of a backlog entry; absent for the current action.
    pub args: Option<Args>,
}

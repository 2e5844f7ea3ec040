//! The engine's only suspension point.
//!
//! Actions and effects never sleep: they ask a [`Scheduler`] to deliver a
//! [`Task`] after a delay and return. Whoever owns the engine feeds every
//! [`Fired`] timer back into it. A fired timer is only honoured while its
//! handle is still the one armed on its target, so a cancelled or superseded
//! timer that slipped through is dropped there.
mod manual;

use std::time::Duration;

pub use manual::ManualScheduler;

use crate::command::Trigger;
use crate::effect::{EffectKey, Source};
use crate::ids::{ActionId, EntityId, TimerHandle};
use crate::time::Timestamp;

/// Work item delivered when a timer fires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Start a freshly promoted current action.
    Promote { actor: EntityId, action: ActionId },
    /// Continue a suspended action at its saved continuation.
    Continue { actor: EntityId, action: ActionId },
    /// Re-derive the wake time of a current action that was reloaded.
    Resume { actor: EntityId, action: ActionId },
    /// Advance a reloaded queue that only holds backlog.
    Advance { actor: EntityId },
    /// One tick of one source's chain on one effect.
    Tick {
        owner: EntityId,
        effect: EffectKey,
        source: Source,
    },
    /// Dispatch a trigger to the reactions subscribed to it.
    React { owner: EntityId, trigger: Trigger },
}

impl Task {
    /// The entity whose state this task touches.
    pub fn entity(&self) -> EntityId {
        match self {
            Self::Promote { actor, .. }
            | Self::Continue { actor, .. }
            | Self::Resume { actor, .. }
            | Self::Advance { actor } => *actor,
            Self::Tick { owner, .. } | Self::React { owner, .. } => *owner,
        }
    }
}

/// A timer that came due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub task: Task,
}

/// One-shot delayed delivery of [`Task`]s with cancelable handles.
///
/// Handles lose all meaning across a restart; persisted state carries
/// absolute wake times instead.
pub trait Scheduler: Send {
    /// Current time as seen by this scheduler.
    fn now(&self) -> Timestamp;

    /// Arrange for `task` to be delivered after `delay`.
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerHandle;

    /// Cancel a pending timer. Idempotent, and harmless on a handle that fired.
    fn cancel(&mut self, handle: TimerHandle);

    /// Release bookkeeping for a handle that has been delivered.
    fn retire(&mut self, _handle: TimerHandle) {}

    /// Number of timers still pending.
    fn pending(&self) -> usize;
}

//! Actions, the per-actor action queue and the per-defender counteract queue.
mod behavior;
mod context;
mod counter;
mod instance;
mod queue;
mod types;

pub use behavior::Move;
pub use context::{ActionContext, WorldView};
pub use counter::{CounterRef, CounteractQueue, Removal};
pub use instance::{Action, ActionRecord, ActionSnapshot, EndReport, RestorePlan, Transition};
pub use queue::ActionQueue;
pub use types::{
    ActionState, Args, Continuation, EndArgs, Outcome, PartRequirement, SkillCheck, Step,
    Suspension, Verdict,
};

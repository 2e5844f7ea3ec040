use std::fmt;

use super::context::ActionContext;
use super::types::{EndArgs, PartRequirement, SkillCheck, Step, Verdict};
use crate::registry::Persist;
use crate::text::with_article;

/// Behaviour of one action kind.
///
/// The engine owns the lifecycle (admission, suspension, ending and queue
/// advancement). A move supplies its requirements and reacts in its hooks.
pub trait Move: Persist + fmt::Debug + Send {
    /// Stable move name, used for display and for `on_<move>`.
    fn name(&self) -> &str;

    /// Minimum parts per category needed to start.
    fn required_parts(&self) -> Vec<PartRequirement> {
        Vec::new()
    }

    /// Cap on parts actually consumed; defaults to the requirements.
    fn max_used_parts(&self) -> Vec<PartRequirement> {
        self.required_parts()
    }

    fn skill_check(&self) -> Option<SkillCheck> {
        None
    }

    /// Move-specific checks run before admission control.
    fn prepare(&mut self, _ctx: &mut ActionContext<'_>, _args: &[String]) -> Verdict {
        Verdict::Proceed
    }

    /// The `do` phase.
    fn perform(&mut self, _ctx: &mut ActionContext<'_>, _args: &[String]) -> Step {
        Step::Succeed
    }

    fn on_succeed(&mut self, _ctx: &mut ActionContext<'_>, _end: &mut EndArgs) {}

    fn on_fail(&mut self, _ctx: &mut ActionContext<'_>, _end: &mut EndArgs) {}

    /// Runs inside `end`, before the actor's `on_<move>`.
    fn on_end(&mut self, _ctx: &mut ActionContext<'_>, _end: &EndArgs) {}

    /// One-line status shown while this action is current.
    fn status(&self) -> String {
        format!("You are doing {}.", with_article(self.name()))
    }
}

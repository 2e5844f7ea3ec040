use std::time::Duration;

use cadence_core::{
    ActionContext, ActionError, EndArgs, EntityId, Move, PartRequirement, Result, SkillCheck,
    Step, Tagged,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// An attack that gives its target a window to counteract before it lands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    target: EntityId,
    window_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skill: Option<SkillCheck>,
}

impl Strike {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(20);

    /// A strike needs someone to hit.
    pub fn new(target: Option<EntityId>) -> Result<Self> {
        let target = target.ok_or_else(|| ActionError::interrupted("strike has no target"))?;
        Ok(Self {
            target,
            window_ms: Self::DEFAULT_WINDOW.as_millis() as u64,
            skill: None,
        })
    }

    /// How long the target may counteract.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Rolls `skill` at start; the attacker's skill value becomes the
    /// difficulty the target has to beat.
    pub fn with_skill(mut self, skill: &str, difficulty: i32) -> Self {
        self.skill = Some(SkillCheck::new(skill, difficulty));
        self
    }

    pub fn target(&self) -> EntityId {
        self.target
    }
}

impl Tagged for Strike {
    const TYPE: &'static str = "strike";
}

impl Move for Strike {
    fn name(&self) -> &str {
        "strike"
    }

    fn required_parts(&self) -> Vec<PartRequirement> {
        vec![PartRequirement::new("hand", 1)]
    }

    fn skill_check(&self) -> Option<SkillCheck> {
        self.skill.clone()
    }

    fn perform(&mut self, ctx: &mut ActionContext<'_>, _args: &[String]) -> Step {
        let actor = ctx.actor();
        let target = ctx.host().display_name(self.target, actor);
        ctx.msg(&format!("You swing at {target}."));
        ctx.open_counter_window(self.target);
        Step::wait(Duration::from_millis(self.window_ms))
    }

    fn on_succeed(&mut self, ctx: &mut ActionContext<'_>, end: &mut EndArgs) {
        let actor = ctx.actor();
        let attacker = ctx.host().display_name(actor, self.target);
        ctx.host()
            .msg(self.target, &format!("You are struck by {attacker}."));
        ctx.trigger(self.target, "struck", json!({ "attacker": actor }));
        end.exp = Some(1);
    }

    fn on_fail(&mut self, ctx: &mut ActionContext<'_>, _end: &mut EndArgs) {
        ctx.msg("Your strike misses.");
    }
}

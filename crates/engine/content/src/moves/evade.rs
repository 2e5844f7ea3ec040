use cadence_core::{ActionContext, Move, Outcome, Step, Tagged, Verdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Answers the current counter opportunity.
///
/// Rolls `skill` against the attacker's `counter_dc` (zero when the attack
/// set none). Either way the opportunity is used up; on success the attack
/// fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evade {
    skill: String,
}

impl Evade {
    pub const DEFAULT_SKILL: &'static str = "evasion";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skill(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
        }
    }
}

impl Default for Evade {
    fn default() -> Self {
        Self {
            skill: Self::DEFAULT_SKILL.to_string(),
        }
    }
}

impl Tagged for Evade {
    const TYPE: &'static str = "evade";
}

impl Move for Evade {
    fn name(&self) -> &str {
        "evade"
    }

    fn prepare(&mut self, ctx: &mut ActionContext<'_>, _args: &[String]) -> Verdict {
        if ctx.counter_current().is_none() {
            ctx.msg("There is nothing to evade.");
            return Verdict::End;
        }
        Verdict::Proceed
    }

    fn perform(&mut self, ctx: &mut ActionContext<'_>, _args: &[String]) -> Step {
        let Some(counter) = ctx.counter_current() else {
            return Step::End;
        };
        let actor = ctx.actor();
        let difficulty = ctx.counter_dc(&counter).unwrap_or(0);
        let evaded = ctx.host().use_skill(actor, &self.skill, difficulty);
        debug!(
            target: "cadence::counter",
            defender = %actor,
            attacker = %counter.attacker,
            difficulty,
            evaded,
            "evade rolled"
        );

        let by = ctx.host().display_name(counter.attacker, actor);
        if evaded {
            ctx.msg(&format!("You evade the {} by {by}.", counter.name));
            ctx.resolve_counter(&counter, Outcome::Failed);
            Step::Succeed
        } else {
            ctx.msg(&format!("You fail to evade the {} by {by}.", counter.name));
            ctx.close_counter(actor, &counter);
            Step::Fail
        }
    }
}

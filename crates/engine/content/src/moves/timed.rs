use std::time::Duration;

use cadence_core::{ActionContext, EndArgs, Move, Step, Tagged};
use serde::{Deserialize, Serialize};

/// A channelled action: runs `do` once per round, waiting `interval_ms`
/// between rounds, and succeeds after the last one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timed {
    name: String,
    rounds: u32,
    interval_ms: u64,
    #[serde(default)]
    completed: u32,
    #[serde(default)]
    exp: u32,
}

impl Timed {
    pub fn new(name: impl Into<String>, rounds: u32, interval: Duration) -> Self {
        Self {
            name: name.into(),
            rounds,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            completed: 0,
            exp: 0,
        }
    }

    /// Experience credited when the last round completes.
    pub fn with_exp(mut self, exp: u32) -> Self {
        self.exp = exp;
        self
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Tagged for Timed {
    const TYPE: &'static str = "timed";
}

impl Move for Timed {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, ctx: &mut ActionContext<'_>, args: &[String]) -> Step {
        if self.completed >= self.rounds {
            return Step::Succeed;
        }
        self.completed += 1;
        if self.completed > 1 {
            ctx.msg(&format!("You keep {}.", self.name));
        }
        Step::repeat(self.interval(), args.to_vec())
    }

    fn on_succeed(&mut self, ctx: &mut ActionContext<'_>, end: &mut EndArgs) {
        ctx.msg(&format!("You finish {}.", self.name));
        if self.exp > 0 {
            end.exp = Some(self.exp);
        }
    }

    fn status(&self) -> String {
        format!(
            "You are {} ({}/{}).",
            self.name, self.completed, self.rounds
        )
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Arguments an action was started or continued with.
pub type Args = Vec<String>;

/// Lifecycle phase of an action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionState {
    #[default]
    Created,
    Started,
    Waiting,
    Succeeded,
    Failed,
    Ended,
}

impl ActionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// Which phase a suspended action re-enters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Continuation {
    Do { args: Args },
    Succeed,
    Fail,
    End,
}

/// A pending wake-up: absolute time plus the phase to resume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub resume_at: Timestamp,
    pub continuation: Continuation,
}

/// How a move's `do` phase concluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail,
    End,
    /// Suspend for `delay`, then continue with `then`.
    Wait { delay: Duration, then: Continuation },
}

impl Step {
    /// Wait, then succeed.
    pub fn wait(delay: Duration) -> Self {
        Self::Wait {
            delay,
            then: Continuation::Succeed,
        }
    }

    /// Wait, then run `do` again with `args`.
    pub fn repeat(delay: Duration, args: Args) -> Self {
        Self::Wait {
            delay,
            then: Continuation::Do { args },
        }
    }
}

/// Verdict of a move's own checks in `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    End,
    Fail,
}

/// How an action ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
    /// Ended without resolving: admission denied, overridden or cleared.
    #[default]
    Ended,
}

/// Arguments `end` receives; forwarded verbatim to `on_<move>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndArgs {
    pub args: Args,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u32>,
    pub outcome: Outcome,
}

impl EndArgs {
    pub fn new(args: Args) -> Self {
        Self {
            args,
            ..Self::default()
        }
    }

    pub fn with_exp(mut self, exp: u32) -> Self {
        self.exp = Some(exp);
        self
    }
}

/// A body-part requirement: at least (or at most, for caps) `count` parts of `category`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRequirement {
    pub category: String,
    pub count: usize,
}

impl PartRequirement {
    pub fn new(category: impl Into<String>, count: usize) -> Self {
        Self {
            category: category.into(),
            count,
        }
    }
}

/// A skill dependency checked in `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCheck {
    pub skill: String,
    pub difficulty: i32,
}

impl SkillCheck {
    pub fn new(skill: impl Into<String>, difficulty: i32) -> Self {
        Self {
            skill: skill.into(),
            difficulty,
        }
    }
}

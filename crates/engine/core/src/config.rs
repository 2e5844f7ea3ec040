use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine timing parameters.
///
/// Durations are carried as milliseconds so configuration files stay plain
/// integers; use the accessor methods to get [`Duration`]s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between `next()` promoting an action and its `start`.
    pub promotion_delay_ms: u64,
    /// Delay before a reloaded current action (or a backlog-only queue) resumes.
    pub resume_delay_ms: u64,
    /// Delay before each source of a reloaded ticking effect resumes its chain.
    pub effect_resume_delay_ms: u64,
    /// Delay before a fired trigger is dispatched to its reactions.
    pub reaction_delay_ms: u64,
}

impl EngineConfig {
    pub const DEFAULT_PROMOTION_DELAY_MS: u64 = 10;
    pub const DEFAULT_RESUME_DELAY_MS: u64 = 10;
    pub const DEFAULT_EFFECT_RESUME_DELAY_MS: u64 = 1_000;
    pub const DEFAULT_REACTION_DELAY_MS: u64 = 100;

    pub fn new() -> Self {
        Self {
            promotion_delay_ms: Self::DEFAULT_PROMOTION_DELAY_MS,
            resume_delay_ms: Self::DEFAULT_RESUME_DELAY_MS,
            effect_resume_delay_ms: Self::DEFAULT_EFFECT_RESUME_DELAY_MS,
            reaction_delay_ms: Self::DEFAULT_REACTION_DELAY_MS,
        }
    }

    pub fn promotion_delay(&self) -> Duration {
        Duration::from_millis(self.promotion_delay_ms.max(1))
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn effect_resume_delay(&self) -> Duration {
        Duration::from_millis(self.effect_resume_delay_ms)
    }

    pub fn reaction_delay(&self) -> Duration {
        Duration::from_millis(self.reaction_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

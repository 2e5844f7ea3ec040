//! Trigger-keyed reaction dispatch.
//!
//! Actions and effects fire named triggers (`on_<move>`, `struck`, ...) and
//! never wait for them. The engine delays each trigger by the configured
//! reaction delay and then hands it to the [`ReactionRegistry`], which runs
//! every subscribed [`Reaction`] in priority order.
//!
//! # Error Handling
//!
//! Reaction failures never reach whoever fired the trigger:
//! - [`ReactionError::Detached`]: the handler no longer resolves (its object
//!   is gone); the registration is removed and dispatch continues
//! - [`ReactionError::Failed`]: logged according to the reaction's
//!   criticality, and dispatch continues

mod registry;

pub use registry::{DispatchReport, ReactionRegistry};

use cadence_core::{EntityId, Trigger};

/// How loudly a failing reaction is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCriticality {
    /// Failure is logged as an error (default).
    Important,
    /// Failure is logged at debug level.
    Optional,
}

/// Errors a reaction may return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactionError {
    #[error("reaction target is gone: {0}")]
    Detached(String),

    #[error("reaction failed: {0}")]
    Failed(String),
}

/// What a reaction sees.
#[derive(Debug, Clone, Copy)]
pub struct ReactionContext<'a> {
    /// Entity the trigger was fired on.
    pub owner: EntityId,
    pub trigger: &'a Trigger,
}

/// A handler subscribed to a trigger key.
pub trait Reaction: Send + Sync {
    /// Returns a human-readable name (used in logging and debugging).
    fn name(&self) -> &'static str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> ReactionCriticality {
        ReactionCriticality::Important
    }

    fn react(&self, ctx: &ReactionContext<'_>) -> Result<(), ReactionError>;
}

/// Adapts a closure into a [`Reaction`].
pub struct FnReaction<F> {
    name: &'static str,
    priority: i32,
    handler: F,
}

impl<F> FnReaction<F>
where
    F: Fn(&ReactionContext<'_>) -> Result<(), ReactionError> + Send + Sync,
{
    pub fn new(name: &'static str, handler: F) -> Self {
        Self {
            name,
            priority: 0,
            handler,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<F> Reaction for FnReaction<F>
where
    F: Fn(&ReactionContext<'_>) -> Result<(), ReactionError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn react(&self, ctx: &ReactionContext<'_>) -> Result<(), ReactionError> {
        (self.handler)(ctx)
    }
}

//! Stacked, sourced effects and their per-owner registry.
//!
//! Stack arithmetic lives in [`stacks`] and is free of side effects. An
//! [`EffectInstance`] pairs those counts with a boxed [`Effect`] behaviour and
//! runs its hooks; the runtime decides when to negate, tick and persist.
mod area;
mod behavior;
mod context;
mod handler;
mod instance;
pub mod stacks;

pub use area::AreaEffect;
pub use behavior::Effect;
pub use context::EffectContext;
pub use handler::{EffectQuery, EffectsHandler};
pub use instance::{AddOptions, EffectInstance, EffectKey, EffectRecord, TickDecision};
pub use stacks::{
    Offset, RemoveSpec, Source, SourceFilter, SourceParseError, StackChange, StackCount, Sources,
    offset,
};

#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;

use super::context::EffectContext;
use super::stacks::{Source, StackChange};
use crate::registry::Persist;

/// Behaviour of one effect kind.
///
/// Stack accounting, negation and tick scheduling belong to the engine; an
/// effect only declares its parameters and reacts through the hooks below.
pub trait Effect: Persist + fmt::Debug + Send {
    /// Tick period for new instances. Zero means the effect never ticks.
    fn duration(&self) -> Duration {
        Duration::ZERO
    }

    /// Type tags of effects this one cancels stack-for-stack when added.
    fn negates(&self) -> &[&'static str] {
        &[]
    }

    /// Runs once, when the instance is first registered on its owner.
    fn at_create(&mut self, _ctx: &mut EffectContext<'_>, _change: &StackChange) {}

    /// Runs on every add, after the stacks were credited.
    fn at_add(&mut self, _ctx: &mut EffectContext<'_>, _change: &StackChange) {}

    /// Runs once per source that lost stacks, before the zero-stack check.
    fn at_remove(&mut self, _ctx: &mut EffectContext<'_>, _change: &StackChange) {}

    /// Runs once when the instance is deleted.
    fn at_delete(&mut self, _ctx: &mut EffectContext<'_>) {}

    /// One tick of `source`'s chain.
    fn at_tick(&mut self, _ctx: &mut EffectContext<'_>, _source: &Source) {}
}

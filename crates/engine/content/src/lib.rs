//! Reference content built on the cadence engine.
//!
//! This crate houses moves and effects that exercise the engine end to end,
//! plus loaders for configuration files:
//! - [`Timed`]: a channelled action that repeats its `do` phase
//! - [`Strike`] and [`Evade`]: an attack with a counter window and its answer
//! - [`TagEffect`]: a status tag held for as long as the effect lives
//! - [`ConfigLoader`]: engine timing from TOML
//!
//! [`register_defaults`] makes every type here (and the core `AreaEffect`)
//! loadable from persisted records.

pub mod effects;
pub mod moves;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use effects::TagEffect;
pub use moves::{Evade, Strike, Timed};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult};

use cadence_core::{AreaEffect, Registry};

/// Registers every move and effect this crate provides.
pub fn register_defaults(registry: &mut Registry) -> &mut Registry {
    registry
        .register_move::<Timed>()
        .register_move::<Strike>()
        .register_move::<Evade>()
        .register_effect::<TagEffect>()
        .register_effect::<AreaEffect>()
}

/// A registry holding [`register_defaults`].
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    register_defaults(&mut registry);
    registry
}

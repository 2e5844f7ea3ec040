//! Reference effects.
mod tag;

pub use tag::TagEffect;

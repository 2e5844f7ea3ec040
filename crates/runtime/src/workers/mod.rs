//! Worker tasks that back the runtime orchestration.
//!
//! The engine worker owns the [`Engine`](crate::engine::Engine) and is the
//! only task that touches it.

mod engine;

pub use engine::{EngineCommand, EngineWorker};

//! In-memory repository implementations.
mod state;

pub use state::InMemoryStateRepo;

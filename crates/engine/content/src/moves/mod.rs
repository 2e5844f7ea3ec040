//! Reference moves.
mod evade;
mod strike;
mod timed;

pub use evade::Evade;
pub use strike::Strike;
pub use timed::Timed;

//! Absolute wall-clock time and the arithmetic the engine needs on it.
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Absolute instant; persisted wake times use this representation.
pub type Timestamp = DateTime<Utc>;

/// Returns `now + delay`, saturating at the largest representable instant.
pub fn after(now: Timestamp, delay: Duration) -> Timestamp {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left until `at`. Instants in the past yield zero, never a negative delay.
pub fn until(now: Timestamp, at: Timestamp) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Time elapsed since `since`, clamped to zero when `since` lies in the future.
pub fn since(now: Timestamp, since: Timestamp) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

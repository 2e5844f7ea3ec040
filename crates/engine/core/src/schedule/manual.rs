use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::DateTime;

use super::{Fired, Scheduler, Task};
use crate::ids::TimerHandle;
use crate::time::{self, Timestamp};

/// Virtual-time scheduler.
///
/// Time only moves when the owner pops due timers, which makes every timing
/// property reproducible without sleeping. Timers due at the same instant
/// fire in the order they were scheduled.
#[derive(Debug)]
pub struct ManualScheduler {
    now: Timestamp,
    next_handle: u64,
    queue: BTreeMap<(Timestamp, u64), Task>,
    due: HashMap<u64, Timestamp>,
}

impl ManualScheduler {
    /// Starts the virtual clock at `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now: start,
            next_handle: 0,
            queue: BTreeMap::new(),
            due: HashMap::new(),
        }
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Pops the earliest timer due at or before `deadline`, moving the clock
    /// forward to its due time.
    pub fn pop_due(&mut self, deadline: Timestamp) -> Option<Fired> {
        let (&(at, id), _) = self.queue.iter().next()?;
        if at > deadline {
            return None;
        }
        let task = self.queue.remove(&(at, id))?;
        self.due.remove(&id);
        if at > self.now {
            self.now = at;
        }
        Some(Fired {
            handle: TimerHandle(id),
            task,
        })
    }

    /// Moves the clock forward without firing anything.
    pub fn set_now(&mut self, now: Timestamp) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Tasks still pending, earliest first.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.queue.values()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::starting_at(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default())
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn schedule(&mut self, delay: Duration, task: Task) -> TimerHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        let at = time::after(self.now, delay);
        self.queue.insert((at, id), task);
        self.due.insert(id, at);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(at) = self.due.remove(&handle.0) {
            self.queue.remove(&(at, handle.0));
        }
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EntityId;

    fn advance(actor: u32) -> Task {
        Task::Advance {
            actor: EntityId(actor),
        }
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut sched = ManualScheduler::default();
        let start = sched.now();
        sched.schedule(Duration::from_secs(2), advance(1));
        sched.schedule(Duration::from_secs(1), advance(2));
        sched.schedule(Duration::from_secs(1), advance(3));

        let deadline = time::after(start, Duration::from_secs(5));
        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(deadline))
            .map(|fired| fired.task.entity().0)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(sched.now(), time::after(start, Duration::from_secs(2)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sched = ManualScheduler::default();
        let handle = sched.schedule(Duration::from_secs(1), advance(1));
        sched.cancel(handle);
        sched.cancel(handle);
        assert_eq!(sched.pending(), 0);

        let deadline = time::after(sched.now(), Duration::from_secs(10));
        assert!(sched.pop_due(deadline).is_none());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut sched = ManualScheduler::default();
        let first = sched.schedule(Duration::ZERO, advance(1));
        let deadline = sched.now();
        let fired = sched.pop_due(deadline).unwrap();
        assert_eq!(fired.handle, first);

        let second = sched.schedule(Duration::ZERO, advance(1));
        assert_ne!(first, second);
        // cancelling the fired handle must not touch the new timer
        sched.cancel(first);
        assert_eq!(sched.pending(), 1);
    }
}

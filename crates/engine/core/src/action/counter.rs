use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, EntityId};

/// Reference to another actor's in-flight action that can be countered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterRef {
    pub attacker: EntityId,
    pub action: ActionId,
    /// Type tag of the attacking move.
    pub kind: String,
    /// Move name, for messages.
    pub name: String,
}

/// Effect of a removal on the queue head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub removed: bool,
    pub was_current: bool,
}

/// Per-defender FIFO of counter opportunities, at most one per attacker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounteractQueue {
    backlog: VecDeque<CounterRef>,
}

impl CounteractQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CounterRef> {
        self.backlog.front()
    }

    /// Replaces any entry from the same attacker and appends `counter`.
    /// Returns true when the head of the queue changed.
    pub fn add(&mut self, counter: CounterRef) -> bool {
        let before = self.current().map(|c| c.action);
        self.backlog.retain(|c| c.attacker != counter.attacker);
        self.backlog.push_back(counter);
        before != self.current().map(|c| c.action)
    }

    /// Removes the entry for `action` by `attacker`. Idempotent.
    pub fn remove(&mut self, attacker: EntityId, action: ActionId) -> Removal {
        let Some(index) = self
            .backlog
            .iter()
            .position(|c| c.attacker == attacker && c.action == action)
        else {
            return Removal::default();
        };
        self.backlog.remove(index);
        Removal {
            removed: true,
            was_current: index == 0,
        }
    }

    /// Keeps only the entries `keep` accepts.
    pub fn retain(&mut self, keep: impl FnMut(&CounterRef) -> bool) {
        self.backlog.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CounterRef> {
        self.backlog.iter()
    }

    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    pub fn to_records(&self) -> Vec<CounterRef> {
        self.backlog.iter().cloned().collect()
    }

    pub fn from_records(records: Vec<CounterRef>) -> Self {
        let mut queue = Self::new();
        for counter in records {
            queue.add(counter);
        }
        queue
    }
}

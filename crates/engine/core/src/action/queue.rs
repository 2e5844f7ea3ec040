use std::collections::VecDeque;

use tracing::warn;

use super::instance::{Action, ActionRecord};
use crate::error::PersistError;
use crate::ids::{ActionId, TimerHandle};
use crate::registry::Registry;

/// Per-actor scheduler state: at most one current action plus a backlog.
///
/// This type only holds the data. Promotion timing, hooks and persistence
/// are driven by the runtime engine.
#[derive(Debug, Default)]
pub struct ActionQueue {
    current: Option<Action>,
    backlog: VecDeque<Action>,
    /// Timer that will start the current action, or resume it after a reload.
    promotion: Option<TimerHandle>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Action> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Action> {
        self.current.as_mut()
    }

    pub fn is_current(&self, id: ActionId) -> bool {
        self.current.as_ref().is_some_and(|a| a.id() == id)
    }

    /// Checks the current action out of its slot.
    pub fn take_current(&mut self) -> Option<Action> {
        self.current.take()
    }

    /// Puts an action into the current slot, returning whatever was there.
    pub fn set_current(&mut self, action: Action) -> Option<Action> {
        self.current.replace(action)
    }

    pub fn backlog(&self) -> impl Iterator<Item = &Action> {
        self.backlog.iter()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn push_back(&mut self, action: Action) {
        self.backlog.push_back(action);
    }

    pub fn push_front(&mut self, action: Action) {
        self.backlog.push_front(action);
    }

    pub fn pop_front(&mut self) -> Option<Action> {
        self.backlog.pop_front()
    }

    pub fn clear_backlog(&mut self) -> Vec<Action> {
        self.backlog.drain(..).collect()
    }

    pub fn promotion(&self) -> Option<TimerHandle> {
        self.promotion
    }

    pub fn set_promotion(&mut self, handle: TimerHandle) -> Option<TimerHandle> {
        self.promotion.replace(handle)
    }

    pub fn take_promotion(&mut self) -> Option<TimerHandle> {
        self.promotion.take()
    }

    /// Every timer this queue is waiting on.
    pub fn timers(&self) -> Vec<TimerHandle> {
        self.promotion
            .into_iter()
            .chain(self.current.as_ref().and_then(Action::timer))
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.backlog.is_empty()
    }

    /// Current status followed by the backlog, the first slot shown as "Next".
    pub fn display(&self) -> String {
        let mut lines = Vec::with_capacity(self.backlog.len() + 1);
        if let Some(current) = &self.current {
            lines.push(current.status());
        }
        for (index, action) in self.backlog.iter().enumerate() {
            let label = if index == 0 {
                "Next".to_string()
            } else {
                index.to_string()
            };
            let line = format!("{label}: {} {}", action.name(), action.args().join(" "));
            lines.push(line.trim_end().to_string());
        }
        if lines.is_empty() {
            return "You are not planning to do anything.".to_string();
        }
        lines.join("\n")
    }

    pub fn to_records(&self) -> Result<Vec<ActionRecord>, PersistError> {
        let mut records = Vec::with_capacity(self.backlog.len() + 1);
        if let Some(current) = &self.current {
            records.push(current.to_record(None)?);
        }
        for action in &self.backlog {
            records.push(action.to_record(Some(action.args().to_vec()))?);
        }
        Ok(records)
    }

    /// Rebuilds a queue. A leading record without start arguments was the
    /// current action; everything else is backlog. Records that no longer
    /// decode are skipped.
    pub fn from_records(records: Vec<ActionRecord>, registry: &Registry) -> Self {
        let mut queue = Self::new();
        for (index, record) in records.into_iter().enumerate() {
            let was_current = index == 0 && record.args.is_none();
            let kind = record.kind.clone();
            let action = match Action::from_record(record, registry) {
                Ok(action) => action,
                Err(e) => {
                    warn!(target: "cadence::persist", move_type = %kind, error = %e, "skipping unreadable action");
                    continue;
                }
            };
            if was_current {
                queue.current = Some(action);
            } else {
                queue.backlog.push_back(action);
            }
        }
        queue
    }
}

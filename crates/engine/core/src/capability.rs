//! Capability traits a host world implements so actions and effects can
//! reach actors without knowing their concrete types.
//!
//! Every method is keyed by [`EntityId`], which keeps the traits object safe
//! and lets a single host value serve every actor it manages.

use serde::{Deserialize, Serialize};

use crate::action::{CounterRef, EndArgs};
use crate::ids::{EntityId, PartId};

/// Player-facing notifications.
pub trait MessageSink {
    /// Sends `text` to `to`.
    fn msg(&mut self, to: EntityId, text: &str);

    /// Asks the client of `actor` to refresh its status display.
    fn prompt(&mut self, actor: EntityId);

    /// Name of `entity` as seen by `looker`.
    fn display_name(&self, entity: EntityId, _looker: EntityId) -> String {
        entity.to_string()
    }
}

/// Body-part queries used for admission control.
pub trait PartInventory {
    /// Parts of `category` belonging to `actor`, optionally only usable ones.
    fn search_parts(&self, actor: EntityId, category: &str, usable_only: bool) -> Vec<PartId>;

    /// Parts causally affected when `part` is used, including `part` itself.
    fn affected_parts(&self, _actor: EntityId, part: PartId) -> Vec<PartId> {
        vec![part]
    }

    /// Records that `part` was used for `mv`.
    fn mark_used(&mut self, actor: EntityId, part: PartId, mv: &str);
}

/// Optional skill surface.
pub trait SkillChecker {
    /// Whether `actor` exposes skills at all.
    fn has_skills(&self, actor: EntityId) -> bool;

    /// Rolls `skill` against `difficulty`; true on success.
    fn use_skill(&mut self, actor: EntityId, skill: &str, difficulty: i32) -> bool;

    /// Current value of `skill`, if the actor has it.
    fn skill_value(&self, actor: EntityId, skill: &str) -> Option<i32>;
}

/// Experience accumulator.
pub trait Progression {
    /// Credits `exp`; returns false when the actor has no accumulator.
    fn grant_exp(&mut self, actor: EntityId, exp: u32) -> bool;
}

/// Per-move reaction hooks on the actor itself.
pub trait MoveReactions {
    /// `on_<move>`: runs exactly once when an action of `mv` ends.
    fn on_move(&mut self, actor: EntityId, mv: &str, end: &EndArgs);

    /// A new counter opportunity became current for `defender`.
    fn on_counter_opportunity(&mut self, _defender: EntityId, _counter: &CounterRef) {}
}

/// A status tag, optionally scoped to a category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }

    pub fn in_category(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
        }
    }
}

/// Containment graph and status tags.
pub trait Containment {
    /// Entities directly inside `entity`.
    fn contents(&self, entity: EntityId) -> Vec<EntityId>;

    fn has_tag(&self, entity: EntityId, tag: &Tag) -> bool;

    fn add_tag(&mut self, entity: EntityId, tag: &Tag);

    fn remove_tag(&mut self, entity: EntityId, tag: &Tag);
}

/// Everything the engine needs from the world it runs in.
pub trait Host:
    MessageSink + PartInventory + SkillChecker + Progression + MoveReactions + Containment + Send
{
}

impl<T> Host for T where
    T: MessageSink + PartInventory + SkillChecker + Progression + MoveReactions + Containment + Send
{
}

//! In-memory host used by unit tests.
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::action::{
    ActionContext, CounterRef, EndArgs, Move, PartRequirement, SkillCheck, Step, Verdict,
    WorldView,
};
use crate::capability::{
    Containment, MessageSink, MoveReactions, PartInventory, Progression, SkillChecker, Tag,
};
use crate::ids::{ActionId, EntityId, PartId};
use crate::registry::Tagged;

#[derive(Debug, Default)]
pub struct TestHost {
    pub messages: Vec<(EntityId, String)>,
    pub prompts: usize,
    /// (part, usable) per actor and category.
    pub parts: HashMap<(EntityId, String), Vec<(PartId, bool)>>,
    pub linked: HashMap<PartId, Vec<PartId>>,
    pub used: Vec<(PartId, String)>,
    pub skills: HashMap<EntityId, HashMap<String, i32>>,
    pub exp: HashMap<EntityId, u32>,
    pub ended: Vec<(EntityId, String, EndArgs)>,
    pub contents: HashMap<EntityId, Vec<EntityId>>,
    pub tags: HashSet<(EntityId, Tag)>,
}

impl TestHost {
    pub fn give_parts(&mut self, actor: EntityId, category: &str, parts: &[(u64, bool)]) {
        self.parts.insert(
            (actor, category.to_string()),
            parts.iter().map(|(id, usable)| (PartId(*id), *usable)).collect(),
        );
    }

    pub fn give_skill(&mut self, actor: EntityId, skill: &str, value: i32) {
        self.skills
            .entry(actor)
            .or_default()
            .insert(skill.to_string(), value);
    }

    pub fn said(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, text)| text.contains(needle))
    }
}

impl MessageSink for TestHost {
    fn msg(&mut self, to: EntityId, text: &str) {
        self.messages.push((to, text.to_string()));
    }

    fn prompt(&mut self, _actor: EntityId) {
        self.prompts += 1;
    }
}

impl PartInventory for TestHost {
    fn search_parts(&self, actor: EntityId, category: &str, usable_only: bool) -> Vec<PartId> {
        self.parts
            .get(&(actor, category.to_string()))
            .map(|parts| {
                parts
                    .iter()
                    .filter(|(_, usable)| *usable || !usable_only)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn affected_parts(&self, _actor: EntityId, part: PartId) -> Vec<PartId> {
        let mut parts = vec![part];
        parts.extend(self.linked.get(&part).into_iter().flatten().copied());
        parts
    }

    fn mark_used(&mut self, _actor: EntityId, part: PartId, mv: &str) {
        self.used.push((part, mv.to_string()));
    }
}

impl SkillChecker for TestHost {
    fn has_skills(&self, actor: EntityId) -> bool {
        self.skills.contains_key(&actor)
    }

    fn use_skill(&mut self, actor: EntityId, skill: &str, difficulty: i32) -> bool {
        self.skill_value(actor, skill)
            .is_some_and(|value| value >= difficulty)
    }

    fn skill_value(&self, actor: EntityId, skill: &str) -> Option<i32> {
        self.skills.get(&actor)?.get(skill).copied()
    }
}

impl Progression for TestHost {
    fn grant_exp(&mut self, actor: EntityId, exp: u32) -> bool {
        *self.exp.entry(actor).or_default() += exp;
        true
    }
}

impl MoveReactions for TestHost {
    fn on_move(&mut self, actor: EntityId, mv: &str, end: &EndArgs) {
        self.ended.push((actor, mv.to_string(), end.clone()));
    }
}

impl Containment for TestHost {
    fn contents(&self, entity: EntityId) -> Vec<EntityId> {
        self.contents.get(&entity).cloned().unwrap_or_default()
    }

    fn has_tag(&self, entity: EntityId, tag: &Tag) -> bool {
        self.tags.contains(&(entity, tag.clone()))
    }

    fn add_tag(&mut self, entity: EntityId, tag: &Tag) {
        self.tags.insert((entity, tag.clone()));
    }

    fn remove_tag(&mut self, entity: EntityId, tag: &Tag) {
        self.tags.remove(&(entity, tag.clone()));
    }
}

/// World with no other queues.
pub struct NoWorld;

impl WorldView for NoWorld {
    fn counter_current(&self, _defender: EntityId) -> Option<CounterRef> {
        None
    }

    fn counter_dc(&self, _actor: EntityId, _action: ActionId) -> Option<i32> {
        None
    }
}

/// Configurable move for exercising the state machine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Probe {
    pub needs: Vec<PartRequirement>,
    pub caps: Option<Vec<PartRequirement>>,
    pub skill: Option<SkillCheck>,
    pub wait_ms: Option<u64>,
    pub exp: u32,
    #[serde(skip)]
    pub verdict: Option<Verdict>,
}

impl Tagged for Probe {
    const TYPE: &'static str = "probe";
}

impl Move for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn required_parts(&self) -> Vec<PartRequirement> {
        self.needs.clone()
    }

    fn max_used_parts(&self) -> Vec<PartRequirement> {
        self.caps.clone().unwrap_or_else(|| self.needs.clone())
    }

    fn skill_check(&self) -> Option<SkillCheck> {
        self.skill.clone()
    }

    fn prepare(&mut self, ctx: &mut ActionContext<'_>, _args: &[String]) -> Verdict {
        match self.verdict {
            Some(verdict) => {
                ctx.msg("You think better of it.");
                verdict
            }
            None => Verdict::Proceed,
        }
    }

    fn perform(&mut self, _ctx: &mut ActionContext<'_>, _args: &[String]) -> Step {
        match self.wait_ms {
            Some(ms) => Step::wait(std::time::Duration::from_millis(ms)),
            None => Step::Succeed,
        }
    }

    fn on_succeed(&mut self, _ctx: &mut ActionContext<'_>, end: &mut EndArgs) {
        if self.exp > 0 {
            end.exp = Some(self.exp);
        }
    }
}

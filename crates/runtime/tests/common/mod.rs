//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use cadence_core::time;
use cadence_core::{
    ActionContext, ActionId, Containment, CounterRef, Effect, EffectContext, EndArgs,
    EngineConfig, EntityId, ManualScheduler, MessageSink, Move, MoveReactions, PartId,
    PartInventory, PartRequirement, Progression, Registry, SkillCheck, SkillChecker, Source,
    StackChange, Step, Tag, Tagged,
};
use cadence_runtime::{Engine, InMemoryStateRepo, RepositoryError, StateRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ALICE: EntityId = EntityId(1);
pub const BOB: EntityId = EntityId(2);
pub const CAROL: EntityId = EntityId(3);

pub type TestEngine = Engine<TestHost, ManualScheduler>;

/// Host recording everything the engine asks of it.
#[derive(Debug, Default)]
pub struct TestHost {
    pub messages: Vec<(EntityId, String)>,
    pub prompts: HashMap<EntityId, usize>,
    pub parts: HashMap<(EntityId, String), Vec<(PartId, bool)>>,
    pub used: Vec<(EntityId, PartId, String)>,
    pub skills: HashMap<EntityId, HashMap<String, i32>>,
    pub exp: HashMap<EntityId, u32>,
    pub moves: Vec<(EntityId, String, EndArgs)>,
    pub opportunities: Vec<(EntityId, CounterRef)>,
    pub contents: HashMap<EntityId, Vec<EntityId>>,
    pub tags: HashSet<(EntityId, Tag)>,
}

impl TestHost {
    pub fn give_hands(&mut self, actor: EntityId, hands: &[(u64, bool)]) {
        self.parts.insert(
            (actor, "hand".to_string()),
            hands.iter().map(|(id, usable)| (PartId(*id), *usable)).collect(),
        );
    }

    pub fn give_skill(&mut self, actor: EntityId, skill: &str, value: i32) {
        self.skills
            .entry(actor)
            .or_default()
            .insert(skill.to_string(), value);
    }

    /// Messages sent to `to`, oldest first.
    pub fn messages_to(&self, to: EntityId) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(who, _)| *who == to)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn count_said(&self, needle: &str) -> usize {
        self.messages
            .iter()
            .filter(|(_, text)| text.contains(needle))
            .count()
    }

    pub fn moves_of(&self, actor: EntityId) -> Vec<&EndArgs> {
        self.moves
            .iter()
            .filter(|(who, _, _)| *who == actor)
            .map(|(_, _, end)| end)
            .collect()
    }
}

impl MessageSink for TestHost {
    fn msg(&mut self, to: EntityId, text: &str) {
        self.messages.push((to, text.to_string()));
    }

    fn prompt(&mut self, actor: EntityId) {
        *self.prompts.entry(actor).or_default() += 1;
    }

    fn display_name(&self, entity: EntityId, _looker: EntityId) -> String {
        match entity {
            ALICE => "Alice".to_string(),
            BOB => "Bob".to_string(),
            CAROL => "Carol".to_string(),
            other => other.to_string(),
        }
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

    fn mark_used(&mut self, actor: EntityId, part: PartId, mv: &str) {
        self.used.push((actor, part, mv.to_string()));
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
        self.moves.push((actor, mv.to_string(), end.clone()));
    }

    fn on_counter_opportunity(&mut self, defender: EntityId, counter: &CounterRef) {
        self.opportunities.push((defender, counter.clone()));
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

/// A plain move: optional part and skill requirements, an optional wait,
/// then success.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Chore {
    pub hands: usize,
    pub skill: Option<SkillCheck>,
    pub wait_ms: Option<u64>,
    pub exp: u32,
}

impl Chore {
    pub fn quick() -> Self {
        Self::default()
    }

    pub fn waiting(ms: u64) -> Self {
        Self {
            wait_ms: Some(ms),
            ..Self::default()
        }
    }

    pub fn two_handed() -> Self {
        Self {
            hands: 2,
            ..Self::default()
        }
    }
}

impl Tagged for Chore {
    const TYPE: &'static str = "chore";
}

impl Move for Chore {
    fn name(&self) -> &str {
        "chore"
    }

    fn required_parts(&self) -> Vec<PartRequirement> {
        if self.hands == 0 {
            Vec::new()
        } else {
            vec![PartRequirement::new("hand", self.hands)]
        }
    }

    fn skill_check(&self) -> Option<SkillCheck> {
        self.skill.clone()
    }

    fn perform(&mut self, _ctx: &mut ActionContext<'_>, _args: &[String]) -> Step {
        match self.wait_ms {
            Some(ms) => Step::wait(Duration::from_millis(ms)),
            None => Step::Succeed,
        }
    }

    fn on_succeed(&mut self, _ctx: &mut ActionContext<'_>, end: &mut EndArgs) {
        if self.exp > 0 {
            end.exp = Some(self.exp);
        }
    }
}

/// Ticks every ten seconds, once per source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Burning;

impl Burning {
    pub const PERIOD: Duration = Duration::from_secs(10);
}

impl Tagged for Burning {
    const TYPE: &'static str = "burning";
}

impl Effect for Burning {
    fn duration(&self) -> Duration {
        Self::PERIOD
    }

    fn at_tick(&mut self, ctx: &mut EffectContext<'_>, source: &Source) {
        ctx.msg(&format!("burn from {source}"));
    }

    fn at_remove(&mut self, ctx: &mut EffectContext<'_>, change: &StackChange) {
        ctx.msg(&format!("cooled {} from {}", change.stacks, change.source));
    }

    fn at_delete(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.msg("The fire goes out.");
    }
}

/// Negates burning stack for stack.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Soaked;

impl Tagged for Soaked {
    const TYPE: &'static str = "soaked";
}

impl Effect for Soaked {
    fn negates(&self) -> &[&'static str] {
        &["burning"]
    }

    fn at_create(&mut self, ctx: &mut EffectContext<'_>, _change: &StackChange) {
        ctx.msg("You are soaked.");
    }
}

pub fn registry() -> Registry {
    let mut registry = cadence_content::default_registry();
    registry
        .register_move::<Chore>()
        .register_effect::<Burning>()
        .register_effect::<Soaked>();
    registry
}

pub fn engine() -> TestEngine {
    engine_with(Arc::new(InMemoryStateRepo::new()))
}

pub fn engine_with(store: Arc<dyn StateRepository>) -> TestEngine {
    Engine::new(
        TestHost::default(),
        ManualScheduler::default(),
        store,
        Arc::new(registry()),
        EngineConfig::default(),
    )
}

/// Fires every timer due within `span`, then leaves the clock at its end.
pub fn run_for(engine: &mut TestEngine, span: Duration) {
    let deadline = time::after(engine.now(), span);
    while let Some(fired) = engine.scheduler_mut().pop_due(deadline) {
        engine.fire(fired);
    }
    engine.scheduler_mut().set_now(deadline);
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Store that can be told to reject writes.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStateRepo,
    failing: AtomicBool,
    rejected: AtomicUsize,
}

impl FlakyStore {
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

impl StateRepository for FlakyStore {
    fn save(&self, owner: EntityId, key: &str, value: &Value) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("disk on fire".into()));
        }
        self.inner.save(owner, key, value)
    }

    fn load(&self, owner: EntityId, key: &str) -> Result<Option<Value>, RepositoryError> {
        self.inner.load(owner, key)
    }

    fn exists(&self, owner: EntityId, key: &str) -> bool {
        self.inner.exists(owner, key)
    }

    fn delete(&self, owner: EntityId, key: &str) -> Result<(), RepositoryError> {
        self.inner.delete(owner, key)
    }

    fn list_owners(&self) -> Result<Vec<EntityId>, RepositoryError> {
        self.inner.list_owners()
    }
}

/// Id of `actor`'s current action, panicking when idle.
pub fn current(engine: &TestEngine, actor: EntityId) -> ActionId {
    engine
        .current_action(actor)
        .unwrap_or_else(|| panic!("{actor} has no current action"))
}

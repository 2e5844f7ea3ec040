use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::behavior::Effect;
use super::context::EffectContext;
use super::stacks::{Source, SourceFilter, StackChange, StackCount, Sources};
use crate::capability::Host;
use crate::command::Command;
use crate::error::PersistError;
use crate::ids::{EntityId, TimerHandle};
use crate::registry::Registry;
use crate::time::{self, Timestamp};

/// Identity of an effect instance on its owner: type tag plus optional name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectKey {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl fmt::Display for EffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({name})", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

/// Options for an `add`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddOptions {
    pub source: Source,
    pub stacks: u32,
    /// Display name distinguishing several instances of one type.
    pub name: Option<String>,
    /// Overrides the effect's own tick period on creation.
    pub duration: Option<Duration>,
}

impl AddOptions {
    pub fn stacks(stacks: u32) -> Self {
        Self {
            stacks,
            ..Self::default()
        }
    }

    pub fn from_source(source: impl Into<Source>, stacks: u32) -> Self {
        Self {
            source: source.into(),
            stacks,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            source: Source::None,
            stacks: 1,
            name: None,
            duration: None,
        }
    }
}

/// What a fired tick should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickDecision {
    /// The effect was deleted or its source is gone; end the chain.
    Stop,
    /// Due: run `at_tick` and reschedule after a full period.
    Fire,
    /// Woke early: reschedule for the remainder without firing.
    Wait(Duration),
}

/// One live effect on one owner.
#[derive(Debug)]
pub struct EffectInstance {
    key: EffectKey,
    sources: Sources,
    duration: Duration,
    last_ticks: BTreeMap<Source, Timestamp>,
    timers: HashMap<Source, TimerHandle>,
    behavior: Box<dyn Effect>,
}

impl EffectInstance {
    pub fn new(behavior: Box<dyn Effect>, options: &AddOptions) -> Self {
        Self {
            key: EffectKey {
                kind: behavior.type_tag().to_string(),
                name: options.name.clone(),
            },
            sources: Sources::new(),
            duration: options.duration.unwrap_or_else(|| behavior.duration()),
            last_ticks: BTreeMap::new(),
            timers: HashMap::new(),
            behavior,
        }
    }

    pub fn key(&self) -> &EffectKey {
        &self.key
    }

    pub fn kind(&self) -> &str {
        &self.key.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.key.name.as_deref()
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn stacks(&self) -> u32 {
        self.sources.total()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_ticking(&self) -> bool {
        !self.duration.is_zero()
    }

    pub fn last_tick(&self, source: &Source) -> Option<Timestamp> {
        self.last_ticks.get(source).copied()
    }

    pub fn behavior(&self) -> &dyn Effect {
        self.behavior.as_ref()
    }

    pub fn negates(&self) -> Vec<&'static str> {
        self.behavior.negates().to_vec()
    }

    /// Handle of the timer currently driving `source`'s chain.
    pub fn timer(&self, source: &Source) -> Option<TimerHandle> {
        self.timers.get(source).copied()
    }

    pub fn arm(&mut self, source: Source, handle: TimerHandle) -> Option<TimerHandle> {
        self.timers.insert(source, handle)
    }

    pub fn disarm(&mut self, source: &Source) -> Option<TimerHandle> {
        self.timers.remove(source)
    }

    /// Hands back every armed timer, leaving the duration alone.
    pub fn take_timers(&mut self) -> Vec<TimerHandle> {
        self.timers.drain().map(|(_, handle)| handle).collect()
    }

    /// Zeroes the duration and hands back every armed timer for cancelling.
    pub fn starve(&mut self) -> Vec<TimerHandle> {
        self.duration = Duration::ZERO;
        self.take_timers()
    }

    /// Runs `at_create` on a fresh instance (when `created`), then credits
    /// the stacks and runs `at_add`.
    pub fn add(
        &mut self,
        owner: EntityId,
        now: Timestamp,
        host: &mut dyn Host,
        commands: &mut Vec<Command>,
        change: StackChange,
        created: bool,
    ) {
        if created {
            let Self {
                key,
                sources,
                behavior,
                ..
            } = &mut *self;
            let mut ctx = EffectContext::new(owner, key, now, sources, &mut *host, &mut *commands);
            behavior.at_create(&mut ctx, &change);
        }
        self.sources.add(change.source, change.stacks);
        let Self {
            key,
            sources,
            behavior,
            ..
        } = self;
        let mut ctx = EffectContext::new(owner, key, now, sources, host, commands);
        behavior.at_add(&mut ctx, &change);
    }

    /// Debits stacks and runs `at_remove` once per source that lost any.
    /// Sources left without stacks forget their last tick.
    pub fn remove(
        &mut self,
        owner: EntityId,
        now: Timestamp,
        host: &mut dyn Host,
        commands: &mut Vec<Command>,
        filter: SourceFilter,
        count: StackCount,
    ) -> Vec<StackChange> {
        let changes = self.sources.remove(filter, count);
        let sources = &self.sources;
        self.last_ticks.retain(|source, _| sources.contains(source));
        let Self {
            key,
            sources,
            behavior,
            ..
        } = self;
        let mut ctx = EffectContext::new(owner, key, now, sources, host, commands);
        for change in &changes {
            behavior.at_remove(&mut ctx, change);
        }
        changes
    }

    pub fn delete(
        &mut self,
        owner: EntityId,
        now: Timestamp,
        host: &mut dyn Host,
        commands: &mut Vec<Command>,
    ) {
        let Self {
            key,
            sources,
            behavior,
            ..
        } = self;
        let mut ctx = EffectContext::new(owner, key, now, sources, host, commands);
        behavior.at_delete(&mut ctx);
    }

    /// Decides what a tick of `source` at `now` should do.
    pub fn tick_decision(&self, now: Timestamp, source: &Source) -> TickDecision {
        if self.duration.is_zero() {
            return TickDecision::Stop;
        }
        let elapsed = self
            .last_ticks
            .get(source)
            .map_or(self.duration, |last| time::since(now, *last));
        if elapsed < self.duration {
            TickDecision::Wait(self.duration - elapsed)
        } else if !self.sources.contains(source) {
            TickDecision::Stop
        } else {
            TickDecision::Fire
        }
    }

    /// Runs `at_tick` for `source` and records the tick time.
    pub fn fire_tick(
        &mut self,
        owner: EntityId,
        now: Timestamp,
        host: &mut dyn Host,
        commands: &mut Vec<Command>,
        source: Source,
    ) {
        {
            let Self {
                key,
                sources,
                behavior,
                ..
            } = &mut *self;
            let mut ctx = EffectContext::new(owner, key, now, sources, host, commands);
            behavior.at_tick(&mut ctx, &source);
        }
        self.last_ticks.insert(source, now);
    }

    /// Sources whose chains must be restarted after a reload.
    pub fn ticking_sources(&self) -> Vec<Source> {
        if self.is_ticking() {
            self.sources.keys().copied().collect()
        } else {
            Vec::new()
        }
    }

    pub fn to_record(&self) -> Result<EffectRecord, PersistError> {
        Ok(EffectRecord {
            kind: self.key.kind.clone(),
            name: self.key.name.clone(),
            sources: self.sources.clone(),
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            last_ticks: self.last_ticks.clone(),
            state: self
                .behavior
                .save_state()
                .map_err(|e| PersistError::encode("effect state", e))?,
        })
    }

    pub fn from_record(record: EffectRecord, registry: &Registry) -> Result<Self, PersistError> {
        let behavior = registry.decode_effect(&record.kind, record.state)?;
        Ok(Self {
            key: EffectKey {
                kind: record.kind,
                name: record.name,
            },
            sources: record.sources,
            duration: Duration::from_millis(record.duration_ms),
            last_ticks: record.last_ticks,
            timers: HashMap::new(),
            behavior,
        })
    }
}

/// Persisted form of an [`EffectInstance`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sources: Sources,
    pub duration_ms: u64,
    #[serde(default)]
    pub last_ticks: BTreeMap<Source, Timestamp>,
    pub state: Value,
}

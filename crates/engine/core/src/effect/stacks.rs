//! Pure stack accounting.
//!
//! Nothing in this module runs hooks: it only answers how many stacks each
//! source holds after an operation and reports what changed, so the
//! arithmetic can be tested independently of any effect content.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Who contributed stacks to an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Source {
    /// The "no source" sentinel.
    #[default]
    None,
    Entity(EntityId),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Entity(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid effect source `{0}`")]
pub struct SourceParseError(pub String);

impl FromStr for Source {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(Self::None);
        }
        s.strip_prefix('#')
            .and_then(|id| id.parse().ok())
            .map(|id| Self::Entity(EntityId(id)))
            .ok_or_else(|| SourceParseError(s.to_string()))
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for Source {
    type Error = SourceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for Source {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

/// Which sources a removal draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFilter {
    Only(Source),
    /// Every source in turn until the requested count is exhausted.
    All,
}

/// How many stacks a removal takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackCount {
    Exactly(u32),
    All,
}

/// Parameters of an effect removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveSpec {
    pub source: SourceFilter,
    pub stacks: StackCount,
}

impl RemoveSpec {
    /// `n` stacks contributed without a source.
    pub fn stacks(n: u32) -> Self {
        Self {
            source: SourceFilter::Only(Source::None),
            stacks: StackCount::Exactly(n),
        }
    }

    /// `n` stacks contributed by `source`.
    pub fn from_source(source: Source, n: u32) -> Self {
        Self {
            source: SourceFilter::Only(source),
            stacks: StackCount::Exactly(n),
        }
    }

    /// Every stack `source` contributed.
    pub fn source(source: Source) -> Self {
        Self {
            source: SourceFilter::Only(source),
            stacks: StackCount::All,
        }
    }

    /// `n` stacks drawn from any sources.
    pub fn any_source(n: u32) -> Self {
        Self {
            source: SourceFilter::All,
            stacks: StackCount::Exactly(n),
        }
    }

    /// Every stack from every source.
    pub fn all() -> Self {
        Self {
            source: SourceFilter::All,
            stacks: StackCount::All,
        }
    }
}

impl Default for RemoveSpec {
    fn default() -> Self {
        Self::stacks(1)
    }
}

/// Stacks gained or lost by one source in one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackChange {
    pub source: Source,
    pub stacks: u32,
}

/// Per-source stack counts. Sources never hold zero stacks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sources(BTreeMap<Source, u32>);

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stacks across all sources.
    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |acc, n| acc.saturating_add(*n))
    }

    pub fn get(&self, source: &Source) -> u32 {
        self.0.get(source).copied().unwrap_or(0)
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.0.contains_key(source)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Source, &u32)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Source> {
        self.0.keys()
    }

    /// Adds `stacks` from `source`. Adding zero leaves the map untouched.
    pub fn add(&mut self, source: Source, stacks: u32) -> StackChange {
        if stacks > 0 {
            let entry = self.0.entry(source).or_insert(0);
            *entry = entry.saturating_add(stacks);
        }
        StackChange { source, stacks }
    }

    /// Removes stacks according to `filter` and `count`, returning what each
    /// source actually lost. Sources left at zero are dropped.
    pub fn remove(&mut self, filter: SourceFilter, count: StackCount) -> Vec<StackChange> {
        let mut remaining = match count {
            StackCount::Exactly(n) => n,
            StackCount::All => u32::MAX,
        };
        let candidates: Vec<Source> = match filter {
            SourceFilter::Only(source) => vec![source],
            SourceFilter::All => self.0.keys().copied().collect(),
        };

        let mut changes = Vec::new();
        for source in candidates {
            if remaining == 0 {
                break;
            }
            let Some(held) = self.0.get_mut(&source) else {
                continue;
            };
            let taken = remaining.min(*held);
            *held -= taken;
            remaining -= taken;
            if *held == 0 {
                self.0.remove(&source);
            }
            if taken > 0 {
                changes.push(StackChange {
                    source,
                    stacks: taken,
                });
            }
        }
        changes
    }
}

/// Result of offsetting incoming stacks against a negated effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offset {
    /// Stacks to strip from the negated effect.
    pub consumed: u32,
    /// Net stacks left to add after negation.
    pub remaining: u32,
}

/// Stack-for-stack negation of `incoming` against `existing`.
pub fn offset(incoming: u32, existing: u32) -> Offset {
    Offset {
        consumed: incoming.min(existing),
        remaining: incoming.saturating_sub(existing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: Source = Source::Entity(EntityId(1));
    const S2: Source = Source::Entity(EntityId(2));

    #[test]
    fn totals_sum_sources() {
        let mut sources = Sources::new();
        sources.add(S1, 3);
        sources.add(S2, 2);
        sources.add(S1, 1);
        assert_eq!(sources.total(), 6);
        assert_eq!(sources.get(&S1), 4);
    }

    #[test]
    fn adding_zero_never_creates_a_source() {
        let mut sources = Sources::new();
        sources.add(S1, 0);
        assert!(sources.is_empty());
    }

    #[test]
    fn removal_from_one_source_caps_at_what_it_holds() {
        let mut sources = Sources::new();
        sources.add(S1, 2);
        sources.add(S2, 2);

        let changes = sources.remove(SourceFilter::Only(S1), StackCount::Exactly(5));
        assert_eq!(changes, vec![StackChange { source: S1, stacks: 2 }]);
        assert!(!sources.contains(&S1));
        assert_eq!(sources.total(), 2);

        let changes = sources.remove(SourceFilter::Only(Source::None), StackCount::Exactly(1));
        assert!(changes.is_empty());
    }

    #[test]
    fn removal_across_sources_walks_until_exhausted() {
        let mut sources = Sources::new();
        sources.add(Source::None, 1);
        sources.add(S1, 3);
        sources.add(S2, 2);

        let changes = sources.remove(SourceFilter::All, StackCount::Exactly(3));
        assert_eq!(
            changes,
            vec![
                StackChange { source: Source::None, stacks: 1 },
                StackChange { source: S1, stacks: 2 },
            ]
        );
        assert_eq!(sources.total(), 3);

        sources.remove(SourceFilter::All, StackCount::All);
        assert!(sources.is_empty());
        assert_eq!(sources.total(), 0);
    }

    #[test]
    fn negation_conserves_stacks() {
        for incoming in 0..8u32 {
            for existing in 0..8u32 {
                let Offset { consumed, remaining } = offset(incoming, existing);
                assert_eq!(consumed + remaining, incoming);
                assert!(consumed <= existing);
                if existing < incoming {
                    assert_eq!(remaining, incoming - existing);
                } else {
                    assert_eq!(remaining, 0);
                }
            }
        }
    }

    #[test]
    fn sources_round_trip_as_string_keys() {
        let mut sources = Sources::new();
        sources.add(Source::None, 1);
        sources.add(S2, 4);
        let json = serde_json::to_string(&sources).unwrap();
        assert_eq!(json, r##"{"none":1,"#2":4}"##);
        let back: Sources = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sources);

        assert!("#x".parse::<Source>().is_err());
    }
}

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::behavior::Effect;
use super::context::EffectContext;
use super::instance::AddOptions;
use super::stacks::Source;
use crate::capability::Tag;
use crate::command::EffectSpec;
use crate::registry::Tagged;

/// Spreads a pulse effect through its owner's contents on every tick.
///
/// Propagation is breadth first over containment. An item carrying `block`
/// still receives the pulse but is not descended into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaEffect {
    /// Type tag of the effect applied to each reached item.
    pub pulse: Option<String>,
    pub pulse_stacks: u32,
    pub period_ms: u64,
    pub block: Option<Tag>,
    /// Reach contents of contents, not just direct contents.
    pub deep: bool,
}

impl AreaEffect {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

    pub fn pulsing(pulse: impl Into<String>) -> Self {
        Self {
            pulse: Some(pulse.into()),
            ..Self::default()
        }
    }

    pub fn blocked_by(mut self, tag: Tag) -> Self {
        self.block = Some(tag);
        self
    }

    pub fn shallow(mut self) -> Self {
        self.deep = false;
        self
    }
}

impl Default for AreaEffect {
    fn default() -> Self {
        Self {
            pulse: None,
            pulse_stacks: 1,
            period_ms: Self::DEFAULT_PERIOD.as_millis() as u64,
            block: None,
            deep: true,
        }
    }
}

impl Tagged for AreaEffect {
    const TYPE: &'static str = "area";
}

impl Effect for AreaEffect {
    fn duration(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    fn at_tick(&mut self, ctx: &mut EffectContext<'_>, _source: &Source) {
        let Some(pulse) = self.pulse.as_deref() else {
            return;
        };
        let owner = ctx.owner();
        let mut visited = HashSet::from([owner]);
        let mut frontier: VecDeque<_> = ctx.host().contents(owner).into();

        while let Some(item) = frontier.pop_front() {
            if !visited.insert(item) {
                continue;
            }
            ctx.add_effect(
                item,
                EffectSpec::tag(pulse),
                AddOptions::from_source(owner, self.pulse_stacks),
            );
            if !self.deep {
                continue;
            }
            if let Some(block) = &self.block {
                if ctx.host().has_tag(item, block) {
                    continue;
                }
            }
            frontier.extend(ctx.host().contents(item));
        }
    }
}

use cadence_core::{Effect, EffectContext, StackChange, Tag, Tagged};
use serde::{Deserialize, Serialize};

/// Keeps a status tag on its owner for as long as the effect exists.
///
/// Without an explicit tag the instance name is used, so
/// `add_effect(.., EffectSpec::tag("tag"), AddOptions::stacks(1).named("hidden"))`
/// tags the owner `hidden`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<Tag>,
}

impl TagEffect {
    pub fn new(tag: Tag) -> Self {
        Self { tag: Some(tag) }
    }

    fn resolve(&self, ctx: &EffectContext<'_>) -> Option<Tag> {
        self.tag
            .clone()
            .or_else(|| ctx.key().name.clone().map(Tag::new))
    }
}

impl Tagged for TagEffect {
    const TYPE: &'static str = "tag";
}

impl Effect for TagEffect {
    fn at_create(&mut self, ctx: &mut EffectContext<'_>, _change: &StackChange) {
        if let Some(tag) = self.resolve(ctx) {
            let owner = ctx.owner();
            ctx.host().add_tag(owner, &tag);
        }
    }

    fn at_delete(&mut self, ctx: &mut EffectContext<'_>) {
        if let Some(tag) = self.resolve(ctx) {
            let owner = ctx.owner();
            ctx.host().remove_tag(owner, &tag);
        }
    }
}

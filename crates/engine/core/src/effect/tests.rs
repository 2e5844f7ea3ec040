use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::*;
use crate::capability::Tag;
use crate::command::Command;
use crate::ids::EntityId;
use crate::registry::Tagged;
use crate::schedule::{ManualScheduler, Scheduler};
use crate::testing::TestHost;
use crate::time::Timestamp;

const OWNER: EntityId = EntityId(1);
const S1: Source = Source::Entity(EntityId(21));

fn now() -> Timestamp {
    ManualScheduler::default().now()
}

fn ticking(period: Duration) -> EffectInstance {
    EffectInstance::new(
        Box::new(AreaEffect::default()),
        &AddOptions::default().with_duration(period),
    )
}

#[test]
fn tick_decisions_follow_the_period() {
    let mut host = TestHost::default();
    let mut commands = Vec::new();
    let mut effect = ticking(Duration::from_secs(10));
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: S1, stacks: 3 }, true);

    // first tick of a new source is due immediately
    assert_eq!(effect.tick_decision(now(), &S1), TickDecision::Fire);
    effect.fire_tick(OWNER, now(), &mut host, &mut commands, S1);
    assert_eq!(effect.last_tick(&S1), Some(now()));

    let early = now() + TimeDelta::seconds(4);
    assert_eq!(
        effect.tick_decision(early, &S1),
        TickDecision::Wait(Duration::from_secs(6))
    );
    let due = now() + TimeDelta::seconds(10);
    assert_eq!(effect.tick_decision(due, &S1), TickDecision::Fire);
}

#[test]
fn removed_sources_and_starved_effects_stop() {
    let mut host = TestHost::default();
    let mut commands = Vec::new();
    let mut effect = ticking(Duration::from_secs(10));
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: S1, stacks: 1 }, true);
    effect.add(
        OWNER,
        now(),
        &mut host,
        &mut commands,
        StackChange { source: Source::None, stacks: 1 },
        false,
    );

    effect.remove(OWNER, now(), &mut host, &mut commands, SourceFilter::Only(S1), StackCount::All);
    assert_eq!(effect.tick_decision(now(), &S1), TickDecision::Stop);
    assert_eq!(effect.tick_decision(now(), &Source::None), TickDecision::Fire);

    effect.arm(Source::None, crate::ids::TimerHandle(4));
    assert_eq!(effect.starve(), vec![crate::ids::TimerHandle(4)]);
    assert_eq!(effect.tick_decision(now(), &Source::None), TickDecision::Stop);
}

#[test]
fn area_pulse_spreads_breadth_first() {
    let mut host = TestHost::default();
    let (room, chest, coin, guard, pouch) = (OWNER, EntityId(2), EntityId(3), EntityId(4), EntityId(5));
    host.contents.insert(room, vec![chest, guard]);
    host.contents.insert(chest, vec![coin]);
    host.contents.insert(guard, vec![pouch]);
    // a cycle back to the room must not loop
    host.contents.insert(coin, vec![room]);
    let sealed = Tag::in_category("sealed", "container");
    host.tags.insert((guard, sealed.clone()));

    let mut area = AreaEffect::pulsing("smoke").blocked_by(sealed);
    let mut commands = Vec::new();
    let key = EffectKey {
        kind: "area".into(),
        name: None,
    };
    let sources = Sources::new();
    let mut ctx = EffectContext::new(room, &key, now(), &sources, &mut host, &mut commands);
    area.at_tick(&mut ctx, &Source::None);

    let reached: Vec<_> = commands
        .iter()
        .map(|command| match command {
            Command::AddEffect {
                owner,
                effect,
                options,
            } => {
                assert_eq!(effect.type_tag(), "smoke");
                assert_eq!(options.source, Source::Entity(room));
                owner.0
            }
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    // the guard is pulsed but not searched
    assert_eq!(reached, vec![2, 4, 3]);
}

#[test]
fn shallow_area_only_reaches_direct_contents() {
    let mut host = TestHost::default();
    host.contents.insert(OWNER, vec![EntityId(2)]);
    host.contents.insert(EntityId(2), vec![EntityId(3)]);

    let mut area = AreaEffect::pulsing("smoke").shallow();
    let mut commands = Vec::new();
    let key = EffectKey {
        kind: "area".into(),
        name: None,
    };
    let sources = Sources::new();
    let mut ctx = EffectContext::new(OWNER, &key, now(), &sources, &mut host, &mut commands);
    area.at_tick(&mut ctx, &Source::None);
    assert_eq!(commands.len(), 1);
}

#[test]
fn idle_area_does_nothing() {
    let mut host = TestHost::default();
    host.contents.insert(OWNER, vec![EntityId(2)]);
    let mut area = AreaEffect::default();
    let mut commands = Vec::new();
    let key = EffectKey {
        kind: "area".into(),
        name: None,
    };
    let sources = Sources::new();
    let mut ctx = EffectContext::new(OWNER, &key, now(), &sources, &mut host, &mut commands);
    area.at_tick(&mut ctx, &Source::None);
    assert!(commands.is_empty());
}

/// Reports the stacks it sees from its hooks.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Tally;

impl Tagged for Tally {
    const TYPE: &'static str = "tally";
}

impl Effect for Tally {
    fn at_create(&mut self, ctx: &mut EffectContext<'_>, _change: &StackChange) {
        let text = format!("created at {}", ctx.stacks());
        ctx.msg(&text);
    }

    fn at_add(&mut self, ctx: &mut EffectContext<'_>, change: &StackChange) {
        let text = format!("added {} to {}", change.stacks, ctx.stacks());
        ctx.msg(&text);
    }
}

#[test]
fn create_hook_runs_before_the_first_stacks() {
    let mut host = TestHost::default();
    let mut commands = Vec::new();
    let mut effect = EffectInstance::new(Box::new(Tally), &AddOptions::default());
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: S1, stacks: 2 }, true);
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: S1, stacks: 1 }, false);

    let said: Vec<_> = host.messages.iter().map(|(_, text)| text.as_str()).collect();
    assert_eq!(said, vec!["created at 0", "added 2 to 2", "added 1 to 3"]);
}

#[test]
fn emptied_sources_forget_their_last_tick() {
    let mut host = TestHost::default();
    let mut commands = Vec::new();
    let mut effect = ticking(Duration::from_secs(10));
    let s2 = Source::Entity(EntityId(22));
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: S1, stacks: 2 }, true);
    effect.add(OWNER, now(), &mut host, &mut commands, StackChange { source: s2, stacks: 1 }, false);
    effect.fire_tick(OWNER, now(), &mut host, &mut commands, S1);
    effect.fire_tick(OWNER, now(), &mut host, &mut commands, s2);

    // a partial removal keeps the chain's bookkeeping
    effect.remove(OWNER, now(), &mut host, &mut commands, SourceFilter::Only(S1), StackCount::Exactly(1));
    assert_eq!(effect.last_tick(&S1), Some(now()));

    effect.remove(OWNER, now(), &mut host, &mut commands, SourceFilter::Only(S1), StackCount::All);
    assert_eq!(effect.last_tick(&S1), None);
    assert_eq!(effect.last_tick(&s2), Some(now()));
    assert_eq!(effect.to_record().unwrap().last_ticks.len(), 1);
}

//! Stacking, negation and tick chains.
mod common;

use std::sync::Arc;

use cadence_content::TagEffect;
use cadence_core::{
    AddOptions, EffectQuery, EffectSpec, RemoveSpec, Scheduler, Source, StackChange, Tag,
};
use cadence_core::{Action, ActionQueue};
use cadence_runtime::{EffectEvent, Event, InMemoryStateRepo, StateRepository, Topic, keys};
use serde_json::{Value, json};
use common::*;

fn burning() -> EffectSpec {
    EffectSpec::tag("burning")
}

fn burn_stacks(engine: &mut TestEngine) -> u32 {
    engine
        .effect_stacks(ALICE, &EffectQuery::kind("burning"))
        .unwrap()
}

#[test]
fn each_source_runs_its_own_chain() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(CAROL, 2))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 5);
    // the first tick of each chain fires on add
    assert_eq!(engine.host().count_said("burn from"), 2);
    assert_eq!(engine.scheduler().pending(), 2);

    run_for(&mut engine, Burning::PERIOD);
    assert_eq!(engine.host().count_said("burn from"), 4);
    run_for(&mut engine, Burning::PERIOD);
    assert_eq!(engine.host().count_said("burn from"), 6);
}

#[test]
fn more_stacks_from_a_ticking_source_do_not_start_a_second_chain() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 1))
        .unwrap();
    run_for(&mut engine, secs(3));
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 4))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 5);
    assert_eq!(engine.scheduler().pending(), 1);
    run_for(&mut engine, secs(7));
    assert_eq!(engine.host().count_said("burn from"), 2);
}

#[test]
fn removed_source_stops_ticking() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(CAROL, 2))
        .unwrap();

    let changes = engine
        .remove_effect(
            ALICE,
            EffectQuery::kind("burning"),
            RemoveSpec::source(Source::from(CAROL)),
        )
        .unwrap();
    assert_eq!(
        changes,
        vec![StackChange {
            source: Source::from(CAROL),
            stacks: 2
        }]
    );
    assert_eq!(burn_stacks(&mut engine), 3);

    run_for(&mut engine, Burning::PERIOD);
    assert_eq!(engine.host().count_said("burn from"), 3);
    assert_eq!(engine.scheduler().pending(), 1);
}

#[test]
fn removing_everything_deletes_once() {
    let mut engine = engine();
    let mut effects = engine.events().subscribe(Topic::Effects);
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(CAROL, 2))
        .unwrap();

    let changes = engine
        .remove_effect(ALICE, EffectQuery::kind("burning"), RemoveSpec::all())
        .unwrap();
    assert_eq!(changes.iter().map(|c| c.stacks).sum::<u32>(), 5);
    assert_eq!(engine.host().count_said("cooled"), 2);
    assert_eq!(engine.host().count_said("The fire goes out."), 1);
    assert_eq!(engine.scheduler().pending(), 0);

    let again = engine
        .remove_effect(ALICE, EffectQuery::kind("burning"), RemoveSpec::all())
        .unwrap();
    assert!(again.is_empty());
    run_for(&mut engine, secs(30));
    assert_eq!(engine.host().count_said("The fire goes out."), 1);
    assert_eq!(engine.host().count_said("burn from"), 2);

    let mut deleted = 0;
    while let Ok(event) = effects.try_recv() {
        if matches!(event, Event::Effect(EffectEvent::Deleted { .. })) {
            deleted += 1;
        }
    }
    assert_eq!(deleted, 1);
}

#[test]
fn partial_removal_keeps_the_effect() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();
    engine
        .remove_effect(ALICE, EffectQuery::kind("burning"), RemoveSpec::stacks(2))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 1);
    assert_eq!(engine.host().count_said("The fire goes out."), 0);
}

#[test]
fn negation_consumes_stack_for_stack() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();
    engine
        .add_effect(ALICE, EffectSpec::tag("soaked"), AddOptions::stacks(5))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 0);
    assert_eq!(
        engine
            .effect_stacks(ALICE, &EffectQuery::kind("soaked"))
            .unwrap(),
        2
    );
    assert_eq!(engine.host().count_said("The fire goes out."), 1);
    assert_eq!(engine.host().count_said("You are soaked."), 1);
}

#[test]
fn fully_negated_add_creates_nothing() {
    let mut engine = engine();
    let mut effects = engine.events().subscribe(Topic::Effects);
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 5))
        .unwrap();
    engine
        .add_effect(ALICE, EffectSpec::tag("soaked"), AddOptions::stacks(2))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 3);
    assert_eq!(
        engine
            .effect_stacks(ALICE, &EffectQuery::kind("soaked"))
            .unwrap(),
        0
    );
    assert_eq!(engine.host().count_said("You are soaked."), 0);

    let negated: Vec<u32> = std::iter::from_fn(|| effects.try_recv().ok())
        .filter_map(|event| match event {
            Event::Effect(EffectEvent::Negated { stacks, .. }) => Some(stacks),
            _ => None,
        })
        .collect();
    assert_eq!(negated, vec![2]);
}

#[test]
fn zero_stacks_is_a_no_op() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::stacks(0))
        .unwrap();

    assert_eq!(burn_stacks(&mut engine), 0);
    assert!(engine.effects(ALICE).unwrap().is_none_or(|h| h.is_empty()));
    assert_eq!(engine.scheduler().pending(), 0);
}

#[test]
fn named_instances_stack_separately() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::stacks(2).named("left arm"))
        .unwrap();
    engine
        .add_effect(ALICE, burning(), AddOptions::stacks(1).named("right arm"))
        .unwrap();

    let left = EffectQuery::kind_named("burning", "left arm");
    assert_eq!(engine.effect_stacks(ALICE, &left).unwrap(), 2);
    assert_eq!(
        engine
            .effect_stacks(ALICE, &EffectQuery::named("right arm"))
            .unwrap(),
        1
    );

    engine
        .remove_effect(ALICE, EffectQuery::named("left arm"), RemoveSpec::all())
        .unwrap();
    assert_eq!(engine.effect_stacks(ALICE, &left).unwrap(), 0);
    assert_eq!(burn_stacks(&mut engine), 1);
}

#[test]
fn delete_and_clear() {
    let mut engine = engine();
    engine
        .add_effect(ALICE, burning(), AddOptions::stacks(4))
        .unwrap();
    assert!(
        engine
            .delete_effect(ALICE, EffectQuery::kind("burning"))
            .unwrap()
    );
    assert_eq!(engine.host().count_said("The fire goes out."), 1);
    assert!(
        !engine
            .delete_effect(ALICE, EffectQuery::kind("burning"))
            .unwrap()
    );

    engine
        .add_effect(ALICE, burning(), AddOptions::stacks(4))
        .unwrap();
    engine.clear_effects(ALICE).unwrap();
    assert_eq!(burn_stacks(&mut engine), 0);
    // clearing runs no hooks
    assert_eq!(engine.host().count_said("The fire goes out."), 1);
    assert_eq!(engine.scheduler().pending(), 0);
}

#[test]
fn tag_effect_holds_its_tag_while_present() {
    let mut engine = engine();
    let hidden = Tag::new("hidden");
    engine
        .add_effect(ALICE, EffectSpec::tag("tag"), AddOptions::stacks(1).named("hidden"))
        .unwrap();
    assert!(engine.host().tags.contains(&(ALICE, hidden.clone())));

    let prone = Tag::in_category("prone", "posture");
    engine
        .add_effect(
            ALICE,
            EffectSpec::instance(TagEffect::new(prone.clone())),
            AddOptions::stacks(1).named("knocked down"),
        )
        .unwrap();
    assert!(engine.host().tags.contains(&(ALICE, prone.clone())));

    engine
        .remove_effect(ALICE, EffectQuery::named("hidden"), RemoveSpec::all())
        .unwrap();
    assert!(!engine.host().tags.contains(&(ALICE, hidden)));
    assert!(engine.host().tags.contains(&(ALICE, prone)));
}

#[test]
fn ticking_resumes_after_restart_on_the_original_schedule() {
    let store: Arc<dyn StateRepository> = Arc::new(InMemoryStateRepo::new());
    let mut first = engine_with(store.clone());
    first
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 2))
        .unwrap();
    run_for(&mut first, secs(3));
    let crashed_at = first.now();
    drop(first);

    let mut second = engine_with(store);
    second.scheduler_mut().set_now(crashed_at);
    second.restore(ALICE).unwrap();
    assert_eq!(burn_stacks(&mut second), 2);

    // resumes after a second, then waits out the rest of the period
    run_for(&mut second, secs(1));
    assert_eq!(second.host().count_said("burn from"), 0);
    run_for(&mut second, secs(6));
    assert_eq!(second.host().count_said("burn from"), 1);
    run_for(&mut second, Burning::PERIOD);
    assert_eq!(second.host().count_said("burn from"), 2);
}

#[test]
fn rejected_write_rolls_back_to_the_stored_state() {
    let store = Arc::new(FlakyStore::default());
    let shared: Arc<dyn StateRepository> = store.clone();
    let mut engine = engine_with(shared);

    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 2))
        .unwrap();
    store.fail_saves(true);
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 3))
        .unwrap();

    assert!(store.rejected() >= 1);
    assert_eq!(burn_stacks(&mut engine), 2);

    store.fail_saves(false);
    engine
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 1))
        .unwrap();
    assert_eq!(burn_stacks(&mut engine), 3);
}

#[test]
fn rejected_queue_write_drops_the_unsaved_action() {
    let store = Arc::new(FlakyStore::default());
    let shared: Arc<dyn StateRepository> = store.clone();
    let mut engine = engine_with(shared);

    store.fail_saves(true);
    engine
        .enqueue(
            ALICE,
            Box::new(Chore::quick()),
            vec![],
            cadence_core::EnqueueMode::Add,
        )
        .unwrap();
    assert_eq!(engine.current_action(ALICE), None);
    assert_eq!(engine.scheduler().pending(), 0);

    run_for(&mut engine, secs(1));
    assert!(engine.host().moves.is_empty());
}

#[test]
fn unreadable_effects_are_skipped_on_load() {
    let store: Arc<dyn StateRepository> = Arc::new(InMemoryStateRepo::new());
    let mut first = engine_with(store.clone());
    first
        .add_effect(ALICE, burning(), AddOptions::from_source(BOB, 2))
        .unwrap();
    drop(first);

    let Some(Value::Array(mut records)) = store.load(ALICE, keys::EFFECTS).unwrap() else {
        panic!("effects were not saved as a list");
    };
    let mut retired = records[0].clone();
    retired["type"] = json!("gone");
    records.push(retired);
    records.push(json!({ "nonsense": true }));
    store
        .save(ALICE, keys::EFFECTS, &Value::Array(records))
        .unwrap();

    let mut second = engine_with(store);
    second.restore(ALICE).unwrap();
    assert_eq!(burn_stacks(&mut second), 2);
    second
        .add_effect(ALICE, burning(), AddOptions::from_source(CAROL, 1))
        .unwrap();
    assert_eq!(burn_stacks(&mut second), 3);
}

#[test]
fn restore_all_skips_entities_that_fail_to_load() {
    let store: Arc<dyn StateRepository> = Arc::new(InMemoryStateRepo::new());
    store
        .save(ALICE, keys::EFFECTS, &json!("not a list"))
        .unwrap();
    let mut saved = ActionQueue::new();
    saved.push_back(Action::new(BOB, Box::new(Chore::quick()), vec![]));
    let records = serde_json::to_value(saved.to_records().unwrap()).unwrap();
    store.save(BOB, keys::ACTION_QUEUE, &records).unwrap();

    let mut engine = engine_with(store);
    assert_eq!(engine.restore_all().unwrap(), 1);
    assert_eq!(engine.backlog_len(BOB), 1);

    run_for(&mut engine, secs(1));
    assert_eq!(engine.host().moves_of(BOB).len(), 1);
}

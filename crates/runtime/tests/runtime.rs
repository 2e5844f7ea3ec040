//! The async façade: worker, handle and real timers.
mod common;

use std::sync::Arc;
use std::time::Duration;

use cadence_core::{AddOptions, EffectQuery, EffectSpec, Outcome, RemoveSpec};
use cadence_runtime::{
    ActionEvent, Event, FileStateRepository, Runtime, RuntimeError, StateRepository, Topic,
};
use common::*;
use tempfile::TempDir;
use tokio::time::timeout;

async fn build(store: Option<Arc<dyn StateRepository>>, restore: bool) -> Runtime {
    let mut builder = Runtime::builder(TestHost::default())
        .registry(registry())
        .restore_all(restore);
    if let Some(store) = store {
        builder = builder.store(store);
    }
    builder.build().await.expect("runtime builds")
}

#[tokio::test]
async fn handle_drives_actions_to_completion() {
    let runtime = build(None, false).await;
    let handle = runtime.handle();
    let mut actions = handle.subscribe(Topic::Actions);

    let id = handle.add(ALICE, Chore::waiting(50), vec![]).await.unwrap();
    let outcome = timeout(Duration::from_secs(2), async {
        loop {
            match actions.recv().await {
                Ok(Event::Action(ActionEvent::Ended {
                    action, outcome, ..
                })) if action == id => break outcome,
                Ok(_) => continue,
                Err(e) => panic!("event stream broke: {e}"),
            }
        }
    })
    .await
    .expect("action ended in time");
    assert_eq!(outcome, Outcome::Succeeded);

    assert_eq!(
        handle.display(ALICE).await.unwrap(),
        "You are not planning to do anything."
    );
    runtime.shutdown(false).await.unwrap();
}

#[tokio::test]
async fn effects_through_the_handle() {
    let runtime = build(None, false).await;
    let handle = runtime.handle();
    let burning = EffectQuery::kind("burning");

    handle
        .add_effect(ALICE, EffectSpec::tag("burning"), AddOptions::from_source(BOB, 2))
        .await
        .unwrap();
    assert_eq!(handle.stacks(ALICE, burning.clone()).await.unwrap(), 2);

    let removed = handle
        .remove_effect(ALICE, burning.clone(), RemoveSpec::all())
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(handle.stacks(ALICE, burning).await.unwrap(), 0);

    let err = handle
        .add_effect(ALICE, EffectSpec::tag("frostbite"), AddOptions::stacks(1))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Registry(_)));

    runtime.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn state_survives_a_restart_on_disk() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn StateRepository> = Arc::new(FileStateRepository::new(dir.path()).unwrap());

    let runtime = build(Some(store.clone()), false).await;
    runtime
        .handle()
        .add_effect(ALICE, EffectSpec::tag("burning"), AddOptions::from_source(BOB, 4))
        .await
        .unwrap();
    runtime.shutdown(false).await.unwrap();

    let runtime = build(Some(store), true).await;
    let stacks = runtime
        .handle()
        .stacks(ALICE, EffectQuery::kind("burning"))
        .await
        .unwrap();
    assert_eq!(stacks, 4);
    runtime.shutdown(false).await.unwrap();
}

#[tokio::test]
async fn handle_reports_a_stopped_worker() {
    let runtime = build(None, false).await;
    let handle = runtime.handle();
    runtime.shutdown(false).await.unwrap();

    let err = handle.display(ALICE).await.unwrap_err();
    assert!(matches!(err, RuntimeError::CommandChannelClosed));
}

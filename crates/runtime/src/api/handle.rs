//! Cloneable façade for issuing commands to the engine worker.
//!
//! [`EngineHandle`] hides channel plumbing and offers async helpers for
//! queueing actions, managing effects or streaming events from specific
//! topics.

use std::collections::HashMap;

use cadence_core::{
    ActionId, AddOptions, Args, EffectQuery, EffectSpec, EnqueueMode, EntityId, Move, RemoveSpec,
    StackChange,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::EngineCommand;

/// Client-facing handle to interact with the engine.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    event_bus: EventBus,
}

impl EngineHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<EngineCommand>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> std::result::Result<T, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Queues `mv` for `actor` behind whatever is already planned.
    pub async fn enqueue(
        &self,
        actor: EntityId,
        mv: impl Move + 'static,
        args: Args,
        mode: EnqueueMode,
    ) -> Result<ActionId> {
        self.request(|reply| EngineCommand::Enqueue {
            actor,
            mv: Box::new(mv),
            args,
            mode,
            reply,
        })
        .await?
    }

    pub async fn add(&self, actor: EntityId, mv: impl Move + 'static, args: Args) -> Result<ActionId> {
        self.enqueue(actor, mv, args, EnqueueMode::Add).await
    }

    pub async fn add_next(
        &self,
        actor: EntityId,
        mv: impl Move + 'static,
        args: Args,
    ) -> Result<ActionId> {
        self.enqueue(actor, mv, args, EnqueueMode::Next).await
    }

    /// Queues `mv` first and force-ends the current action.
    pub async fn override_action(
        &self,
        actor: EntityId,
        mv: impl Move + 'static,
        args: Args,
    ) -> Result<ActionId> {
        self.enqueue(actor, mv, args, EnqueueMode::Override).await
    }

    pub async fn clear(&self, actor: EntityId) -> Result<()> {
        self.request(|reply| EngineCommand::Clear { actor, reply })
            .await?
    }

    pub async fn display(&self, actor: EntityId) -> Result<String> {
        self.request(|reply| EngineCommand::Display { actor, reply })
            .await?
    }

    pub async fn add_effect(
        &self,
        owner: EntityId,
        effect: EffectSpec,
        options: AddOptions,
    ) -> Result<()> {
        self.request(|reply| EngineCommand::AddEffect {
            owner,
            effect,
            options,
            reply,
        })
        .await?
    }

    pub async fn remove_effect(
        &self,
        owner: EntityId,
        query: EffectQuery,
        spec: RemoveSpec,
    ) -> Result<Vec<StackChange>> {
        self.request(|reply| EngineCommand::RemoveEffect {
            owner,
            query,
            spec,
            reply,
        })
        .await?
    }

    /// Total stacks of the matching effect on `owner`.
    pub async fn stacks(&self, owner: EntityId, query: EffectQuery) -> Result<u32> {
        self.request(|reply| EngineCommand::Stacks {
            owner,
            query,
            reply,
        })
        .await?
    }

    /// Loads `entity`'s saved state and schedules its resumption.
    pub async fn restore(&self, entity: EntityId) -> Result<()> {
        self.request(|reply| EngineCommand::Restore { entity, reply })
            .await?
    }

    /// Stops the worker. A cold shutdown ends every current action first.
    pub async fn shutdown(&self, cold: bool) -> Result<()> {
        self.request(|reply| EngineCommand::Shutdown { cold, reply })
            .await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Actions` - queueing and lifecycle of actions
    /// - `Topic::Effects` - stacking, negation and ticks
    /// - `Topic::Counters` - counter windows and opportunities
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

//! High-level runtime orchestrator.
//!
//! The runtime owns the engine worker, wires up command and event channels,
//! and exposes a builder-based API for clients to drive the engine.

use std::sync::Arc;

use cadence_core::{EngineConfig, Host, Registry};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{EngineHandle, Result, RuntimeError};
use crate::engine::Engine;
use crate::events::{Event, EventBus, Topic};
use crate::reactions::ReactionRegistry;
use crate::repository::{InMemoryStateRepo, StateRepository};
use crate::scheduler::TokioScheduler;
use crate::workers::{EngineCommand, EngineWorker};

/// Runtime configuration shared across the orchestrator and the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
    pub const DEFAULT_COMMAND_BUFFER_SIZE: usize = 64;

    pub fn with_engine(engine: EngineConfig) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            command_buffer_size: Self::DEFAULT_COMMAND_BUFFER_SIZE,
        }
    }
}

/// Running engine plus the handle clients use to reach it.
///
/// [`EngineHandle`] is the cloneable façade; the runtime itself only keeps
/// the worker task so it can be joined on shutdown.
pub struct Runtime {
    handle: EngineHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder around `host`.
    pub fn builder<H: Host + 'static>(host: H) -> RuntimeBuilder<H> {
        RuntimeBuilder::new(host)
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shuts the engine down and waits for the worker to exit.
    pub async fn shutdown(self, cold: bool) -> Result<()> {
        self.handle.shutdown(cold).await?;
        drop(self.handle);
        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        info!(target: "cadence::worker", cold, "runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder<H> {
    host: H,
    config: RuntimeConfig,
    store: Option<Arc<dyn StateRepository>>,
    registry: Option<Arc<Registry>>,
    reactions: Option<ReactionRegistry>,
    restore_all: bool,
}

impl<H: Host + 'static> RuntimeBuilder<H> {
    fn new(host: H) -> Self {
        Self {
            host,
            config: RuntimeConfig::default(),
            store: None,
            registry: None,
            reactions: None,
            restore_all: false,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage for queues and effects. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn StateRepository>) -> Self {
        self.store = Some(store);
        self
    }

    /// Move and effect types the engine can create and decode.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn reactions(mut self, reactions: ReactionRegistry) -> Self {
        self.reactions = Some(reactions);
        self
    }

    /// Restore every entity in the store before accepting commands.
    pub fn restore_all(mut self, restore: bool) -> Self {
        self.restore_all = restore;
        self
    }

    /// Build the runtime and spawn its worker.
    pub async fn build(self) -> Result<Runtime> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStateRepo::new()));
        let registry = self.registry.unwrap_or_default();
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let (scheduler, fired_rx) = TokioScheduler::new();
        let mut engine = Engine::new(
            self.host,
            scheduler,
            store,
            registry,
            self.config.engine.clone(),
        )
        .with_events(event_bus.clone())
        .with_reactions(self.reactions.unwrap_or_default());
        if self.restore_all {
            engine.restore_all()?;
        }

        let (command_tx, command_rx) =
            mpsc::channel::<EngineCommand>(self.config.command_buffer_size.max(1));
        let handle = EngineHandle::new(command_tx, event_bus);
        let worker = EngineWorker::new(engine, command_rx, fired_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"command_buffer_size": 8, "engine": {"resume_delay_ms": 50}}"#)
                .unwrap();
        assert_eq!(config.command_buffer_size, 8);
        assert_eq!(config.event_buffer_size, RuntimeConfig::DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.engine.resume_delay_ms, 50);
        assert_eq!(
            config.engine.promotion_delay_ms,
            EngineConfig::DEFAULT_PROMOTION_DELAY_MS
        );
    }
}

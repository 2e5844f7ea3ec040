//! Worker that owns the authoritative [`Engine`].
//!
//! Receives commands from [`EngineHandle`](crate::api::EngineHandle) and
//! fired timers from the [`TokioScheduler`], and feeds both into the engine
//! one at a time.

use cadence_core::{
    ActionId, AddOptions, Args, EffectQuery, EffectSpec, EnqueueMode, EntityId, Fired, Host,
    Move, RemoveSpec, StackChange,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::api::Result;
use crate::engine::Engine;
use crate::scheduler::TokioScheduler;

/// Commands that can be sent to the engine worker.
pub enum EngineCommand {
    Enqueue {
        actor: EntityId,
        mv: Box<dyn Move>,
        args: Args,
        mode: EnqueueMode,
        reply: oneshot::Sender<Result<ActionId>>,
    },
    Clear {
        actor: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    Display {
        actor: EntityId,
        reply: oneshot::Sender<Result<String>>,
    },
    AddEffect {
        owner: EntityId,
        effect: EffectSpec,
        options: AddOptions,
        reply: oneshot::Sender<Result<()>>,
    },
    RemoveEffect {
        owner: EntityId,
        query: EffectQuery,
        spec: RemoveSpec,
        reply: oneshot::Sender<Result<Vec<StackChange>>>,
    },
    Stacks {
        owner: EntityId,
        query: EffectQuery,
        reply: oneshot::Sender<Result<u32>>,
    },
    Restore {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Stops the worker after shutting the engine down.
    Shutdown {
        cold: bool,
        reply: oneshot::Sender<()>,
    },
}

/// Background task that processes engine commands and timers.
pub struct EngineWorker<H: Host> {
    engine: Engine<H, TokioScheduler>,
    command_rx: mpsc::Receiver<EngineCommand>,
    fired_rx: mpsc::UnboundedReceiver<Fired>,
}

impl<H: Host> EngineWorker<H> {
    pub fn new(
        engine: Engine<H, TokioScheduler>,
        command_rx: mpsc::Receiver<EngineCommand>,
        fired_rx: mpsc::UnboundedReceiver<Fired>,
    ) -> Self {
        Self {
            engine,
            command_rx,
            fired_rx,
        }
    }

    /// Main worker loop. Ends on a shutdown command or once every handle
    /// is dropped; the latter is a warm shutdown.
    pub async fn run(mut self) {
        info!(target: "cadence::worker", "engine worker started");
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => {
                        self.engine.shutdown(false);
                        break;
                    }
                },
                Some(fired) = self.fired_rx.recv() => self.engine.fire(fired),
            }
        }
        info!(target: "cadence::worker", "engine worker stopped");
    }

    /// Returns false once the worker should stop.
    fn handle_command(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::Enqueue {
                actor,
                mv,
                args,
                mode,
                reply,
            } => {
                let result = self.engine.enqueue(actor, mv, args, mode);
                respond(reply, result, "Enqueue");
            }
            EngineCommand::Clear { actor, reply } => {
                let result = self.engine.clear(actor, false);
                respond(reply, result, "Clear");
            }
            EngineCommand::Display { actor, reply } => {
                let result = self.engine.display(actor);
                respond(reply, result, "Display");
            }
            EngineCommand::AddEffect {
                owner,
                effect,
                options,
                reply,
            } => {
                let result = self.engine.add_effect(owner, effect, options);
                respond(reply, result, "AddEffect");
            }
            EngineCommand::RemoveEffect {
                owner,
                query,
                spec,
                reply,
            } => {
                let result = self.engine.remove_effect(owner, query, spec);
                respond(reply, result, "RemoveEffect");
            }
            EngineCommand::Stacks {
                owner,
                query,
                reply,
            } => {
                let result = self.engine.effect_stacks(owner, &query);
                respond(reply, result, "Stacks");
            }
            EngineCommand::Restore { entity, reply } => {
                let result = self.engine.restore(entity);
                respond(reply, result, "Restore");
            }
            EngineCommand::Shutdown { cold, reply } => {
                self.engine.shutdown(cold);
                respond(reply, (), "Shutdown");
                return false;
            }
        }
        true
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "cadence::worker", command, "reply channel closed (caller dropped)");
    }
}

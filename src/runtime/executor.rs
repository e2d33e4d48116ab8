//! Session runtime executor

use super::traits::SlotStore;
use super::{Ack, Command, SessionEvent, SessionSnapshot};

use crate::llm::{IntentRequest, IntentService};
use crate::session::{transition, Effect, Event, Outcome, Session, TransitionError};
use crate::store::{CHAT_HISTORY_SLOT, TODOS_SLOT};
use crate::todo::IdGenerator;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Generic session runtime that can work with any slot store and model
pub struct SessionRuntime<S, L>
where
    S: SlotStore + 'static,
    L: IntentService + 'static,
{
    session: Session,
    slots: S,
    llm: Arc<L>,
    ids: Box<dyn IdGenerator>,
    event_rx: mpsc::Receiver<Command>,
    /// Handed to spawned model requests so replies come back through the loop
    event_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
}

impl<S, L> SessionRuntime<S, L>
where
    S: SlotStore + 'static,
    L: IntentService + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Session,
        slots: S,
        llm: L,
        ids: Box<dyn IdGenerator>,
        event_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<Command>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session,
            slots,
            llm: Arc::new(llm),
            ids,
            event_rx,
            event_tx,
            snapshot_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(model = %self.llm.model_id(), "Starting session runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                Some(command) = self.event_rx.recv() => {
                    self.process_event(command.event, command.ack).await;
                }
                else => break,
            }
        }

        tracing::info!("Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event, ack: Option<Ack>) {
        let result = match transition(&self.session, self.ids.as_mut(), event) {
            Ok(r) => r,
            Err(e) => {
                match &e {
                    TransitionError::StaleReply { .. } => {
                        tracing::debug!(error = %e, "Dropping stale reply");
                    }
                    TransitionError::Busy => {
                        tracing::info!(error = %e, "Rejected submit while busy");
                        let _ = self.broadcast_tx.send(SessionEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
                if let Some(ack) = ack {
                    let _ = ack.send(Err(e));
                }
                return;
            }
        };

        // Update state, then publish before any I/O
        let changed = result.new_session != self.session;
        self.session = result.new_session;
        if changed {
            let snapshot = SessionSnapshot::of(&self.session);
            self.snapshot_tx.send_replace(snapshot.clone());
            let _ = self.broadcast_tx.send(SessionEvent::Snapshot(snapshot));
        }
        if let Some(ack) = ack {
            let _ = ack.send(Ok(()));
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
    }

    /// Execute one effect. Failures are logged, never surfaced.
    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PersistTodos(todos) => {
                persist(&self.slots, TODOS_SLOT, &todos).await;
            }

            Effect::PersistTranscript(transcript) => {
                persist(&self.slots, CHAT_HISTORY_SLOT, &transcript).await;
            }

            Effect::ClearSlots => {
                for slot in [TODOS_SLOT, CHAT_HISTORY_SLOT] {
                    if let Err(e) = self.slots.clear_slot(slot).await {
                        tracing::error!(slot, error = %e, "Failed to clear slot");
                    }
                }
            }

            Effect::RequestIntent {
                epoch,
                message,
                todos,
            } => {
                // Spawn model request as background task
                let llm = self.llm.clone();
                let event_tx = self.event_tx.clone();
                let request = IntentRequest::new(message, todos);

                tokio::spawn(async move {
                    tracing::info!(epoch, "Requesting intent (background)");
                    let event = match llm.request_intent(&request).await {
                        Ok(reply) => Event::ReplyReceived {
                            epoch,
                            raw: reply.content,
                        },
                        Err(error) => Event::TransportFailed { epoch, error },
                    };
                    if event_tx.send(event.into()).await.is_err() {
                        tracing::warn!(epoch, "Session runtime gone, dropping model reply");
                    }
                });
            }

            Effect::NotifyOutcome(outcome) => {
                match &outcome {
                    Outcome::Applied {
                        action,
                        collection_changed,
                    } => tracing::info!(
                        action = action.intent.kind(),
                        collection_changed,
                        "Intent applied"
                    ),
                    Outcome::MalformedIntent { reason } => {
                        tracing::warn!(reason = %reason, "Model reply was not a usable intent");
                    }
                    Outcome::TransportFailed { reason } => {
                        tracing::warn!(reason = %reason, "Model request failed");
                    }
                }
                let _ = self.broadcast_tx.send(SessionEvent::Outcome(outcome));
            }

            Effect::NotifyCleared => {
                let _ = self.broadcast_tx.send(SessionEvent::Cleared);
            }
        }
    }
}

async fn persist<S: SlotStore, T: Serialize>(slots: &S, slot: &'static str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(slot, error = %e, "Failed to serialize slot");
            return;
        }
    };
    if let Err(e) = slots.save_slot(slot, &json).await {
        tracing::error!(slot, error = %e, "Failed to persist slot");
    }
}

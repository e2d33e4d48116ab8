//! Runtime for the chat session
//!
//! A single task owns the [`Session`]. Everything else talks to it through a
//! [`SessionHandle`]: commands go in over an mpsc channel, the latest state
//! comes out over a `watch` channel and notifications over `broadcast`.

mod executor;
mod hydrate;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use hydrate::load_session;
pub use traits::*;

use crate::llm::IntentService;
use crate::session::{Event, Outcome, Session, TransitionError};
use crate::todo::{IdGenerator, TodoCollection, UuidIds};
use crate::transcript::Transcript;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// What readers see of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub todos: TodoCollection,
    /// Serialized in the prefixed-string form
    pub chat_history: Transcript,
    pub busy: bool,
}

impl SessionSnapshot {
    pub fn of(session: &Session) -> Self {
        Self {
            todos: session.todos.clone(),
            chat_history: session.transcript.clone(),
            busy: session.is_busy(),
        }
    }
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Snapshot(SessionSnapshot),
    Outcome(Outcome),
    Cleared,
    Error { message: String },
}

/// Error returned when the runtime task is gone
#[derive(Debug, thiserror::Error)]
#[error("session runtime is not running")]
pub struct RuntimeGone;

/// Why a dispatched command was not carried out
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error(transparent)]
    Gone(#[from] RuntimeGone),
}

/// Answered with the transition's verdict once the runtime has applied it
pub type Ack = oneshot::Sender<Result<(), TransitionError>>;

/// An event on its way into the runtime
pub struct Command {
    pub event: Event,
    pub ack: Option<Ack>,
}

impl From<Event> for Command {
    fn from(event: Event) -> Self {
        Self { event, ack: None }
    }
}

/// Handle to interact with the running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Queue `event` without waiting for it to be applied
    pub async fn send(&self, event: Event) -> Result<(), RuntimeGone> {
        self.event_tx
            .send(Command::from(event))
            .await
            .map_err(|_| RuntimeGone)
    }

    /// Queue `event` and wait until the runtime has accepted or rejected it
    pub async fn dispatch(&self, event: Event) -> Result<(), CommandError> {
        let (ack, verdict) = oneshot::channel();
        self.event_tx
            .send(Command {
                event,
                ack: Some(ack),
            })
            .await
            .map_err(|_| RuntimeGone)?;
        verdict.await.map_err(|_| RuntimeGone)??;
        Ok(())
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Spawn the runtime task for `session` and return a handle to it
pub fn spawn_session<S, L>(session: Session, slots: S, llm: L) -> SessionHandle
where
    S: SlotStore + 'static,
    L: IntentService + 'static,
{
    spawn_session_with_ids(session, slots, llm, Box::new(UuidIds))
}

pub(crate) fn spawn_session_with_ids<S, L>(
    session: Session,
    slots: S,
    llm: L,
    ids: Box<dyn IdGenerator>,
) -> SessionHandle
where
    S: SlotStore + 'static,
    L: IntentService + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::of(&session));
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        session,
        slots,
        llm,
        ids,
        event_rx,
        event_tx.clone(),
        snapshot_tx,
        broadcast_tx.clone(),
    );
    tokio::spawn(async move {
        runtime.run().await;
    });

    SessionHandle {
        event_tx,
        snapshot_rx,
        broadcast_tx,
    }
}

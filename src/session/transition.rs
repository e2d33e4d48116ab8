//! Pure session transition function

use super::{Effect, Event, Outcome, Phase, Session};
use crate::intent;
use crate::reconcile::reconcile;
use crate::todo::IdGenerator;
use crate::transcript::{ChatLine, MALFORMED_INTENT_REPLY, TRANSPORT_FAILURE_REPLY};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A request is already in flight, wait for the reply before sending another message")]
    Busy,
    #[error("Discarding reply for epoch {reply_epoch} (current epoch {current_epoch})")]
    StaleReply { reply_epoch: u64, current_epoch: u64 },
}

/// Pure transition function.
///
/// Given the same session, id sequence and event it always produces the same
/// result. All I/O is expressed as returned effects.
pub fn transition(
    session: &Session,
    ids: &mut dyn IdGenerator,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // User commands
        // ============================================================
        Event::Submit { message } if message.trim().is_empty() => {
            Ok(TransitionResult::new(session.clone()))
        }

        Event::Submit { .. } if session.is_busy() => Err(TransitionError::Busy),

        Event::Submit { message } => {
            let epoch = session.epoch + 1;
            let transcript = session
                .transcript
                .clone()
                .with_line(ChatLine::user(message.clone()));
            let next = Session {
                phase: Phase::Sending {
                    epoch,
                    message: message.clone(),
                },
                epoch,
                todos: session.todos.clone(),
                transcript: transcript.clone(),
            };
            let todos = next.todos.clone();
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PersistTranscript(transcript))
                .with_effect(Effect::RequestIntent {
                    epoch,
                    message,
                    todos,
                }))
        }

        Event::ToggleItem { id } => {
            if !session.todos.contains_id(&id) {
                return Ok(TransitionResult::new(session.clone()));
            }
            let todos = session.todos.clone().with_toggled_id(&id);
            let next = Session {
                todos: todos.clone(),
                ..session.clone()
            };
            Ok(TransitionResult::new(next).with_effect(Effect::PersistTodos(todos)))
        }

        Event::Reset { confirmed: false } => Ok(TransitionResult::new(session.clone())),

        Event::Reset { confirmed: true } => {
            let next = Session {
                epoch: session.epoch + 1,
                ..Session::default()
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ClearSlots)
                .with_effect(Effect::NotifyCleared))
        }

        // ============================================================
        // Model replies
        // ============================================================
        Event::ReplyReceived { epoch, raw } => {
            ensure_current(session, epoch)?;
            Ok(apply_reply(session, ids, &raw))
        }

        Event::TransportFailed { epoch, error } => {
            ensure_current(session, epoch)?;
            let transcript = session
                .transcript
                .clone()
                .with_line(ChatLine::assistant(TRANSPORT_FAILURE_REPLY));
            let next = Session {
                phase: Phase::Idle,
                transcript: transcript.clone(),
                ..session.clone()
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PersistTranscript(transcript))
                .with_effect(Effect::NotifyOutcome(Outcome::TransportFailed {
                    reason: error.to_string(),
                })))
        }
    }
}

fn ensure_current(session: &Session, reply_epoch: u64) -> Result<(), TransitionError> {
    if session.in_flight_epoch() == Some(reply_epoch) {
        Ok(())
    } else {
        Err(TransitionError::StaleReply {
            reply_epoch,
            current_epoch: session.epoch,
        })
    }
}

fn apply_reply(session: &Session, ids: &mut dyn IdGenerator, raw: &str) -> TransitionResult {
    match intent::parse(raw) {
        Ok(action) => {
            let todos = reconcile(&action.intent, session.todos.clone(), ids);
            let collection_changed = todos != session.todos;
            let transcript = session
                .transcript
                .clone()
                .with_line(ChatLine::assistant(action.response.clone()));
            let next = Session {
                phase: Phase::Idle,
                epoch: session.epoch,
                todos: todos.clone(),
                transcript: transcript.clone(),
            };

            let mut result = TransitionResult::new(next);
            if collection_changed {
                result = result.with_effect(Effect::PersistTodos(todos));
            }
            result
                .with_effect(Effect::PersistTranscript(transcript))
                .with_effect(Effect::NotifyOutcome(Outcome::Applied {
                    action,
                    collection_changed,
                }))
        }
        Err(e) => {
            let transcript = session
                .transcript
                .clone()
                .with_line(ChatLine::assistant(MALFORMED_INTENT_REPLY));
            let next = Session {
                phase: Phase::Idle,
                transcript: transcript.clone(),
                ..session.clone()
            };
            TransitionResult::new(next)
                .with_effect(Effect::PersistTranscript(transcript))
                .with_effect(Effect::NotifyOutcome(Outcome::MalformedIntent {
                    reason: e.to_string(),
                }))
        }
    }
}

//! Session state machine
//!
//! Elm-style: a pure transition function maps (session, event) to the next
//! session plus the effects the runtime must carry out.

mod effect;
mod event;
mod state;
mod transition;


pub use effect::{Effect, Outcome};
pub use event::Event;
pub use state::{Phase, Session};
pub use transition::{transition, TransitionError};

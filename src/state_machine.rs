//! Client state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! user actions and network completions go in as [`Event`]s, a new
//! [`AppState`] and a list of [`Effect`]s come out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, ErrorScope};
pub use event::{Event, TurnStamp};
pub use state::{
    AppState, ChatTurn, ConversationState, IntakeState, ProcessResult, RequestTag, Session,
    SessionId, SessionStatus, SourceCitation, StagedFile,
};
pub use transition::{transition, TransitionError, TransitionResult};

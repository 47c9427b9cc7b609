//! Pure state transition function
//!
//! Document intake, conversation and session coordination all step through
//! here. Rejected events leave the state untouched; callers treat a
//! [`TransitionError`] as a no-op.

use super::state::{
    AppState, ChatTurn, ProcessResult, RequestTag, Session, SourceCitation, StagedFile,
};
use super::{Effect, Event, TurnStamp};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AppState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AppState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events rejected because their preconditions do not hold
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No files staged for processing")]
    NoStagedFiles,
    #[error("Documents are already being processed")]
    IntakeBusy,
    #[error("No documents processed yet")]
    NoSession,
    #[error("Question is empty")]
    EmptyQuery,
    #[error("A question is already awaiting its answer")]
    ConversationBusy,
    #[error("Completion arrived with no matching request in flight")]
    UnexpectedCompletion,
}

/// Pure transition function
///
/// Given the same state and event this always yields the same result; all
/// I/O is described by the returned effects.
pub fn transition(state: &AppState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Document intake
        // ============================================================
        Event::StageFiles { files } => Ok(stage(state, files)),

        Event::ProcessRequested => process(state),

        Event::ProcessSucceeded { result } => {
            if !state.intake.busy {
                return Err(TransitionError::UnexpectedCompletion);
            }
            let mut next = state.clone();
            next.intake.busy = false;
            let session_id = result.session_id.clone();
            adopt(&mut next, result);
            Ok(TransitionResult::new(next).with_effect(Effect::NotifySessionAdopted { session_id }))
        }

        Event::ProcessFailed { message } => {
            if !state.intake.busy {
                return Err(TransitionError::UnexpectedCompletion);
            }
            let mut next = state.clone();
            next.intake.busy = false;
            next.intake.last_error = Some(message.clone());
            Ok(TransitionResult::new(next).with_effect(Effect::intake_error(message)))
        }

        // ============================================================
        // Conversation
        // ============================================================
        Event::DraftChanged { text } => {
            if state.session.is_none() {
                return Err(TransitionError::NoSession);
            }
            let mut next = state.clone();
            next.conversation.draft = text;
            Ok(TransitionResult::new(next))
        }

        Event::AskRequested { text, stamp } => ask(state, &text, stamp),

        Event::AnswerReceived {
            tag,
            answer,
            sources,
            stamp,
        } => {
            let mut next = complete_request(state, &tag)?;
            if !state.is_current(&tag) {
                return Ok(TransitionResult::new(next));
            }
            next.conversation.turns.push(assistant_turn(answer, sources, stamp));
            Ok(TransitionResult::new(next))
        }

        Event::AskFailed { tag, message } => {
            let mut next = complete_request(state, &tag)?;
            if !state.is_current(&tag) {
                return Ok(TransitionResult::new(next));
            }
            next.conversation.last_error = Some(message.clone());
            Ok(TransitionResult::new(next).with_effect(Effect::conversation_error(message)))
        }
    }
}

/// Replace the staged selection wholesale
fn stage(state: &AppState, files: Vec<StagedFile>) -> TransitionResult {
    let mut next = state.clone();
    next.intake.staged = files;
    TransitionResult::new(next)
}

fn process(state: &AppState) -> Result<TransitionResult, TransitionError> {
    if state.intake.busy {
        return Err(TransitionError::IntakeBusy);
    }
    if state.intake.staged.is_empty() {
        return Err(TransitionError::NoStagedFiles);
    }

    let mut next = state.clone();
    next.intake.busy = true;
    next.intake.last_error = None;
    let files = next.intake.staged.clone();
    Ok(TransitionResult::new(next).with_effect(Effect::ProcessDocuments { files }))
}

/// Adopt a processing result and start a fresh conversation.
///
/// The reset is unconditional, even when the server hands back the session
/// id already in use.
fn adopt(state: &mut AppState, result: ProcessResult) {
    state.session = Some(Session {
        id: result.session_id,
        files: result.files,
        message: result.message.filter(|m| !m.is_empty()),
    });
    state.generation += 1;
    state.conversation.reset();
}

fn ask(
    state: &AppState,
    text: &str,
    stamp: TurnStamp,
) -> Result<TransitionResult, TransitionError> {
    let Some(tag) = state.current_tag() else {
        return Err(TransitionError::NoSession);
    };
    if state.conversation.is_busy() {
        return Err(TransitionError::ConversationBusy);
    }
    let query = text.trim();
    if query.is_empty() {
        return Err(TransitionError::EmptyQuery);
    }

    let mut next = state.clone();
    next.conversation.turns.push(ChatTurn::User {
        id: stamp.id,
        content: query.to_string(),
        created_at: stamp.at,
    });
    next.conversation.draft.clear();
    next.conversation.in_flight = Some(tag.clone());
    next.conversation.last_error = None;

    Ok(TransitionResult::new(next).with_effect(Effect::AskQuestion {
        tag,
        query: query.to_string(),
    }))
}

/// Clear the in-flight marker for the request identified by `tag`
fn complete_request(state: &AppState, tag: &RequestTag) -> Result<AppState, TransitionError> {
    if state.conversation.in_flight.as_ref() != Some(tag) {
        return Err(TransitionError::UnexpectedCompletion);
    }
    let mut next = state.clone();
    next.conversation.in_flight = None;
    Ok(next)
}

fn assistant_turn(answer: String, sources: Vec<SourceCitation>, stamp: TurnStamp) -> ChatTurn {
    ChatTurn::Assistant {
        id: stamp.id,
        content: answer,
        created_at: stamp.at,
        sources,
    }
}

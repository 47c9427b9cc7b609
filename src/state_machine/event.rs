//! Events that drive the client state machine

use super::state::{ProcessResult, RequestTag, SourceCitation, StagedFile};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Intake events
    StageFiles {
        files: Vec<StagedFile>,
    },
    ProcessRequested,
    ProcessSucceeded {
        result: ProcessResult,
    },
    ProcessFailed {
        message: String,
    },

    // Conversation events
    DraftChanged {
        text: String,
    },
    AskRequested {
        text: String,
        stamp: TurnStamp,
    },
    AnswerReceived {
        tag: RequestTag,
        answer: String,
        sources: Vec<SourceCitation>,
        stamp: TurnStamp,
    },
    AskFailed {
        tag: RequestTag,
        message: String,
    },
}

impl Event {
    /// Tag of the request this event completes, if it is a question completion
    pub fn completion_tag(&self) -> Option<&RequestTag> {
        match self {
            Event::AnswerReceived { tag, .. } | Event::AskFailed { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// Identity and creation time for a new turn.
///
/// Generated outside the transition so the transition stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStamp {
    pub id: String,
    pub at: DateTime<Utc>,
}

impl TurnStamp {
    pub fn now() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            at: Utc::now(),
        }
    }
}

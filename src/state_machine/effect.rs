//! Effects produced by state transitions

use super::state::{RequestTag, SessionId, StagedFile};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upload the staged files as one multipart batch
    ProcessDocuments { files: Vec<StagedFile> },

    /// Ask the question-answering service, tagged with the issuing session
    AskQuestion { tag: RequestTag, query: String },

    /// Tell observers a new session replaced the old one
    NotifySessionAdopted { session_id: SessionId },

    /// Tell observers a request failed
    NotifyError { scope: ErrorScope, message: String },
}

/// Which controller an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Intake,
    Conversation,
}

impl Effect {
    pub fn intake_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            scope: ErrorScope::Intake,
            message: message.into(),
        }
    }

    pub fn conversation_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            scope: ErrorScope::Conversation,
            message: message.into(),
        }
    }

    /// Whether executing this effect performs network I/O
    pub fn is_request(&self) -> bool {
        matches!(self, Effect::ProcessDocuments { .. } | Effect::AskQuestion { .. })
    }
}

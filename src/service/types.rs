//! Wire types for the document backend

use crate::state_machine::{ProcessResult, SessionId, SourceCitation};
use serde::{Deserialize, Serialize};

/// `POST /process-pdfs` success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ProcessResponse {
    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            session_id: SessionId::new(self.session_id),
            files: self.files,
            message: Some(self.message).filter(|m| !m.is_empty()),
        }
    }
}

/// `POST /ask-question` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub session_id: String,
    pub user_query: String,
}

/// `POST /ask-question` success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
}

impl AskResponse {
    pub fn citations(&self) -> Vec<SourceCitation> {
        self.sources
            .iter()
            .flatten()
            .map(|s| SourceCitation {
                source: s.source.clone(),
                page_label: s.page_label,
            })
            .collect()
    }
}

/// One citation as the backend reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    pub page_label: u32,
}

//! Client state types
//!
//! Three controllers live side by side in [`AppState`]: document intake,
//! the conversation, and the session coordinator fields that tie them
//! together. Only the transition function mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Session Identity
// ============================================================================

/// Opaque token naming a server-side corpus of processed documents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The adopted result of a successful processing call.
///
/// The identity and its confirmed file list are one value so they can never
/// be observed out of step with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Server-confirmed accepted files, in server order
    pub files: Vec<String>,
    /// Optional human-readable note from the processing service
    pub message: Option<String>,
}

/// Successful outcome of a processing call, handed to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub session_id: SessionId,
    pub files: Vec<String>,
    pub message: Option<String>,
}

/// Identifies which session an in-flight question was issued against.
///
/// `generation` is bumped on every adopt, so a re-process that happens to
/// return the same session id still invalidates older requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub session_id: SessionId,
    pub generation: u64,
}

// ============================================================================
// Staged Files
// ============================================================================

/// A local file selected for upload but not yet submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
}

impl StagedFile {
    /// Stage a file by path; the display name is the final path component
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map_or_else(
                || path.to_string_lossy().into_owned(),
                |n| n.to_string_lossy().into_owned(),
            );
        Self { name, path }
    }

    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

// ============================================================================
// Chat Turns
// ============================================================================

/// Where an answer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub source: String,
    pub page_label: u32,
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatTurn {
    User {
        id: String,
        content: String,
        created_at: DateTime<Utc>,
    },
    Assistant {
        id: String,
        content: String,
        created_at: DateTime<Utc>,
        #[serde(default)]
        sources: Vec<SourceCitation>,
    },
}

impl ChatTurn {
    pub fn id(&self) -> &str {
        match self {
            ChatTurn::User { id, .. } | ChatTurn::Assistant { id, .. } => id,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatTurn::User { content, .. } | ChatTurn::Assistant { content, .. } => content,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ChatTurn::User { created_at, .. } | ChatTurn::Assistant { created_at, .. } => {
                *created_at
            }
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, ChatTurn::User { .. })
    }

    pub fn sources(&self) -> &[SourceCitation] {
        match self {
            ChatTurn::User { .. } => &[],
            ChatTurn::Assistant { sources, .. } => sources,
        }
    }
}

// ============================================================================
// Controllers
// ============================================================================

/// Document intake: the staged selection and the process action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeState {
    pub staged: Vec<StagedFile>,
    pub busy: bool,
    pub last_error: Option<String>,
}

impl IntakeState {
    /// Names of the staged files, duplicates included
    pub fn staged_names(&self) -> Vec<&str> {
        self.staged.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Conversation: the append-only turn log for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub turns: Vec<ChatTurn>,
    pub draft: String,
    /// Tag of the outstanding question, if one is in flight
    pub in_flight: Option<RequestTag>,
    pub last_error: Option<String>,
}

impl ConversationState {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Clear the log, the draft and the last error.
    ///
    /// An outstanding request stays tracked; its answer is dropped on
    /// arrival because its tag no longer matches.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.draft.clear();
        self.last_error = None;
    }
}

/// Whole-client state, owned by the session coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub session: Option<Session>,
    /// Number of sessions adopted so far
    pub generation: u64,
    pub intake: IntakeState,
    pub conversation: ConversationState,
}

impl AppState {
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    pub fn processed_files(&self) -> &[String] {
        self.session.as_ref().map_or(&[], |s| s.files.as_slice())
    }

    /// Tag for a question issued right now, if a session exists
    pub fn current_tag(&self) -> Option<RequestTag> {
        self.session.as_ref().map(|s| RequestTag {
            session_id: s.id.clone(),
            generation: self.generation,
        })
    }

    /// Whether a completion carrying `tag` still belongs to the live session
    pub fn is_current(&self, tag: &RequestTag) -> bool {
        self.current_tag().as_ref() == Some(tag)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match &self.session {
            None => SessionStatus::NoDocuments,
            Some(s) if s.files.is_empty() => SessionStatus::ReadyNoFiles,
            Some(s) => SessionStatus::Ready {
                file_count: s.files.len(),
            },
        }
    }

    /// Hint shown under the composer once documents are searchable
    pub fn composer_hint(&self) -> Option<String> {
        match self.processed_files().len() {
            0 => None,
            n => Some(format!("Searching across {n} processed file(s).")),
        }
    }

    pub fn can_process(&self) -> bool {
        !self.intake.busy && !self.intake.staged.is_empty()
    }

    pub fn can_ask(&self) -> bool {
        self.session.is_some() && !self.conversation.is_busy()
    }
}

/// Human-readable readiness of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NoDocuments,
    ReadyNoFiles,
    Ready { file_count: usize },
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NoDocuments => f.write_str("no documents processed"),
            SessionStatus::ReadyNoFiles => f.write_str("ready, no files confirmed"),
            SessionStatus::Ready { file_count } => write!(f, "ready, {file_count} file(s)"),
        }
    }
}

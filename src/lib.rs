//! pdf-chat - converse with a document backend about uploaded PDFs
//!
//! The client is a small state machine: documents are staged and processed
//! into a server-side session, then questions are asked against that
//! session. A new session always starts a new conversation.

pub mod config;
pub mod runtime;
pub mod service;
pub mod shell;
pub mod state_machine;

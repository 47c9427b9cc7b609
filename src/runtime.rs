//! Runtime for driving a client session
//!
//! One task owns the [`AppState`] and applies every event in arrival order.
//! Backend calls run on spawned tasks and report back as events, so the
//! state is never touched from two places.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::service::DocumentService;
use crate::state_machine::{
    AppState, ErrorScope, Event, SessionId, StagedFile, TransitionError, TurnStamp,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

/// Events sent to observers
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A transition was applied; carries the full new state
    StateChanged { state: Arc<AppState> },
    SessionAdopted { session_id: SessionId },
    Error { scope: ErrorScope, message: String },
    /// An action was attempted while its preconditions did not hold
    Rejected { reason: TransitionError },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("Session runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    state_rx: watch::Receiver<AppState>,
}

impl SessionHandle {
    /// Start a runtime on the current tokio runtime and return its handle
    pub fn spawn<S: DocumentService + 'static>(service: S) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (state_tx, state_rx) = watch::channel(AppState::default());

        let runtime = SessionRuntime::new(
            service,
            event_rx,
            event_tx.downgrade(),
            broadcast_tx.clone(),
            state_tx,
        );
        tokio::spawn(runtime.run());

        Self {
            event_tx,
            broadcast_tx,
            state_rx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Receiver that always holds the latest state
    pub fn watch(&self) -> watch::Receiver<AppState> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> AppState {
        self.state_rx.borrow().clone()
    }

    pub async fn send(&self, event: Event) -> Result<(), HandleError> {
        self.event_tx.send(event).await.map_err(|_| HandleError::Stopped)
    }

    pub async fn stage(&self, files: Vec<StagedFile>) -> Result<(), HandleError> {
        self.send(Event::StageFiles { files }).await
    }

    pub async fn process(&self) -> Result<(), HandleError> {
        self.send(Event::ProcessRequested).await
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), HandleError> {
        self.send(Event::DraftChanged { text: text.into() }).await
    }

    pub async fn ask(&self, text: impl Into<String>) -> Result<(), HandleError> {
        self.send(Event::AskRequested {
            text: text.into(),
            stamp: TurnStamp::now(),
        })
        .await
    }
}

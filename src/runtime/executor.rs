//! Session runtime executor

use super::ClientEvent;
use crate::service::{AskRequest, DocumentService};
use crate::state_machine::{transition, AppState, Effect, Event, TurnStamp};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns the client state and performs the effects its transitions ask for
pub struct SessionRuntime<S>
where
    S: DocumentService + 'static,
{
    state: AppState,
    service: Arc<S>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the runtime stops once every handle is gone and no request
    /// is outstanding
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    state_tx: watch::Sender<AppState>,
}

impl<S> SessionRuntime<S>
where
    S: DocumentService + 'static,
{
    pub fn new(
        service: S,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<ClientEvent>,
        state_tx: watch::Sender<AppState>,
    ) -> Self {
        Self {
            state: AppState::default(),
            service: Arc::new(service),
            event_rx,
            event_tx,
            broadcast_tx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!("Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        if let Some(tag) = event.completion_tag() {
            if !self.state.is_current(tag) {
                tracing::info!(
                    session_id = %tag.session_id,
                    generation = tag.generation,
                    "Discarding answer for superseded session"
                );
            }
        }

        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(reason) => {
                // Disabled actions are no-ops
                tracing::debug!(reason = %reason, "Event rejected");
                let _ = self.broadcast_tx.send(ClientEvent::Rejected { reason });
                return;
            }
        };

        self.state = result.new_state;
        self.state_tx.send_replace(self.state.clone());
        let _ = self.broadcast_tx.send(ClientEvent::StateChanged {
            state: Arc::new(self.state.clone()),
        });

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::ProcessDocuments { files } => {
                let Some(event_tx) = self.event_tx.upgrade() else {
                    return;
                };
                let service = self.service.clone();

                tokio::spawn(async move {
                    tracing::info!(files = files.len(), "Processing documents (background)");
                    let event = match service.process_documents(&files).await {
                        Ok(response) => Event::ProcessSucceeded {
                            result: response.into_result(),
                        },
                        Err(e) => Event::ProcessFailed {
                            message: e.display_message(),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::AskQuestion { tag, query } => {
                let Some(event_tx) = self.event_tx.upgrade() else {
                    return;
                };
                let service = self.service.clone();

                tokio::spawn(async move {
                    tracing::info!(session_id = %tag.session_id, "Asking question (background)");
                    let request = AskRequest {
                        session_id: tag.session_id.as_str().to_owned(),
                        user_query: query,
                    };
                    let event = match service.ask_question(&request).await {
                        Ok(response) => Event::AnswerReceived {
                            sources: response.citations(),
                            answer: response.answer,
                            tag,
                            stamp: TurnStamp::now(),
                        },
                        Err(e) => Event::AskFailed {
                            tag,
                            message: e.display_message(),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::NotifySessionAdopted { session_id } => {
                tracing::info!(
                    session_id = %session_id,
                    files = self.state.processed_files().len(),
                    "Session adopted"
                );
                let _ = self
                    .broadcast_tx
                    .send(ClientEvent::SessionAdopted { session_id });
            }

            Effect::NotifyError { scope, message } => {
                tracing::warn!(scope = ?scope, error = %message, "Request failed");
                let _ = self.broadcast_tx.send(ClientEvent::Error { scope, message });
            }
        }
    }
}

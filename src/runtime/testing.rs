//! Mock implementations for testing
//!
//! These mocks enable runtime tests without a real backend.

use super::{ClientEvent, SessionHandle};
use crate::service::{AskRequest, AskResponse, DocumentService, ProcessResponse, ServiceError};
use crate::state_machine::{AppState, StagedFile};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, Notify, Semaphore};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Mock Document Service
// ============================================================================

/// Mock backend that returns queued responses
#[derive(Default)]
pub struct MockDocumentService {
    process_responses: Mutex<VecDeque<Result<ProcessResponse, ServiceError>>>,
    answers: Mutex<VecDeque<Result<AskResponse, ServiceError>>>,
    /// Record of every upload batch
    pub uploads: Mutex<Vec<Vec<StagedFile>>>,
    /// Record of every question
    pub questions: Mutex<Vec<AskRequest>>,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_process(&self, response: Result<ProcessResponse, ServiceError>) {
        self.process_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_answer(&self, response: Result<AskResponse, ServiceError>) {
        self.answers.lock().unwrap().push_back(response);
    }

    pub fn recorded_uploads(&self) -> Vec<Vec<StagedFile>> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn recorded_questions(&self) -> Vec<AskRequest> {
        self.questions.lock().unwrap().clone()
    }

    fn next_answer(&self) -> Result<AskResponse, ServiceError> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::network("No mock answer queued")))
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError> {
        self.uploads.lock().unwrap().push(files.to_vec());
        self.process_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::network("No mock process response queued")))
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError> {
        self.questions.lock().unwrap().push(request.clone());
        self.next_answer()
    }
}

// ============================================================================
// Gated Mock (for race testing)
// ============================================================================

/// Mock backend whose answers are held until the test releases them
pub struct GatedDocumentService {
    inner: MockDocumentService,
    gate: Semaphore,
    /// Notified when a question reaches the backend
    ask_started: Notify,
}

impl GatedDocumentService {
    pub fn new() -> Self {
        Self {
            inner: MockDocumentService::new(),
            gate: Semaphore::new(0),
            ask_started: Notify::new(),
        }
    }

    pub fn queue_process(&self, response: Result<ProcessResponse, ServiceError>) {
        self.inner.queue_process(response);
    }

    pub fn queue_answer(&self, response: Result<AskResponse, ServiceError>) {
        self.inner.queue_answer(response);
    }

    pub fn recorded_questions(&self) -> Vec<AskRequest> {
        self.inner.recorded_questions()
    }

    /// Wait until a question is being held at the gate
    pub async fn wait_for_ask(&self) {
        tokio::time::timeout(WAIT_TIMEOUT, self.ask_started.notified())
            .await
            .expect("no question reached the backend");
    }

    /// Let one held question complete
    pub fn release_ask(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl DocumentService for GatedDocumentService {
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError> {
        self.inner.process_documents(files).await
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError> {
        self.inner.questions.lock().unwrap().push(request.clone());
        // notify_one stores a permit, so a waiter that arrives late still wakes
        self.ask_started.notify_one();
        self.gate
            .acquire()
            .await
            .expect("gate closed")
            .forget();
        self.inner.next_answer()
    }
}

// ============================================================================
// Observation helpers
// ============================================================================

/// Wait until the published state satisfies `predicate`
pub async fn wait_for_state(
    handle: &SessionHandle,
    predicate: impl FnMut(&AppState) -> bool,
) -> AppState {
    let mut rx = handle.watch();
    let state = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("runtime stopped");
    state.clone()
}

/// Receive broadcast events until one satisfies `predicate`
pub async fn next_matching(
    events: &mut broadcast::Receiver<ClientEvent>,
    mut predicate: impl FnMut(&ClientEvent) -> bool,
) -> ClientEvent {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

//! Document backend abstraction
//!
//! The processing and question-answering services sit behind one trait so
//! the runtime can be driven by mocks in tests.

mod error;
mod http;
mod types;

pub use error::{ServiceError, ServiceErrorKind};
pub use http::HttpDocumentService;
pub use types::{AskRequest, AskResponse, ProcessResponse, SourceRef};

use crate::state_machine::StagedFile;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the document backend
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Upload a batch of files and open a session over them
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError>;

    /// Ask a question scoped to a session
    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError>;
}

#[async_trait]
impl<T: DocumentService + ?Sized> DocumentService for Arc<T> {
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError> {
        (**self).process_documents(files).await
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError> {
        (**self).ask_question(request).await
    }
}

/// Logging wrapper for document services
pub struct LoggingService<S> {
    inner: S,
}

impl<S: DocumentService> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: DocumentService> DocumentService for LoggingService<S> {
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError> {
        let start = std::time::Instant::now();
        let result = self.inner.process_documents(files).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    session_id = %response.session_id,
                    uploaded = files.len(),
                    accepted = response.files.len(),
                    duration_ms = %duration.as_millis(),
                    "Documents processed"
                );
            }
            Err(e) => {
                tracing::error!(
                    uploaded = files.len(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    status = ?e.kind.status_code(),
                    "Document processing failed"
                );
            }
        }

        result
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError> {
        let start = std::time::Instant::now();
        let result = self.inner.ask_question(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    session_id = %request.session_id,
                    sources = response.sources.as_ref().map_or(0, Vec::len),
                    duration_ms = %duration.as_millis(),
                    "Question answered"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %request.session_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    status = ?e.kind.status_code(),
                    "Question failed"
                );
            }
        }

        result
    }
}

//! HTTP implementation of the document backend

use super::types::{AskRequest, AskResponse, ProcessResponse};
use super::{DocumentService, ServiceError};
use crate::config::ClientConfig;
use crate::state_machine::StagedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;

const PDF_MIME: &str = "application/pdf";

/// Talks to the backend's `/process-pdfs` and `/ask-question` endpoints
pub struct HttpDocumentService {
    client: Client,
    base_url: String,
}

impl HttpDocumentService {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn build_form(files: &[StagedFile]) -> Result<Form, ServiceError> {
        let mut form = Form::new();
        for file in files {
            let data = tokio::fs::read(&file.path).await.map_err(|e| {
                ServiceError::io(format!("Failed to read {}: {e}", file.path.display()))
            })?;
            let part = Part::bytes(data)
                .file_name(file.name.clone())
                .mime_str(PDF_MIME)
                .map_err(|e| ServiceError::io(format!("Invalid content type: {e}")))?;
            form = form.part("files", part);
        }
        Ok(form)
    }

    /// Send a request and decode a 2xx JSON body
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ServiceError::network(format!("Connection failed: {e}"))
            } else {
                ServiceError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body still reports the status
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(status = status.as_u16(), error = %e, "Error body unreadable");
                String::new()
            });
            return Err(ServiceError::status(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::network(format!("Failed to read response: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            ServiceError::decode(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn process_documents(
        &self,
        files: &[StagedFile],
    ) -> Result<ProcessResponse, ServiceError> {
        let form = Self::build_form(files).await?;
        let request = self.client.post(self.endpoint("process-pdfs")).multipart(form);
        self.execute(request).await
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ServiceError> {
        let request = self.client.post(self.endpoint("ask-question")).json(request);
        self.execute(request).await
    }
}

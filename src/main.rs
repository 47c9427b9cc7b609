//! pdf-chat - terminal client for a PDF question-answering backend

use pdf_chat::config::ClientConfig;
use pdf_chat::runtime::SessionHandle;
use pdf_chat::service::{HttpDocumentService, LoggingService};
use pdf_chat::shell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the shell
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "Using document backend");

    let service = LoggingService::new(HttpDocumentService::new(&config)?);
    let handle = SessionHandle::spawn(service);

    shell::run(handle).await
}

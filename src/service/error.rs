//! Backend error types

use thiserror::Error;

/// Backend call failure with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, message)
    }

    /// Non-2xx response; `body` is the raw response text
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Status(code), body)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Decode, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Io, message)
    }

    /// The string shown to the user.
    ///
    /// Server-provided body text wins; an empty body on a failed status
    /// falls back to a generic message naming the status.
    pub fn display_message(&self) -> String {
        match self.kind {
            ServiceErrorKind::Status(code) if self.message.trim().is_empty() => {
                format!("request failed with status {code}")
            }
            _ => self.message.clone(),
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection refused, timeouts, interrupted bodies
    Network,
    /// Backend answered with a non-2xx status
    Status(u16),
    /// 2xx response whose body is not the expected JSON
    Decode,
    /// A staged file could not be read
    Io,
}

impl ServiceErrorKind {
    pub fn status_code(self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(code),
            _ => None,
        }
    }
}

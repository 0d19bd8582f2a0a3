use shared::error::GENERIC_PROCESSING_ERROR;
use thiserror::Error;

/// The single failure path of a submission cycle: whatever went wrong, the
/// user sees one message in the error panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    message: String,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn generic() -> Self {
        Self::new(GENERIC_PROCESSING_ERROR)
    }

    /// Uses the server's `error` field when it carries any text.
    pub fn from_server_message(message: Option<String>) -> Self {
        match message {
            Some(message) if !message.is_empty() => Self::new(message),
            _ => Self::generic(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a submission is already in progress")]
    SubmissionInFlight,
}

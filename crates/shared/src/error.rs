use serde::{Deserialize, Serialize};

/// Message shown whenever a submission fails without a more specific reason.
pub const GENERIC_PROCESSING_ERROR: &str = "Error procesando el video";

/// Failure body returned by the processing server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            step: None,
        }
    }

    pub fn at_step(step: u8, message: impl Into<String>) -> Self {
        Self {
            step: Some(step),
            ..Self::new(message)
        }
    }
}

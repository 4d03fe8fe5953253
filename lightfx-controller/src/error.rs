//! Controller error types

use thiserror::Error;

/// Errors that can occur while talking to the lighting controller
#[derive(Error, Debug)]
pub enum ControllerError {
    // REST errors
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Controller returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    // Event stream errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Event subscription rejected: {0}")]
    Subscribe(String),

    #[error("Event stream closed")]
    Closed,
}

impl From<reqwest::Error> for ControllerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ControllerError::Parse(e.to_string())
        } else {
            ControllerError::Request(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ControllerError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ControllerError::WebSocket(e.to_string())
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(e: serde_json::Error) -> Self {
        ControllerError::Parse(e.to_string())
    }
}

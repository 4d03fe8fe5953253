//! Effect engine error types

use lightfx_controller::ControllerError;
use thiserror::Error;

/// Coarse error taxonomy reported to callers of start/stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown sequence, effect or palette
    NotFound,
    /// I/O failure talking to the lighting controller
    ControllerUnavailable,
    /// Palette has no color stops
    InvalidPalette,
    /// Sequence name or light membership already taken
    Conflict,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ControllerUnavailable => "controller_unavailable",
            ErrorKind::InvalidPalette => "invalid_palette",
            ErrorKind::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from palette, registry and engine operations
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Sequence not found: {0}")]
    SequenceNotFound(String),

    #[error("Light not found: {0}")]
    LightNotFound(String),

    #[error("Effect not found: {0}")]
    EffectNotFound(String),

    #[error("Palette not found: {0}")]
    PaletteNotFound(String),

    #[error("Palette already registered: {0}")]
    PaletteExists(String),

    #[error("Palette {0} has no color stops")]
    InvalidPalette(String),

    #[error("Controller unavailable: {0}")]
    ControllerUnavailable(#[from] ControllerError),

    #[error("Sequence already exists: {0}")]
    SequenceExists(String),

    #[error("Light {light} already belongs to sequence {sequence}")]
    LightClaimed { light: String, sequence: String },
}

impl FxError {
    /// Map onto the reporting taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            FxError::SequenceNotFound(_)
            | FxError::LightNotFound(_)
            | FxError::EffectNotFound(_)
            | FxError::PaletteNotFound(_) => ErrorKind::NotFound,
            FxError::InvalidPalette(_) => ErrorKind::InvalidPalette,
            FxError::ControllerUnavailable(_) => ErrorKind::ControllerUnavailable,
            FxError::PaletteExists(_)
            | FxError::SequenceExists(_)
            | FxError::LightClaimed { .. } => ErrorKind::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;

use arena_engine::errors::GameError;
use thiserror::Error;

/// Why raw model output could not be turned into an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON object found in the response")]
    NoJson,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("JSON does not describe an action: {0}")]
    Schema(String),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("telemetry writer lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown violation kind: {0}")]
    UnknownViolationKind(String),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that stop a match before or while it runs. Model misbehaviour is
/// never one of these; it becomes a violation instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no model adapter for player {0}")]
    MissingAdapter(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("game engine failed: {0}")]
    Game(#[from] GameError),
}

//! Error types for the CLI application.

use std::fmt;

use arena_core::{RunError, TelemetryError};
use arena_engine::errors::GameError;
use arena_models::AdapterError;

use crate::config::ConfigError;

/// Custom error type for CLI operations.
///
/// Every handler returns this so `run` can map failures to exit codes in
/// one place.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (file operations, stdout/stderr writes, etc.)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// Game engine or match loop error
    Engine(String),

    /// Telemetry file could not be written or read
    Telemetry(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Engine(msg) => write!(f, "Engine error: {}", msg),
            CliError::Telemetry(msg) => write!(f, "Telemetry error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error.to_string())
    }
}

impl From<GameError> for CliError {
    fn from(error: GameError) -> Self {
        CliError::Engine(error.to_string())
    }
}

impl From<RunError> for CliError {
    fn from(error: RunError) -> Self {
        CliError::Engine(error.to_string())
    }
}

impl From<AdapterError> for CliError {
    fn from(error: AdapterError) -> Self {
        CliError::InvalidInput(error.to_string())
    }
}

impl From<TelemetryError> for CliError {
    fn from(error: TelemetryError) -> Self {
        CliError::Telemetry(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure_class() {
        let err = CliError::from(GameError::MatchOver);
        assert!(err.to_string().starts_with("Engine error: "));

        let err = CliError::from(AdapterError::UnknownModel("gpt-x".into()));
        assert!(err.to_string().starts_with("Invalid input: "));
        assert!(err.to_string().contains("gpt-x"));

        let err = CliError::from(ConfigError::Invalid("matches must be >=1".into()));
        assert_eq!(err.to_string(), "Configuration error: matches must be >=1");
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error as _;
        let err = CliError::from(std::io::Error::other("disk full"));
        assert!(err.source().is_some());
        assert!(CliError::Engine("x".into()).source().is_none());
    }
}

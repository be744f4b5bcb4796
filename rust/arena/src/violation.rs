use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Ways a model response can go wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MalformedOutput,
    IllegalMove,
    Timeout,
    EmptyResponse,
    /// Logged for the fidelity report; never forfeits anything by itself.
    InjectionAttempt,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 5] = [
        ViolationKind::MalformedOutput,
        ViolationKind::IllegalMove,
        ViolationKind::Timeout,
        ViolationKind::EmptyResponse,
        ViolationKind::InjectionAttempt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::MalformedOutput => "malformed_output",
            ViolationKind::IllegalMove => "illegal_move",
            ViolationKind::Timeout => "timeout",
            ViolationKind::EmptyResponse => "empty_response",
            ViolationKind::InjectionAttempt => "injection_attempt",
        }
    }

    /// Severity weight added to a player's fidelity total.
    pub fn default_severity(self) -> u32 {
        match self {
            ViolationKind::MalformedOutput | ViolationKind::IllegalMove => 2,
            ViolationKind::Timeout | ViolationKind::EmptyResponse => 1,
            ViolationKind::InjectionAttempt => 3,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ViolationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownViolationKind(s.to_string()))
    }
}

/// One violation attributed to one player on one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: u32,
    pub details: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            details: details.into(),
        }
    }
}

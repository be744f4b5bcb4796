use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown player: {0}")]
    UnknownPlayer(String),
    #[error("it is not {actual}'s turn (expected {expected})")]
    NotPlayersTurn { expected: String, actual: String },
    #[error("match is already over")]
    MatchOver,
    #[error("illegal action: {0}")]
    IllegalAction(String),
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

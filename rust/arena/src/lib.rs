//! # arena-core: referee and match loop for model-vs-model games
//!
//! Drives any [`arena_engine::game::Game`] between two
//! [`arena_models::ModelAdapter`]s. Model output is parsed, validated and,
//! when it misbehaves, resolved by an escalating referee: one retry, then a
//! turn forfeit with the game's fallback move, then a match forfeit once a
//! player runs out of strikes.
//!
//! ## Core Modules
//!
//! - [`runner`] - `MatchRunner`, the per-match loop
//! - [`referee`] - Retry budgets, strikes and the fidelity report
//! - [`shot_clock`] - Response budgets and the stuck-loop detector
//! - [`parser`] - JSON extraction and injection detection
//! - [`telemetry`] - Turn/match records and JSONL sinks
//! - [`violation`] - Violation kinds and severities
//! - [`logging`] - `tracing` setup and a capturing test subscriber
//!
//! ## Quick Start
//!
//! ```rust
//! use arena_core::runner::{MatchConfig, MatchRunner, Seats};
//! use arena_core::telemetry::{MatchRuling, MemorySink};
//! use arena_engine::engine::{HoldemConfig, HoldemEngine};
//! use arena_models::create_adapter;
//!
//! let config = MatchConfig::default();
//! let sink = MemorySink::new();
//! let mut game = HoldemEngine::new("alice", "bob", HoldemConfig::default(), 1).unwrap();
//! let mut seats = Seats::new();
//! seats.insert("alice".to_string(), create_adapter("baseline", 1).unwrap());
//! seats.insert("bob".to_string(), create_adapter("baseline", 2).unwrap());
//!
//! let summary = MatchRunner::new(&config, &sink).run("demo", &mut game, 1, &seats).unwrap();
//! assert_eq!(summary.ruling, MatchRuling::Completed);
//! assert_eq!(summary.scores.values().sum::<f64>(), 2_000.0);
//! ```

pub mod errors;
pub mod logging;
pub mod parser;
pub mod referee;
pub mod runner;
pub mod shot_clock;
pub mod telemetry;
pub mod violation;

pub use errors::{ConfigError, ParseError, RunError, TelemetryError};
pub use referee::{EscalationConfig, Referee, Ruling};
pub use runner::{MatchConfig, MatchRunner, Seats};

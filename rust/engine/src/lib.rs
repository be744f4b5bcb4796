//! # arena-engine: game contract and reference hold'em engine
//!
//! Defines the [`game::Game`] contract every refereed game implements, plus
//! a deterministic heads-up pot-limit Texas Hold'em engine that implements
//! it. All randomness flows from a match seed so any match can be replayed.
//!
//! ## Core Modules
//!
//! - [`game`] - The `Game` trait, `ValidationResult` and `Highlight`
//! - [`engine`] - `HoldemEngine`, the pot-limit hold'em state machine
//! - [`rules`] - Call amounts, pot-limit raise bounds and blind schedule
//! - [`player`] - Wire-format `Action` and per-seat chip state
//! - [`cards`] / [`deck`] - Cards and the seeded, cursor-dealt deck
//! - [`hand`] - Best-five-card hand evaluation
//! - [`history`] - Streets and completed-hand records
//! - [`errors`] - `GameError`
//!
//! ## Quick Start
//!
//! ```rust
//! use arena_engine::engine::{HoldemConfig, HoldemEngine};
//! use arena_engine::game::Game;
//!
//! let mut engine = HoldemEngine::new("p1", "p2", HoldemConfig::default(), 42).unwrap();
//! while let Some(player) = engine.current_player().map(str::to_string) {
//!     // every turn forfeited: checks when free, folds otherwise
//!     engine.forfeit_turn(&player).unwrap();
//! }
//! let total: f64 = engine.get_scores().values().sum();
//! assert_eq!(total, 2_000.0);
//! ```

pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod hand;
pub mod history;
pub mod player;
pub mod rules;

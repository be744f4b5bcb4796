//! Deal command: shows the table right after the first hand is dealt.

use std::io::Write;

use arena_engine::engine::{HoldemConfig, HoldemEngine};
use arena_engine::game::Game;

use crate::error::CliError;

/// Handle the deal command.
///
/// Builds a default hold'em match from `seed` (random when unset) and prints
/// its full state snapshot, hidden cards included, as pretty JSON.
pub fn handle_deal_command(seed: Option<u64>, out: &mut dyn Write) -> Result<(), CliError> {
    let seed = seed.unwrap_or_else(rand::random);
    let engine = HoldemEngine::new("p0", "p1", HoldemConfig::default(), seed)?;
    let snapshot = engine.get_state_snapshot();
    let json_str = serde_json::to_string_pretty(&snapshot).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

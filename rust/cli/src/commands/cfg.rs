//! Configuration command handler.
//!
//! Prints the resolved configuration as JSON, each entry paired with the
//! layer that set it:
//!
//! ```json
//! {
//!   "seed": {
//!     "value": 7,
//!     "source": "env"
//!   },
//!   ...
//! }
//! ```

use std::io::Write;
use std::path::Path;

use crate::config;
use crate::error::CliError;

/// Handle the cfg command.
///
/// # Errors
///
/// Returns `CliError::Config` if the configuration cannot be loaded or is
/// invalid, and `CliError::Io` if writing to `out` fails.
pub fn handle_cfg_command(path: Option<&Path>, out: &mut dyn Write) -> Result<(), CliError> {
    let config::ConfigResolved { config, sources } = config::load_with_sources(path)?;
    let m = &config.match_config;
    let display = serde_json::json!({
        "event": {
            "value": config.event,
            "source": sources.event,
        },
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "matches": {
            "value": config.matches,
            "source": sources.matches,
        },
        "players": {
            "value": config.players,
            "source": sources.players,
        },
        "max_turns": {
            "value": m.max_turns,
            "source": sources.max_turns,
        },
        "max_tokens": {
            "value": m.max_tokens,
            "source": sources.max_tokens,
        },
        "timeout_s": {
            "value": m.timeout_s,
            "source": sources.timeout_s,
        },
        "stuck_loop_limit": {
            "value": m.stuck_loop_limit,
            "source": sources.stuck_loop_limit,
        },
        "holdem": {
            "value": config.holdem,
            "source": sources.holdem,
        },
        "max_hands": {
            "value": config.holdem.max_hands,
            "source": sources.max_hands,
        },
        "escalation": {
            "value": m.escalation.clone().unwrap_or_default(),
            "source": sources.escalation,
        },
        "shot_clock": {
            "value": m.shot_clock,
            "source": sources.shot_clock,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

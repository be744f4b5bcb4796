//! Command handler modules for the arena CLI.
//!
//! Each subcommand lives in its own module and exposes one
//! `handle_COMMAND_command(...) -> Result<(), CliError>` function. Output
//! streams are passed in as `&mut dyn Write` so tests can capture them.

mod cfg;
mod deal;
mod run;
mod stats;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use run::{handle_run_command, RunOptions};
pub use stats::handle_stats_command;

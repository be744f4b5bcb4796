//! # Arena CLI Library
//!
//! Command-line front end for the model arena: runs refereed matches between
//! model adapters, and inspects the telemetry they leave behind.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line
//! arguments and executes the appropriate subcommand.
//!
//! ## Available Subcommands
//!
//! - `run`: Play matches and append telemetry to a JSONL file
//! - `cfg`: Display the resolved configuration and where each value came from
//! - `stats`: Aggregate a telemetry file
//! - `deal`: Show the table state of a freshly dealt match

use std::io::Write;

use clap::Parser;

pub mod cli;
mod commands;
pub mod config;
mod error;
pub mod exit_code;
pub mod ui;

use cli::{ArenaCli, Commands};
use commands::{
    handle_cfg_command, handle_deal_command, handle_run_command, handle_stats_command, RunOptions,
};

pub use error::CliError;

const COMMANDS: &[&str] = &["run", "cfg", "stats", "deal"];

/// Main entry point for the CLI application.
///
/// Parses command-line arguments and dispatches to the appropriate
/// subcommand handler.
///
/// # Returns
///
/// Exit code: `0` for success, `2` for errors
///
/// # Example
///
/// ```
/// use std::io;
/// let args = vec!["arena", "deal", "--seed", "42"];
/// let code = arena_cli::run(args, &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match ArenaCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return usage_error(e, out, err),
    };

    // a subscriber may already be installed when `run` is called repeatedly
    let _ = arena_core::logging::init_logging(&cli.log_level, cli.log_format.into());

    let result = match cli.cmd {
        Commands::Run {
            config,
            seed,
            matches,
            output,
            parallel,
        } => handle_run_command(
            RunOptions {
                config,
                seed,
                matches,
                output,
                parallel,
            },
            out,
            err,
        ),
        Commands::Cfg { config } => handle_cfg_command(config.as_deref(), out),
        Commands::Stats { input } => handle_stats_command(&input, out, err),
        Commands::Deal { seed } => handle_deal_command(seed, out),
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            let _ = ui::write_error(err, &e.to_string());
            exit_code::ERROR
        }
    }
}

fn usage_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    // Help and version should print to stdout and exit 0
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        if write!(out, "{}", e).is_err() {
            return exit_code::ERROR;
        }
        return exit_code::SUCCESS;
    }

    if writeln!(err, "{}", e).is_err()
        || writeln!(err).is_err()
        || writeln!(err, "Usage: arena <command> [options]\n").is_err()
        || writeln!(err, "Commands:").is_err()
    {
        return exit_code::ERROR;
    }
    for c in COMMANDS {
        if writeln!(err, "  {}", c).is_err() {
            return exit_code::ERROR;
        }
    }
    let _ = writeln!(err, "\nFor full help, run: arena --help");
    exit_code::ERROR
}

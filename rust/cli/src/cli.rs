//! Command-line argument definitions.

use std::path::PathBuf;

use arena_core::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "arena",
    version,
    about = "Referee for model-vs-model heads-up hold'em matches"
)]
pub struct ArenaCli {
    /// Log filter directive; `RUST_LOG` takes precedence when set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play matches and append their telemetry to a JSONL file
    Run {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        matches: Option<u32>,
        #[arg(long, default_value = "arena_telemetry.jsonl")]
        output: PathBuf,
        /// Run every match on its own thread
        #[arg(long)]
        parallel: bool,
    },
    /// Print the resolved configuration with the source of each value
    Cfg {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Summarise a telemetry file
    Stats {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the table state of a freshly dealt match
    Deal {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

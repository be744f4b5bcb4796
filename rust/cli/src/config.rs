//! Layered run configuration: defaults, then a TOML file, then environment
//! overrides. Every value remembers which layer set it.
//!
//! ```toml
//! [match]
//! event = "holdem"
//! seed = 7
//! matches = 4
//! players = [
//!     { id = "alpha", model = "baseline" },
//!     { id = "beta", model = "chaos:0.3" },
//! ]
//!
//! [holdem]
//! starting_stack = 500
//! max_hands = 25
//!
//! [escalation]
//! turn_forfeit_threshold = 2
//! match_forfeit_threshold = 3
//!
//! [shot_clock]
//! default_ms = 5000
//! per_model = { chaos = 200 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use arena_core::referee::EscalationConfig;
use arena_core::runner::MatchConfig;
use arena_core::shot_clock::ShotClockConfig;
use arena_engine::engine::HoldemConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "ARENA_CONFIG";
pub const SEED_ENV: &str = "ARENA_SEED";
pub const HANDS_ENV: &str = "ARENA_HANDS";
pub const SHOT_CLOCK_ENV: &str = "ARENA_SHOT_CLOCK_MS";
pub const MAX_TOKENS_ENV: &str = "ARENA_MAX_TOKENS";

/// A seat and the model spec that plays it, as accepted by
/// [`arena_models::create_adapter`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSpec {
    pub id: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub event: String,
    pub seed: Option<u64>,
    pub matches: u32,
    pub players: Vec<PlayerSpec>,
    pub match_config: MatchConfig,
    pub holdem: HoldemConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event: "holdem".into(),
            seed: None,
            matches: 1,
            players: vec![
                PlayerSpec {
                    id: "alpha".into(),
                    model: "baseline".into(),
                },
                PlayerSpec {
                    id: "beta".into(),
                    model: "baseline".into(),
                },
            ],
            match_config: MatchConfig::default(),
            holdem: HoldemConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    #[default]
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSources {
    pub event: ValueSource,
    pub seed: ValueSource,
    pub matches: ValueSource,
    pub players: ValueSource,
    pub max_turns: ValueSource,
    pub max_tokens: ValueSource,
    pub timeout_s: ValueSource,
    pub stuck_loop_limit: ValueSource,
    pub holdem: ValueSource,
    pub max_hands: ValueSource,
    pub escalation: ValueSource,
    pub shot_clock: ValueSource,
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolve the configuration. `path` wins over `ARENA_CONFIG`.
pub fn load_with_sources(path: Option<&Path>) -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    let file_path = path
        .map(Path::to_path_buf)
        .or_else(|| env_value(CONFIG_ENV).map(PathBuf::from));
    if let Some(path) = file_path {
        let s = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let f: FileConfig = toml::from_str(&s)?;
        apply_file(f, &mut cfg, &mut sources);
    }

    if let Some(seed) = env_value(SEED_ENV) {
        cfg.seed = Some(parse_env(SEED_ENV, &seed)?);
        sources.seed = ValueSource::Env;
    }
    if let Some(hands) = env_value(HANDS_ENV) {
        cfg.holdem.max_hands = parse_env(HANDS_ENV, &hands)?;
        sources.max_hands = ValueSource::Env;
    }
    if let Some(ms) = env_value(SHOT_CLOCK_ENV) {
        cfg.match_config.shot_clock.default_ms = Some(parse_env(SHOT_CLOCK_ENV, &ms)?);
        sources.shot_clock = ValueSource::Env;
    }
    if let Some(tokens) = env_value(MAX_TOKENS_ENV) {
        cfg.match_config.max_tokens = parse_env(MAX_TOKENS_ENV, &tokens)?;
        sources.max_tokens = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default, rename = "match")]
    match_section: Option<MatchSection>,
    #[serde(default)]
    holdem: Option<HoldemSection>,
    #[serde(default)]
    escalation: Option<EscalationConfig>,
    #[serde(default)]
    shot_clock: Option<ShotClockConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchSection {
    event: Option<String>,
    seed: Option<u64>,
    matches: Option<u32>,
    max_turns: Option<u32>,
    max_tokens: Option<u32>,
    timeout_s: Option<u64>,
    stuck_loop_limit: Option<usize>,
    players: Option<Vec<PlayerSpec>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HoldemSection {
    starting_stack: Option<u32>,
    small_blind: Option<u32>,
    big_blind: Option<u32>,
    max_hands: Option<u32>,
    level_up_every: Option<u32>,
}

fn apply_file(f: FileConfig, cfg: &mut Config, sources: &mut ConfigSources) {
    if let Some(m) = f.match_section {
        if let Some(v) = m.event {
            cfg.event = v;
            sources.event = ValueSource::File;
        }
        if let Some(v) = m.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = m.matches {
            cfg.matches = v;
            sources.matches = ValueSource::File;
        }
        if let Some(v) = m.max_turns {
            cfg.match_config.max_turns = Some(v);
            sources.max_turns = ValueSource::File;
        }
        if let Some(v) = m.max_tokens {
            cfg.match_config.max_tokens = v;
            sources.max_tokens = ValueSource::File;
        }
        if let Some(v) = m.timeout_s {
            cfg.match_config.timeout_s = v;
            sources.timeout_s = ValueSource::File;
        }
        if let Some(v) = m.stuck_loop_limit {
            cfg.match_config.stuck_loop_limit = v;
            sources.stuck_loop_limit = ValueSource::File;
        }
        if let Some(v) = m.players {
            cfg.players = v;
            sources.players = ValueSource::File;
        }
    }

    if let Some(h) = f.holdem {
        let table = &mut cfg.holdem;
        let mut touched = false;
        for (slot, value) in [
            (&mut table.starting_stack, h.starting_stack),
            (&mut table.small_blind, h.small_blind),
            (&mut table.big_blind, h.big_blind),
        ] {
            if let Some(v) = value {
                *slot = v;
                touched = true;
            }
        }
        if let Some(v) = h.level_up_every {
            table.level_up_every = Some(v);
            touched = true;
        }
        if touched {
            sources.holdem = ValueSource::File;
        }
        if let Some(v) = h.max_hands {
            table.max_hands = v;
            sources.max_hands = ValueSource::File;
        }
    }

    if let Some(e) = f.escalation {
        cfg.match_config.escalation = Some(e);
        sources.escalation = ValueSource::File;
    }
    if let Some(s) = f.shot_clock {
        cfg.match_config.shot_clock = s;
        sources.shot_clock = ValueSource::File;
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::Invalid(format!("Invalid configuration: {}", msg)));
    if cfg.event.trim().is_empty() {
        return invalid("event must not be empty".into());
    }
    if cfg.matches == 0 {
        return invalid("matches must be >=1".into());
    }
    if cfg.players.len() != 2 {
        return invalid(format!("exactly 2 players required, got {}", cfg.players.len()));
    }
    if cfg.players[0].id == cfg.players[1].id {
        return invalid(format!("duplicate player id {}", cfg.players[0].id));
    }
    if let Some(p) = cfg.players.iter().find(|p| p.model.trim().is_empty()) {
        return invalid(format!("player {} has no model", p.id));
    }
    if let Err(e) = cfg.holdem.validate() {
        return invalid(e.to_string());
    }
    if let Err(e) = cfg.match_config.validate() {
        return invalid(e.to_string());
    }
    Ok(())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {}: {}", name, value)))
}

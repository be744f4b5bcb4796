//! # arena-models: model adapters for refereed matches
//!
//! The match loop only sees models through [`ModelAdapter`]: send a prompt,
//! get back text plus token counts and a reported latency. Real provider
//! clients live outside this workspace; the adapters here are local and
//! deterministic so whole matches can be replayed from a seed.
//!
//! ## Core Components
//!
//! - [`ModelAdapter`] - The query capability the match loop depends on
//! - [`baseline`] - Rule-based hold'em player that reads the prompt text
//! - [`chaos`] - Seeded adapter that mixes in malformed and abusive output
//! - [`scripted`] - Replays canned responses
//! - [`create_adapter`] - Factory from a model spec string
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use arena_models::{create_adapter, ModelAdapter};
//!
//! let model = create_adapter("baseline", 7).unwrap();
//! let prompt = "Your hole cards: As Ad\nBoard: -\nPot: 3\nLegal actions:\n- fold\n- call (cost: 1)\n- raise (to: 4-6)\n";
//! let reply = model.query(prompt, 256, Duration::from_secs(5)).unwrap();
//! assert!(reply.text.contains("\"raise\""));
//! ```
//!
//! ## Model Specs
//!
//! - `"baseline"` - [`baseline::BaselineAdapter`]
//! - `"chaos"` or `"chaos:RATE"` - [`chaos::ChaosAdapter`] with fault rate 0..=1
//! - `"scripted:PATH"` - [`scripted::ScriptedAdapter`] replaying one response per line of PATH

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod baseline;
pub mod chaos;
pub mod scripted;

/// What a model returned for one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Latency as reported by the adapter. The match loop also measures
    /// wall time and uses whichever is larger.
    pub latency_ms: u64,
}

impl ModelResponse {
    pub fn new(prompt: &str, text: impl Into<String>, latency_ms: u64) -> Self {
        let text = text.into();
        Self {
            input_tokens: estimate_tokens(prompt),
            output_tokens: estimate_tokens(&text),
            text,
            reasoning: None,
            latency_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("model did not answer within {0} ms")]
    Timeout(u64),
    #[error("{0} has no responses left")]
    Exhausted(String),
    #[error("unknown model spec: {0}")]
    UnknownModel(String),
    #[error("cannot load model script {path}: {reason}")]
    Script { path: String, reason: String },
}

/// A model the referee can query.
///
/// Implementations must be shareable across match threads; adapters with
/// internal state (a script cursor, an RNG) guard it themselves.
///
/// # Example Implementation
///
/// ```rust
/// use std::time::Duration;
/// use arena_models::{AdapterError, ModelAdapter, ModelResponse};
///
/// struct AlwaysFold;
///
/// impl ModelAdapter for AlwaysFold {
///     fn model_id(&self) -> &str {
///         "always-fold"
///     }
///
///     fn query(&self, prompt: &str, _max_tokens: u32, _timeout: Duration) -> Result<ModelResponse, AdapterError> {
///         Ok(ModelResponse::new(prompt, r#"{"action": "fold"}"#, 0))
///     }
/// }
/// ```
pub trait ModelAdapter: Send + Sync {
    /// Stable identifier reported in telemetry and used for per-model
    /// shot-clock overrides.
    fn model_id(&self) -> &str;

    /// Ask the model to respond to `prompt`. `timeout` is advisory: the
    /// referee measures latency after the fact and never cancels a call.
    fn query(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<ModelResponse, AdapterError>;
}

/// Rough token count used by the local adapters: one token per
/// whitespace-separated word.
pub fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Build an adapter from a model spec such as `baseline`, `chaos:0.3` or
/// `scripted:replies.txt`. `seed` feeds adapters that draw randomness.
///
/// ```rust
/// use arena_models::create_adapter;
///
/// assert_eq!(create_adapter("chaos:0.5", 1).unwrap().model_id(), "chaos");
/// assert!(create_adapter("gpt-9", 1).is_err());
/// ```
pub fn create_adapter(spec: &str, seed: u64) -> Result<Box<dyn ModelAdapter>, AdapterError> {
    let spec = spec.trim();
    let (name, arg) = match spec.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (spec, None),
    };
    match (name, arg) {
        ("baseline", None) => Ok(Box::new(baseline::BaselineAdapter::new())),
        ("chaos", None) => Ok(Box::new(chaos::ChaosAdapter::new(seed))),
        ("chaos", Some(rate)) => {
            let rate: f64 = rate
                .parse()
                .map_err(|_| AdapterError::UnknownModel(spec.to_string()))?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(AdapterError::UnknownModel(spec.to_string()));
            }
            Ok(Box::new(chaos::ChaosAdapter::new(seed).with_fault_rate(rate)))
        }
        ("scripted", Some(path)) => Ok(Box::new(scripted::ScriptedAdapter::from_file(path)?)),
        _ => Err(AdapterError::UnknownModel(spec.to_string())),
    }
}

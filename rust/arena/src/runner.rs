//! The match loop: prompts, queries, gates, rulings and telemetry.
//!
//! One [`MatchRunner::run`] call plays one match to the end on the calling
//! thread. Each turn passes through the same gates in order, stopping at the
//! first failure: adapter error, empty response, shot clock, JSON parse,
//! game legality. A failing first response may earn one retry; an
//! unresolved failure forfeits the turn through the game's fallback and the
//! referee's strike count.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use arena_engine::game::{Game, PlayerId};
use arena_models::ModelAdapter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::errors::{ConfigError, RunError};
use crate::parser::{detect_injection, normalize_identity, parse_action};
use crate::referee::{EscalationConfig, Referee, Ruling};
use crate::shot_clock::{shot_clock_notice, ShotClockConfig, StuckLoopDetector, STUCK_LOOP_LIMIT};
use crate::telemetry::{
    ForfeitCause, ForfeitDetails, MatchRuling, MatchSummary, TelemetrySink, TurnOutcome, TurnRecord,
};
use crate::violation::ViolationKind;

/// Per-match loop settings shared by every match in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub max_tokens: u32,
    /// Advisory request timeout handed to adapters.
    pub timeout_s: u64,
    /// Hard cap on turns; the match ends as completed when reached.
    pub max_turns: Option<u32>,
    /// Escalation thresholds. Unset means one retry then forfeit the turn,
    /// with no match forfeiture.
    pub escalation: Option<EscalationConfig>,
    pub shot_clock: ShotClockConfig,
    pub stuck_loop_limit: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            timeout_s: 30,
            max_turns: Some(5_000),
            escalation: None,
            shot_clock: ShotClockConfig::default(),
            stuck_loop_limit: STUCK_LOOP_LIMIT,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::invalid("match.max_tokens", "must be >=1"));
        }
        if self.max_turns == Some(0) {
            return Err(ConfigError::invalid("match.max_turns", "must be >=1"));
        }
        if self.stuck_loop_limit == 0 {
            return Err(ConfigError::invalid("match.stuck_loop_limit", "must be >=1"));
        }
        if let Some(escalation) = &self.escalation {
            escalation.validate()?;
        }
        self.shot_clock.validate()
    }
}

/// Model adapters keyed by the player id they play as.
pub type Seats = BTreeMap<PlayerId, Box<dyn ModelAdapter>>;

/// Runs matches against a shared telemetry sink.
pub struct MatchRunner<'a> {
    config: &'a MatchConfig,
    sink: &'a dyn TelemetrySink,
}

impl<'a> MatchRunner<'a> {
    pub fn new(config: &'a MatchConfig, sink: &'a dyn TelemetrySink) -> Self {
        Self { config, sink }
    }

    /// Reset `game` from `seed` and play it to the end.
    ///
    /// Emits one turn record per turn and exactly one match summary, which
    /// is also returned. Errors only come from configuration, a missing
    /// adapter, or the game failing to apply its own fallback.
    pub fn run<G: Game>(
        &self,
        match_id: &str,
        game: &mut G,
        seed: u64,
        seats: &Seats,
    ) -> Result<MatchSummary, RunError> {
        self.config.validate()?;
        let _span = info_span!("match", match_id, seed).entered();

        game.reset(seed)?;
        let players = game.players().to_vec();
        if let Some(missing) = players.iter().find(|p| !seats.contains_key(*p)) {
            return Err(RunError::MissingAdapter(missing.clone()));
        }
        let player_models: BTreeMap<PlayerId, String> = players
            .iter()
            .filter_map(|p| seats.get(p).map(|a| (p.clone(), a.model_id().to_string())))
            .collect();
        info!(event = game.event_name(), players = ?players, "match started");

        let mut state = MatchState {
            match_id,
            config: self.config,
            sink: self.sink,
            game,
            seats,
            referee: Referee::new(&players, self.config.escalation.clone().unwrap_or_default()),
            detector: StuckLoopDetector::new(self.config.stuck_loop_limit),
            turn: 0,
        };

        let mut forfeit = None;
        let mut turn_cap_reached = false;
        while !state.game.is_terminal() {
            let Some(player) = state.game.current_player().map(str::to_string) else {
                break;
            };
            if self.config.max_turns.is_some_and(|cap| state.turn >= cap) {
                warn!(turns = state.turn, "turn cap reached, ending match");
                turn_cap_reached = true;
                break;
            }
            state.turn += 1;
            if let Some(details) = state.play_turn(&player)? {
                forfeit = Some(details);
                break;
            }
        }

        let scores = match &forfeit {
            Some(f) => state.game.forfeit_scores(&f.player),
            None => state.game.get_scores(),
        };
        let mut extras = BTreeMap::new();
        if turn_cap_reached {
            extras.insert("turn_cap_reached".to_string(), serde_json::Value::Bool(true));
        }
        let summary = MatchSummary {
            event: state.game.event_name().to_string(),
            seed,
            scores,
            fidelity: state.referee.fidelity_report(),
            player_models,
            highlights: state.game.highlights(),
            ruling: if forfeit.is_some() {
                MatchRuling::MatchForfeit
            } else {
                MatchRuling::Completed
            },
            forfeit,
            turns: state.turn,
            extras,
            finished_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.sink.finalize_match(match_id, &summary) {
            warn!(match_id, error = %e, "telemetry sink rejected match summary");
        }
        info!(ruling = ?summary.ruling, turns = summary.turns, "match finished");
        Ok(summary)
    }
}

/// Model output for one query, whatever the verdict.
#[derive(Debug, Default)]
struct Attempt {
    prompt: String,
    raw: String,
    parsed: Option<serde_json::Value>,
    input_tokens: u32,
    output_tokens: u32,
    latency_ms: u64,
    time_exceeded: bool,
}

#[derive(Debug)]
struct Rejection {
    kind: ViolationKind,
    details: String,
    /// Normalised identity of the offending output, for the stuck-loop
    /// fingerprint.
    identity: String,
}

impl Rejection {
    fn new(kind: ViolationKind, details: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            identity: identity.into(),
        }
    }

    /// Kinds that forfeit the turn without a retry.
    fn skips_retry(&self) -> bool {
        matches!(self.kind, ViolationKind::Timeout | ViolationKind::EmptyResponse)
    }
}

struct MatchState<'m, G: Game> {
    match_id: &'m str,
    config: &'m MatchConfig,
    sink: &'m dyn TelemetrySink,
    game: &'m mut G,
    seats: &'m Seats,
    referee: Referee,
    detector: StuckLoopDetector,
    turn: u32,
}

impl<G: Game> MatchState<'_, G> {
    fn play_turn(&mut self, player: &str) -> Result<Option<ForfeitDetails>, RunError> {
        self.referee.new_turn();
        let seats = self.seats;
        let adapter = seats
            .get(player)
            .ok_or_else(|| RunError::MissingAdapter(player.to_string()))?
            .as_ref();
        let budget = self.config.shot_clock.budget_for(adapter.model_id());

        let mut prompt = self.game.get_prompt(player);
        if let Some(ms) = budget {
            prompt.push_str(&shot_clock_notice(ms));
        }

        let (mut attempt, mut verdict) = self.attempt(player, adapter, prompt, budget);
        let mut retried = false;
        if let Err(rejection) = &verdict {
            let ruling = if rejection.skips_retry() {
                self.referee.note_violation(
                    player,
                    rejection.kind,
                    rejection.kind.default_severity(),
                    &rejection.details,
                );
                Ruling::ForfeitTurn
            } else {
                self.referee.record_violation(
                    player,
                    rejection.kind,
                    rejection.kind.default_severity(),
                    &rejection.details,
                )
            };
            if self.detector.observe(player, rejection.kind, &rejection.identity) {
                return Ok(Some(self.stuck_loop(player, adapter, attempt, rejection.kind, retried)));
            }

            if ruling == Ruling::Retry {
                debug!(player, turn = self.turn, reason = %rejection.details, "retrying turn");
                retried = true;
                let retry_prompt = self.game.get_retry_prompt(player, &rejection.details);
                let (second, second_verdict) = self.attempt(player, adapter, retry_prompt, None);
                let (input_tokens, output_tokens) = (attempt.input_tokens, attempt.output_tokens);
                attempt = second;
                attempt.input_tokens += input_tokens;
                attempt.output_tokens += output_tokens;
                verdict = second_verdict;

                if let Err(again) = &verdict {
                    self.referee.record_violation(
                        player,
                        again.kind,
                        again.kind.default_severity(),
                        &again.details,
                    );
                    if self.detector.observe(player, again.kind, &again.identity) {
                        let kind = again.kind;
                        return Ok(Some(self.stuck_loop(player, adapter, attempt, kind, retried)));
                    }
                }
            }
        }

        let rejection = match verdict {
            Ok(action) => match self.game.apply_action(player, &action) {
                Ok(()) => {
                    self.detector.clear(player);
                    self.log_turn(
                        player,
                        adapter,
                        attempt,
                        TurnOutcome::Legal,
                        None,
                        None,
                        None,
                        retried,
                    );
                    return Ok(None);
                }
                Err(e) => {
                    // validated but refused: treat as an illegal move with no retry
                    let rejection = Rejection::new(
                        ViolationKind::IllegalMove,
                        e.to_string(),
                        self.game.action_identity(&action),
                    );
                    self.referee.note_violation(
                        player,
                        rejection.kind,
                        rejection.kind.default_severity(),
                        &rejection.details,
                    );
                    rejection
                }
            },
            Err(rejection) => rejection,
        };
        self.forfeit_turn(player, adapter, attempt, rejection, retried)
    }

    fn attempt(
        &mut self,
        player: &str,
        adapter: &dyn ModelAdapter,
        prompt: String,
        budget: Option<u64>,
    ) -> (Attempt, Result<G::Action, Rejection>) {
        let started = Instant::now();
        let result = adapter.query(
            &prompt,
            self.config.max_tokens,
            Duration::from_secs(self.config.timeout_s),
        );
        let measured = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut attempt = Attempt {
            prompt,
            latency_ms: measured,
            ..Attempt::default()
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(player, turn = self.turn, error = %e, "model query failed");
                let details = format!("model query failed: {}", e);
                return (attempt, Err(Rejection::new(ViolationKind::EmptyResponse, details, "")));
            }
        };
        attempt.raw = response.text;
        attempt.input_tokens = response.input_tokens;
        attempt.output_tokens = response.output_tokens;
        attempt.latency_ms = measured.max(response.latency_ms);

        if attempt.raw.trim().is_empty() {
            return (
                attempt,
                Err(Rejection::new(ViolationKind::EmptyResponse, "empty response", "")),
            );
        }
        if let Some(marker) = detect_injection(&attempt.raw) {
            warn!(player, turn = self.turn, marker, "prompt injection attempt");
            let kind = ViolationKind::InjectionAttempt;
            self.referee
                .note_violation(player, kind, kind.default_severity(), marker);
        }
        if let Some(limit) = budget.filter(|&limit| attempt.latency_ms > limit) {
            attempt.time_exceeded = true;
            let details = format!(
                "responded in {} ms, over the {} ms shot clock",
                attempt.latency_ms, limit
            );
            let identity = normalize_identity(&attempt.raw);
            return (attempt, Err(Rejection::new(ViolationKind::Timeout, details, identity)));
        }

        let action: G::Action = match parse_action(&attempt.raw) {
            Ok(action) => action,
            Err(e) => {
                let identity = normalize_identity(&attempt.raw);
                return (
                    attempt,
                    Err(Rejection::new(ViolationKind::MalformedOutput, e.to_string(), identity)),
                );
            }
        };
        attempt.parsed = serde_json::to_value(&action).ok();

        let verdict = self.game.validate_action(player, &action);
        if !verdict.legal {
            let reason = verdict.reason.unwrap_or_else(|| "illegal move".to_string());
            let identity = self.game.action_identity(&action);
            return (attempt, Err(Rejection::new(ViolationKind::IllegalMove, reason, identity)));
        }
        (attempt, Ok(action))
    }

    fn forfeit_turn(
        &mut self,
        player: &str,
        adapter: &dyn ModelAdapter,
        attempt: Attempt,
        rejection: Rejection,
        retried: bool,
    ) -> Result<Option<ForfeitDetails>, RunError> {
        let fallback = self.game.forfeit_turn(player)?;
        let ruling = self.referee.record_turn_forfeit(player, rejection.kind);
        info!(
            player,
            turn = self.turn,
            kind = %rejection.kind,
            reason = %rejection.details,
            fallback = ?fallback,
            "turn forfeited"
        );
        let fallback = serde_json::to_value(&fallback).ok();
        self.log_turn(
            player,
            adapter,
            attempt,
            TurnOutcome::Forfeit,
            Some(rejection.kind),
            Some(ruling),
            fallback,
            retried,
        );

        if ruling != Ruling::ForfeitMatch {
            return Ok(None);
        }
        Ok(Some(ForfeitDetails {
            player: player.to_string(),
            winner: self.opponent_of(player),
            cause: ForfeitCause::Referee,
            strikes: self.referee.get_strikes(player),
        }))
    }

    fn stuck_loop(
        &mut self,
        player: &str,
        adapter: &dyn ModelAdapter,
        attempt: Attempt,
        kind: ViolationKind,
        retried: bool,
    ) -> ForfeitDetails {
        warn!(player, turn = self.turn, kind = %kind, "same violation repeated, match forfeited");
        self.log_turn(
            player,
            adapter,
            attempt,
            TurnOutcome::Forfeit,
            Some(kind),
            Some(Ruling::ForfeitMatch),
            None,
            retried,
        );
        ForfeitDetails {
            player: player.to_string(),
            winner: self.opponent_of(player),
            cause: ForfeitCause::StuckLoop,
            strikes: self.referee.get_strikes(player),
        }
    }

    fn opponent_of(&self, player: &str) -> PlayerId {
        self.game
            .players()
            .iter()
            .find(|p| p.as_str() != player)
            .cloned()
            .unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    fn log_turn(
        &self,
        player: &str,
        adapter: &dyn ModelAdapter,
        attempt: Attempt,
        outcome: TurnOutcome,
        violation: Option<ViolationKind>,
        ruling: Option<Ruling>,
        fallback_action: Option<serde_json::Value>,
        retried: bool,
    ) {
        let model = adapter.model_id();
        let record = TurnRecord {
            turn: self.turn,
            player: player.to_string(),
            model: model.to_string(),
            prompt: attempt.prompt,
            raw_output: attempt.raw,
            parse_success: attempt.parsed.is_some(),
            parsed_action: attempt.parsed,
            fallback_action,
            validation_result: outcome,
            violation,
            ruling,
            retried,
            state: self.game.get_state_snapshot(),
            input_tokens: attempt.input_tokens,
            output_tokens: attempt.output_tokens,
            latency_ms: attempt.latency_ms,
            time_limit_ms: self.config.shot_clock.budget_for(model),
            time_exceeded: attempt.time_exceeded,
            cumulative_strikes: self.referee.get_strikes(player),
            strike_limit: self.referee.strike_limit(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.sink.log_turn(self.match_id, &record) {
            warn!(
                match_id = self.match_id,
                turn = self.turn,
                error = %e,
                "telemetry sink rejected turn record"
            );
        }
    }
}

//! Run command: plays a batch of matches and appends their telemetry.
//!
//! Match seeds are drawn from a ChaCha20 stream keyed by the run seed, so a
//! run seed reproduces every match in the batch. Each match owns its engine
//! and adapters; the only thing matches share is the telemetry sink.

use std::io::Write;
use std::path::PathBuf;

use arena_core::runner::{MatchRunner, Seats};
use arena_core::telemetry::{ForfeitCause, JsonlSink, MatchRuling, MatchSummary};
use arena_engine::engine::HoldemEngine;
use arena_models::create_adapter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{error, info};

use crate::config::{self, Config};
use crate::error::CliError;
use crate::ui;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub matches: Option<u32>,
    pub output: PathBuf,
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MatchPlan {
    match_id: String,
    seed: u64,
}

fn plan_matches(event: &str, run_seed: u64, matches: u32) -> Vec<MatchPlan> {
    let mut rng = ChaCha20Rng::seed_from_u64(run_seed);
    (1..=matches)
        .map(|index| {
            let seed = rng.random::<u64>();
            MatchPlan {
                match_id: format!("{}-{:04}-{}", event, index, seed),
                seed,
            }
        })
        .collect()
}

/// Handle the run command.
///
/// Prints one line per match, in plan order, whether matches ran in
/// parallel or not. A failed match does not stop the others; the command
/// fails afterwards if any did.
pub fn handle_run_command(
    opts: RunOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let cfg = config::load_with_sources(opts.config.as_deref())?.config;
    let matches = opts.matches.unwrap_or(cfg.matches);
    if matches == 0 {
        return Err(CliError::InvalidInput("--matches must be >=1".into()));
    }
    let run_seed = opts.seed.or(cfg.seed).unwrap_or_else(rand::random);

    // reject bad model specs before the output file is touched
    for player in &cfg.players {
        create_adapter(&player.model, run_seed)?;
    }

    let plans = plan_matches(&cfg.event, run_seed, matches);
    let sink = JsonlSink::create(&opts.output)?;
    info!(
        matches,
        seed = run_seed,
        parallel = opts.parallel,
        output = %opts.output.display(),
        "starting run"
    );

    let results: Vec<Result<MatchSummary, CliError>> = if opts.parallel {
        let (cfg, sink) = (&cfg, &sink);
        std::thread::scope(|scope| {
            let handles: Vec<_> = plans
                .iter()
                .map(|plan| scope.spawn(move || play_match(cfg, plan, sink)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(CliError::Engine("match thread panicked".into())))
                })
                .collect()
        })
    } else {
        plans
            .iter()
            .map(|plan| play_match(&cfg, plan, &sink))
            .collect()
    };

    let mut failed = 0;
    for (plan, result) in plans.iter().zip(results) {
        match result {
            Ok(summary) => writeln!(out, "{}", summary_line(&plan.match_id, &summary))?,
            Err(e) => {
                error!(match_id = %plan.match_id, error = %e, "match failed");
                ui::write_error(err, &format!("{}: {}", plan.match_id, e))?;
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::Engine(format!(
            "{} of {} matches failed",
            failed, matches
        )));
    }
    Ok(())
}

fn play_match(cfg: &Config, plan: &MatchPlan, sink: &JsonlSink) -> Result<MatchSummary, CliError> {
    let [a, b] = cfg.players.as_slice() else {
        return Err(CliError::Config("exactly 2 players required".into()));
    };
    let mut seats = Seats::new();
    for (offset, player) in [a, b].into_iter().enumerate() {
        let adapter = create_adapter(&player.model, plan.seed.wrapping_add(offset as u64))?;
        seats.insert(player.id.clone(), adapter);
    }
    let mut game = HoldemEngine::new(a.id.clone(), b.id.clone(), cfg.holdem.clone(), plan.seed)?
        .with_event_name(cfg.event.clone());
    let summary = MatchRunner::new(&cfg.match_config, sink).run(
        &plan.match_id,
        &mut game,
        plan.seed,
        &seats,
    )?;
    Ok(summary)
}

fn summary_line(match_id: &str, summary: &MatchSummary) -> String {
    let ruling = match summary.ruling {
        MatchRuling::Completed => "completed",
        MatchRuling::MatchForfeit => "match_forfeit",
    };
    let scores: Vec<String> = summary
        .scores
        .iter()
        .map(|(player, score)| format!("{}={}", player, score))
        .collect();
    let violations: u32 = summary
        .fidelity
        .values()
        .map(|f| f.total_violations())
        .sum();
    let mut line = format!(
        "{} {} winner={} scores={} turns={} violations={}",
        match_id,
        ruling,
        summary.winners().join(","),
        scores.join(","),
        summary.turns,
        violations
    );
    if let Some(forfeit) = &summary.forfeit {
        let cause = match forfeit.cause {
            ForfeitCause::Referee => "strikes",
            ForfeitCause::StuckLoop => "stuck_loop",
        };
        line.push_str(&format!(" forfeit={}({})", forfeit.player, cause));
    }
    line
}

use arena_engine::engine::{HoldemConfig, HoldemEngine, MAX_STARTING_STACK};
use arena_engine::errors::GameError;
use arena_engine::game::Game;
use arena_engine::history::Street;
use arena_engine::player::{Action, ActionKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn table(stack: u32, sb: u32, bb: u32, seed: u64) -> HoldemEngine {
    let config = HoldemConfig {
        starting_stack: stack,
        small_blind: sb,
        big_blind: bb,
        max_hands: 60,
        level_up_every: None,
    };
    HoldemEngine::new("alice", "bob", config, seed).expect("valid table")
}

fn snapshot_total(e: &HoldemEngine) -> u64 {
    let snap = e.get_state_snapshot();
    let stacks: u64 = snap["seats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stack"].as_u64().unwrap())
        .sum();
    stacks + snap["pot"].as_u64().unwrap()
}

#[test]
fn small_blind_limp_closes_preflop_and_big_blind_opens_flop() {
    let mut e = table(200, 1, 2, 1);
    assert_eq!(e.stack("alice"), Some(199));
    assert_eq!(e.stack("bob"), Some(198));
    assert_eq!(e.pot(), 3);
    assert_eq!(e.current_player(), Some("alice"));
    assert_eq!(e.call_amount("alice"), Some(1));

    e.apply_action("alice", &Action::call()).unwrap();

    assert_eq!(e.pot(), 4);
    assert_eq!(e.street(), Street::Flop);
    assert_eq!(e.board().len(), 3);
    assert_eq!(e.current_player(), Some("bob"));
}

#[test]
fn forfeit_with_free_call_checks_instead_of_folding() {
    let mut e = table(200, 1, 2, 2);
    e.apply_action("alice", &Action::call()).unwrap();
    assert_eq!(e.call_amount("bob"), Some(0));

    let fallback = e.forfeit_turn("bob").unwrap();

    assert_eq!(fallback.kind, ActionKind::Call);
    assert_eq!(e.hand_number(), 1, "hand must continue after a check");
    assert_eq!(e.current_player(), Some("alice"));
}

#[test]
fn forfeit_facing_a_bet_folds() {
    let mut e = table(200, 1, 2, 3);
    let fallback = e.forfeit_turn("alice").unwrap();
    assert_eq!(fallback.kind, ActionKind::Fold);
    assert_eq!(e.hand_number(), 2);
    assert_eq!(e.stack("bob"), Some(201 - 1));
}

#[test]
fn validate_is_pure_and_reports_reasons() {
    let e = table(200, 1, 2, 4);
    let before = e.get_state_snapshot();

    let wrong_turn = e.validate_action("bob", &Action::call());
    assert!(!wrong_turn.legal);
    assert!(wrong_turn.reason.unwrap().contains("alice"));

    let too_big = e.validate_action("alice", &Action::raise_to(7));
    assert!(!too_big.legal);
    assert!(too_big.reason.unwrap().contains("4-6"));

    assert!(e.validate_action("alice", &Action::raise_to(6)).legal);
    assert!(!e.validate_action("mallory", &Action::fold()).legal);
    assert_eq!(e.get_state_snapshot(), before);
}

#[test]
fn non_closing_actions_always_pass_the_turn() {
    for seed in 0..30u64 {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut e = table(150, 1, 2, seed);
        while let Some(p) = e.current_player().map(str::to_string) {
            let street = e.street();
            let hand = e.hand_number();
            let action = match e.raise_bounds(&p) {
                Some(b) if rng.random_bool(0.3) => {
                    Action::raise_to(rng.random_range(b.min_to..=b.max_to))
                }
                _ if rng.random_bool(0.05) => Action::fold(),
                _ => Action::call(),
            };
            let is_raise = matches!(action.kind, ActionKind::Raise(_));
            e.apply_action(&p, &action).unwrap();
            assert_eq!(snapshot_total(&e), u64::from(e.total_chips()));

            let same_street = e.street() == street && e.hand_number() == hand;
            if same_street && !e.is_terminal() {
                assert_ne!(e.current_player(), Some(p.as_str()));
                if is_raise {
                    let opponent = e.current_player().unwrap().to_string();
                    assert!(!e.has_acted(&opponent));
                }
            }
        }
    }
}

#[test]
fn reset_replays_identically_from_the_same_seed() {
    let mut e = table(200, 1, 2, 99);
    let first = e.get_state_snapshot();
    e.apply_action("alice", &Action::raise_to(6)).unwrap();
    e.reset(99).unwrap();
    assert_eq!(e.get_state_snapshot(), first);
}

#[test]
fn snapshot_exposes_hidden_cards_for_spectators() {
    let e = table(200, 1, 2, 5);
    let snap = e.get_state_snapshot();
    for seat in snap["seats"].as_array().unwrap() {
        assert_eq!(seat["hole_cards"].as_array().unwrap().len(), 2);
    }
    assert_eq!(snap["total_chips"], 400);
}

#[test]
fn prompt_lists_legal_actions_with_raise_range() {
    let e = table(200, 1, 2, 6);
    let prompt = e.get_prompt("alice");
    assert!(prompt.contains("- call (cost: 1)"));
    assert!(prompt.contains("- raise (to: 4-6)"));
    assert!(prompt.contains("Your hole cards:"));
    let retry = e.get_retry_prompt("alice", "raise to 9 is outside the legal range");
    assert!(retry.starts_with(&prompt));
    assert!(retry.contains("rejected: raise to 9"));
}

#[test]
fn blinds_step_up_with_the_level_schedule() {
    let config = HoldemConfig {
        starting_stack: 500,
        small_blind: 1,
        big_blind: 2,
        max_hands: 10,
        level_up_every: Some(2),
    };
    let mut e = HoldemEngine::new("alice", "bob", config, 8).unwrap();
    assert_eq!(e.blinds(), (1, 2));
    let p = e.current_player().unwrap().to_string();
    e.apply_action(&p, &Action::fold()).unwrap();
    assert_eq!(e.blinds(), (1, 2));
    let p = e.current_player().unwrap().to_string();
    e.apply_action(&p, &Action::fold()).unwrap();
    assert_eq!(e.hand_number(), 3);
    assert_eq!(e.blinds(), (2, 4));
}

#[test]
fn match_ends_at_hand_limit_with_full_scores() {
    let config = HoldemConfig {
        starting_stack: 100,
        small_blind: 1,
        big_blind: 2,
        max_hands: 3,
        level_up_every: None,
    };
    let mut e = HoldemEngine::new("alice", "bob", config, 10).unwrap();
    while let Some(p) = e.current_player().map(str::to_string) {
        e.forfeit_turn(&p).unwrap();
    }
    assert!(e.is_terminal());
    assert_eq!(e.history().len(), 3);
    assert_eq!(e.street(), Street::Showdown);
    let scores = e.get_scores();
    assert_eq!(scores.values().sum::<f64>(), 200.0);
    let forfeited = e.forfeit_scores("alice");
    assert_eq!(forfeited["alice"], 0.0);
    assert_eq!(forfeited["bob"], 200.0);
}

#[test]
fn all_in_hands_are_highlighted() {
    let mut e = table(40, 1, 2, 12);
    e.apply_action("alice", &Action::raise_to(6)).unwrap();
    e.apply_action("bob", &Action::raise_to(18)).unwrap();
    let max = e.raise_bounds("alice").unwrap().max_to;
    assert_eq!(max, 40);
    e.apply_action("alice", &Action::raise_to(40)).unwrap();
    e.apply_action("bob", &Action::call()).unwrap();
    assert!(e.highlights().iter().any(|h| h.kind == "all_in" && h.round == 1));
}

fn fold_preflop(e: &mut HoldemEngine) {
    let player = e.current_player().unwrap().to_string();
    e.apply_action(&player, &Action::fold()).unwrap();
}

fn check(e: &mut HoldemEngine, player: &str) {
    assert_eq!(e.call_amount(player), Some(0));
    e.apply_action(player, &Action::call()).unwrap();
}

/// Pot-sized raise preflop, a call, then a fold on the flop: a pot of 12 at 1/2.
fn raised_pot(e: &mut HoldemEngine) {
    let raiser = e.current_player().unwrap().to_string();
    let to = e.raise_bounds(&raiser).unwrap().max_to;
    e.apply_action(&raiser, &Action::raise_to(to)).unwrap();
    let caller = e.current_player().unwrap().to_string();
    e.apply_action(&caller, &Action::call()).unwrap();
    assert_eq!(e.pot(), 12);
    let folder = e.current_player().unwrap().to_string();
    e.apply_action(&folder, &Action::fold()).unwrap();
}

fn check_down_to_river(e: &mut HoldemEngine) {
    e.apply_action("alice", &Action::call()).unwrap();
    for _ in 0..2 {
        check(e, "bob");
        check(e, "alice");
    }
    assert_eq!(e.street(), Street::River);
}

#[test]
fn river_fold_to_a_raise_is_highlighted() {
    let mut e = table(200, 1, 2, 13);
    check_down_to_river(&mut e);
    check(&mut e, "bob");
    let to = e.raise_bounds("alice").unwrap().min_to;
    e.apply_action("alice", &Action::raise_to(to)).unwrap();
    e.apply_action("bob", &Action::fold()).unwrap();

    let highlights = e.highlights();
    let fold = highlights.iter().find(|h| h.kind == "river_fold").unwrap();
    assert_eq!(fold.round, 1);
    assert!(fold.description.contains("bob"));
}

#[test]
fn river_fold_without_a_raise_is_not_highlighted() {
    let mut e = table(200, 1, 2, 14);
    check_down_to_river(&mut e);
    check(&mut e, "bob");
    e.apply_action("alice", &Action::fold()).unwrap();
    assert_eq!(e.hand_number(), 2);

    // a fold to a raise before the river does not count either
    e.apply_action("bob", &Action::call()).unwrap();
    check(&mut e, "alice");
    let to = e.raise_bounds("bob").unwrap().min_to;
    e.apply_action("bob", &Action::raise_to(to)).unwrap();
    e.apply_action("alice", &Action::fold()).unwrap();

    assert!(e.highlights().iter().all(|h| h.kind != "river_fold"));
}

#[test]
fn big_pot_needs_three_prior_pots() {
    let mut e = table(200, 1, 2, 15);
    fold_preflop(&mut e);
    fold_preflop(&mut e);
    raised_pot(&mut e);
    assert_eq!(e.hand_number(), 4);
    assert!(e.highlights().iter().all(|h| h.kind != "big_pot"));
}

#[test]
fn pot_over_three_times_the_trailing_average_is_highlighted() {
    let mut e = table(200, 1, 2, 16);
    for _ in 0..3 {
        fold_preflop(&mut e);
    }
    raised_pot(&mut e);

    let highlights = e.highlights();
    let big = highlights.iter().find(|h| h.kind == "big_pot").unwrap();
    assert_eq!(big.round, 4);
    assert_eq!(big.description, "pot of 12 against a trailing average of 3");
}

#[test]
fn starting_stack_is_capped_for_chip_arithmetic() {
    let over = HoldemConfig {
        starting_stack: MAX_STARTING_STACK + 1,
        ..HoldemConfig::default()
    };
    assert!(matches!(
        HoldemEngine::new("alice", "bob", over, 0),
        Err(GameError::InvalidConfig(_))
    ));

    let mut e = table(MAX_STARTING_STACK, 1, 2, 17);
    let total = u64::from(MAX_STARTING_STACK) * 2;
    assert_eq!(snapshot_total(&e), total);
    for _ in 0..64 {
        if e.hand_number() != 1 {
            break;
        }
        let Some(player) = e.current_player().map(str::to_string) else {
            break;
        };
        match e.raise_bounds(&player) {
            Some(bounds) => e.apply_action(&player, &Action::raise_to(bounds.max_to)).unwrap(),
            None => e.apply_action(&player, &Action::call()).unwrap(),
        }
        assert_eq!(snapshot_total(&e), total);
    }
    assert!(e.hand_number() > 1 || e.is_terminal());
}

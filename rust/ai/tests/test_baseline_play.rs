use std::time::Duration;

use arena_engine::engine::{HoldemConfig, HoldemEngine};
use arena_engine::game::Game;
use arena_engine::player::Action;
use arena_models::baseline::{BaselineAdapter, PromptView};
use arena_models::ModelAdapter;

fn engine(seed: u64) -> HoldemEngine {
    let config = HoldemConfig {
        starting_stack: 200,
        small_blind: 1,
        big_blind: 2,
        max_hands: 30,
        level_up_every: Some(5),
    };
    HoldemEngine::new("alice", "bob", config, seed).unwrap()
}

#[test]
fn prompt_view_matches_engine_state() {
    let e = engine(4);
    let view = PromptView::parse(&e.get_prompt("alice"));
    let seat = e.seat("alice").unwrap();
    let hole: Vec<_> = seat.hole_cards().iter().flatten().copied().collect();
    assert_eq!(view.hole, hole);
    assert!(view.board.is_empty());
    assert_eq!(view.pot, 3);
    assert_eq!(view.call_cost, Some(1));
    assert_eq!(view.raise, Some((4, 6)));
}

#[test]
fn baseline_only_ever_submits_legal_actions() {
    let model = BaselineAdapter::new();
    for seed in 0..20u64 {
        let mut e = engine(seed);
        let mut turns = 0;
        while let Some(player) = e.current_player().map(str::to_string) {
            let prompt = e.get_prompt(&player);
            let reply = model.query(&prompt, 256, Duration::from_secs(1)).unwrap();
            let action: Action = serde_json::from_str(&reply.text).unwrap();
            let verdict = e.validate_action(&player, &action);
            assert!(verdict.legal, "seed {}: {:?} rejected: {:?}", seed, action, verdict.reason);
            e.apply_action(&player, &action).unwrap();
            turns += 1;
            assert!(turns < 5_000);
        }
        let total: f64 = e.get_scores().values().sum();
        assert_eq!(total, 400.0);
    }
}

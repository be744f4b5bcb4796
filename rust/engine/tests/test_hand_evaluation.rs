use std::cmp::Ordering;

use arena_engine::cards::Card;
use arena_engine::hand::{compare_hands, evaluate_hand, Category};

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

#[test]
fn detects_every_category() {
    let cases = [
        ("Th Jh Qh Kh Ah 2c 3d", Category::StraightFlush),
        ("Ac Ad Ah As Kc Qd 2h", Category::FourOfAKind),
        ("Kc Kd Kh Qc Qd 2h 3s", Category::FullHouse),
        ("2s 7s 9s Js Ks Td 3c", Category::Flush),
        ("5c 6d 7h 8s 9c Kd 2h", Category::Straight),
        ("7c 7d 7h Ks 2c 4d 9h", Category::ThreeOfAKind),
        ("7c 7d 4h 4s 2c Kd 9h", Category::TwoPair),
        ("7c 7d 4h Js 2c Kd 9h", Category::OnePair),
        ("7c 3d 4h Js 2c Kd 9h", Category::HighCard),
    ];
    for (hand, expected) in cases {
        assert_eq!(evaluate_hand(&cards(hand)).category, expected, "{}", hand);
    }
}

#[test]
fn category_ordering_is_correct() {
    let quads = evaluate_hand(&cards("Ac Ad Ah As Kc Qd 2h"));
    let full_house = evaluate_hand(&cards("Kc Kd Kh Qc Qd 2h 3s"));
    assert_eq!(compare_hands(&quads, &full_house), Ordering::Greater);
}

#[test]
fn board_playing_for_both_is_a_tie() {
    let board = "Ah Kd Qc Js Tc";
    let a = evaluate_hand(&cards(&format!("2c 3d {}", board)));
    let b = evaluate_hand(&cards(&format!("4h 5s {}", board)));
    assert_eq!(compare_hands(&a, &b), Ordering::Equal);
}

#[test]
fn higher_straight_wins_and_wheel_is_lowest() {
    let six_high = evaluate_hand(&cards("2c 3d 4h 5s 6c Kd Kh"));
    let wheel = evaluate_hand(&cards("Ac 2d 3h 4s 5c Kd Kh"));
    assert_eq!(six_high.category, Category::Straight);
    assert_eq!(wheel.category, Category::Straight);
    assert_eq!(compare_hands(&six_high, &wheel), Ordering::Greater);
}

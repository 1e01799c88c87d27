//! End-to-end tests: detector-style hands in, expression text out

use gesture_calculator::calculator::{CalculatorLayout, CalculatorSession, EvalError, ERROR_TEXT};
use gesture_calculator::ml::{Hand, HandLandmark};

const W: u32 = 1400;
const H: u32 = 900;

/// A hand whose index tip sits at the button centre, middle tip `gap` pixels below
fn hand_over(label: &str, gap: f32) -> Hand {
    let layout = CalculatorLayout::compute(W, H);
    let rect = layout.button(label).unwrap().rect;
    let x = rect.x as f32 + rect.w as f32 / 2.0;
    let y = rect.y as f32 + rect.h as f32 / 2.0;

    let mut hand = Hand {
        confidence: 0.9,
        ..Hand::default()
    };
    hand.landmarks[8] = HandLandmark { x: x / W as f32, y: y / H as f32, z: 0.0 };
    hand.landmarks[12] = HandLandmark { x: x / W as f32, y: (y + gap) / H as f32, z: 0.0 };
    hand
}

/// Pinch each button in turn, letting the cooldown run out in between
fn type_labels(session: &mut CalculatorSession, labels: &[&str]) {
    for label in labels {
        let outcome = session.update(W, H, &[hand_over(label, 4.0)]);
        assert_eq!(outcome.click.as_ref().map(|c| c.label), Some(*label), "pressing {}", label);
        for _ in 0..9 {
            let idle = session.update(W, H, &[]);
            assert!(idle.click.is_none());
        }
        assert_eq!(session.cooldown(), 0);
    }
}

#[test]
fn test_type_and_evaluate() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["1", "2", "+", "3", "*", "2"]);
    assert_eq!(session.expression().as_str(), "12+3*2");
    type_labels(&mut session, &["="]);
    assert_eq!(session.expression().as_str(), "18");
}

#[test]
fn test_power_and_delete() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["2", "^", "1", "0", "DEL", "="]);
    assert_eq!(session.expression().as_str(), "2");

    type_labels(&mut session, &["CLEAR", "2", "^", "1", "0", "="]);
    assert_eq!(session.expression().as_str(), "1024");
}

#[test]
fn test_division_gives_float() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["7", "/", "2", "="]);
    assert_eq!(session.expression().as_str(), "3.5");

    type_labels(&mut session, &["CLEAR", "8", "/", "4", "="]);
    assert_eq!(session.expression().as_str(), "2.0");
}

#[test]
fn test_long_numbers_stay_exact() {
    let mut session = CalculatorSession::default();
    let mut labels = vec!["9"; 11];
    labels.push("*");
    labels.extend(["9"; 11]);
    labels.push("=");
    type_labels(&mut session, &labels);
    assert_eq!(session.expression().as_str(), "9999999999800000000001");

    let mut labels = vec!["CLEAR"];
    labels.extend(["8"; 20]);
    labels.extend(["+", "1", "="]);
    type_labels(&mut session, &labels);
    assert_eq!(session.expression().as_str(), "88888888888888888889");
}

#[test]
fn test_result_feeds_next_expression() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["2", "^", "6", "4", "="]);
    assert_eq!(session.expression().as_str(), "18446744073709551616");
    type_labels(&mut session, &["*", "4", "="]);
    assert_eq!(session.expression().as_str(), "73786976294838206464");
}

#[test]
fn test_error_then_recover() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["1", "+", "="]);
    assert_eq!(session.expression().as_str(), ERROR_TEXT);

    let last = session.recent_clicks().last().unwrap();
    assert_eq!(last.label, "=");
    assert!(matches!(last.error, Some(EvalError::Syntax(_))));

    // A digit replaces the error text
    type_labels(&mut session, &["4"]);
    assert_eq!(session.expression().as_str(), "4");
}

#[test]
fn test_division_by_zero_reports_error() {
    let mut session = CalculatorSession::default();
    type_labels(&mut session, &["9", "/", "0", "="]);
    assert!(session.expression().is_error());
    assert_eq!(
        session.recent_clicks().last().and_then(|c| c.error.clone()),
        Some(EvalError::DivisionByZero)
    );
}

#[test]
fn test_open_hand_never_clicks() {
    let mut session = CalculatorSession::default();
    for _ in 0..50 {
        let outcome = session.update(W, H, &[hand_over("5", 80.0)]);
        assert!(outcome.click.is_none());
        assert!(outcome.pinch.has_hand());
    }
    assert!(session.expression().is_empty());
}

#[test]
fn test_no_hand_never_clicks() {
    let mut session = CalculatorSession::default();
    for _ in 0..50 {
        let outcome = session.update(W, H, &[]);
        assert!(outcome.click.is_none());
        assert!(!outcome.pinch.has_hand());
    }
    assert_eq!(session.frame_count(), 50);
}

#[test]
fn test_only_first_hand_counts() {
    let mut session = CalculatorSession::default();
    let hands = [hand_over("5", 80.0), hand_over("6", 2.0)];
    let outcome = session.update(W, H, &hands);
    assert!(outcome.click.is_none());
}

#[test]
fn test_held_pinch_repeats_after_cooldown() {
    let mut session = CalculatorSession::default();
    let hand = hand_over("8", 3.0);
    for _ in 0..25 {
        session.update(W, H, std::slice::from_ref(&hand));
    }
    // Accepted on frames 1, 11 and 21
    assert_eq!(session.expression().as_str(), "888");
}

#[test]
fn test_reset_clears_state() {
    let mut session = CalculatorSession::default();
    session.update(W, H, &[hand_over("3", 1.0)]);
    assert_ne!(session.cooldown(), 0);

    session.reset();
    assert!(session.expression().is_empty());
    assert_eq!(session.cooldown(), 0);
    assert_eq!(session.recent_clicks().count(), 0);
}

//! Property-based tests for the keypad layout and click resolution

use gesture_calculator::calculator::{CalculatorLayout, CalculatorSession, Rect, SessionSettings};
use gesture_calculator::gesture::PinchReading;
use gesture_calculator::ml::{Hand, HandLandmark};
use proptest::prelude::*;

// ===== Strategy definitions =====

/// Frame sizes from small webcams up to 4K
fn frame_size_strategy() -> impl Strategy<Value = (u32, u32)> {
    (200u32..=3840u32, 200u32..=2160u32)
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500i32..500, -500i32..500, 1i32..400, 1i32..400).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn center(rect: Rect) -> (f32, f32) {
    (
        rect.x as f32 + rect.w as f32 / 2.0,
        rect.y as f32 + rect.h as f32 / 2.0,
    )
}

fn pinch_at(x: f32, y: f32, distance: f32) -> PinchReading {
    PinchReading {
        distance,
        tip: Some((x, y)),
    }
}

// ===== Rect =====

proptest! {
    /// Points strictly inside hit, points on or beyond an edge miss
    #[test]
    fn prop_rect_contains_is_strict(rect in rect_strategy(), dx in -50i32..450, dy in -50i32..450) {
        let px = rect.x + dx;
        let py = rect.y + dy;
        let inside = px > rect.x && px < rect.right() && py > rect.y && py < rect.bottom();
        prop_assert_eq!(rect.contains(px as f32, py as f32), inside);
    }

    /// Corners never count as inside
    #[test]
    fn prop_rect_corners_outside(rect in rect_strategy()) {
        prop_assert!(!rect.contains(rect.x as f32, rect.y as f32));
        prop_assert!(!rect.contains(rect.right() as f32, rect.y as f32));
        prop_assert!(!rect.contains(rect.x as f32, rect.bottom() as f32));
        prop_assert!(!rect.contains(rect.right() as f32, rect.bottom() as f32));
    }
}

// ===== Layout =====

proptest! {
    /// Always nineteen buttons, all within the panel and the frame
    #[test]
    fn prop_buttons_inside_panel((w, h) in frame_size_strategy()) {
        let layout = CalculatorLayout::compute(w, h);
        prop_assert_eq!(layout.buttons.len(), 19);
        let panel = layout.panel;
        prop_assert!(panel.x >= 0 && panel.y >= 0);
        prop_assert!(panel.right() <= w as i32);
        prop_assert!(panel.bottom() <= h as i32);
        for button in &layout.buttons {
            prop_assert!(button.rect.x >= panel.x);
            prop_assert!(button.rect.y >= panel.y + layout.button_height);
            prop_assert!(button.rect.right() <= panel.right());
            prop_assert!(button.rect.bottom() <= panel.bottom());
        }
    }

    /// The centre of every button hits that button and no other
    #[test]
    fn prop_center_hits_own_button((w, h) in frame_size_strategy()) {
        let layout = CalculatorLayout::compute(w, h);
        for (index, button) in layout.buttons.iter().enumerate() {
            let (cx, cy) = center(button.rect);
            prop_assert_eq!(layout.hit_test(cx, cy), Some(index));
            let hits = layout.buttons.iter().filter(|b| b.rect.contains(cx, cy)).count();
            prop_assert_eq!(hits, 1);
        }
    }

    /// The display row never hits a button
    #[test]
    fn prop_display_row_is_inert((w, h) in frame_size_strategy(), fx in 0.0f32..1.0, fy in 0.0f32..1.0) {
        let layout = CalculatorLayout::compute(w, h);
        let display = layout.display_rect();
        let x = display.x as f32 + fx * display.w as f32;
        let y = display.y as f32 + fy * display.h as f32;
        prop_assert_eq!(layout.hit_test(x, y), None);
    }

    /// Layout depends only on the frame size
    #[test]
    fn prop_layout_deterministic((w, h) in frame_size_strategy()) {
        prop_assert_eq!(CalculatorLayout::compute(w, h), CalculatorLayout::compute(w, h));
    }
}

// ===== Click resolution =====

proptest! {
    /// At or under the threshold a pinch over a button clicks it
    #[test]
    fn prop_pinch_within_threshold_clicks(index in 0usize..19, distance in 0.0f32..=20.0) {
        let layout = CalculatorLayout::compute(1400, 900);
        let (x, y) = center(layout.buttons[index].rect);
        let label = layout.buttons[index].label;
        let mut session = CalculatorSession::default();
        let outcome = session.resolve(layout, pinch_at(x, y, distance));
        prop_assert_eq!(outcome.highlighted, Some(index));
        prop_assert_eq!(outcome.click.map(|c| c.label), Some(label));
    }

    /// Over the threshold nothing is clicked or highlighted
    #[test]
    fn prop_pinch_over_threshold_ignored(index in 0usize..19, distance in 20.001f32..500.0) {
        let layout = CalculatorLayout::compute(1400, 900);
        let (x, y) = center(layout.buttons[index].rect);
        let mut session = CalculatorSession::default();
        let outcome = session.resolve(layout, pinch_at(x, y, distance));
        prop_assert!(outcome.click.is_none());
        prop_assert!(outcome.highlighted.is_none());
        prop_assert_eq!(session.cooldown(), 0);
    }

    /// A sustained pinch clicks once every ten frames
    #[test]
    fn prop_sustained_pinch_respects_cooldown(frames in 1u64..120) {
        let mut session = CalculatorSession::default();
        let mut clicks = Vec::new();
        for frame in 1..=frames {
            let layout = CalculatorLayout::compute(1400, 900);
            let (x, y) = center(layout.button("7").unwrap().rect);
            if session.resolve(layout, pinch_at(x, y, 5.0)).click.is_some() {
                clicks.push(frame);
            }
        }
        let expected: Vec<u64> = (1..=frames).step_by(10).collect();
        prop_assert_eq!(clicks, expected);
        prop_assert_eq!(session.expression().as_str().len() as u64, frames.div_ceil(10));
    }

    /// The cooldown window length follows the configured bound
    #[test]
    fn prop_cooldown_window_configurable(bound in 1u32..30) {
        let mut session = CalculatorSession::new(SessionSettings {
            cooldown_frames: bound,
            ..SessionSettings::default()
        });
        let mut clicks = Vec::new();
        for frame in 1..=(3 * bound as u64 + 3) {
            let layout = CalculatorLayout::compute(640, 480);
            let (x, y) = center(layout.button("1").unwrap().rect);
            if session.resolve(layout, pinch_at(x, y, 0.0)).click.is_some() {
                clicks.push(frame);
            }
        }
        prop_assert!(clicks.len() >= 2);
        prop_assert_eq!(clicks[1] - clicks[0], bound as u64);
    }

    /// Landmarks from the detector give the same answer as the pixel reading
    #[test]
    fn prop_hand_pinch_matches_threshold(index in 0usize..19, gap in 0.0f32..60.0) {
        let (w, h) = (1400u32, 900u32);
        let layout = CalculatorLayout::compute(w, h);
        let (x, y) = center(layout.buttons[index].rect);

        let mut hand = Hand::default();
        hand.landmarks[8] = HandLandmark { x: x / w as f32, y: y / h as f32, z: 0.0 };
        hand.landmarks[12] = HandLandmark { x: x / w as f32, y: (y + gap) / h as f32, z: 0.0 };

        let hands = [hand];
        let pinch = PinchReading::from_hands(&hands, w, h);
        prop_assert!((pinch.distance - gap).abs() < 0.01);

        // Stay clear of float noise right at the threshold
        prop_assume!((gap - 20.0).abs() > 0.05);
        let mut session = CalculatorSession::default();
        let outcome = session.update(w, h, &hands);
        prop_assert_eq!(outcome.click.is_some(), gap <= 20.0);
    }
}

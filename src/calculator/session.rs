//! Calculator session: expression, click debounce and the per-frame update

use std::collections::VecDeque;

use super::eval::EvalError;
use super::expression::Expression;
use super::layout::{CalculatorLayout, Key};
use crate::gesture::PinchReading;
use crate::ml::Hand;

/// Default maximum fingertip distance (pixels) that counts as a pinch
pub const DEFAULT_PINCH_THRESHOLD: f32 = 20.0;
/// Default cooldown bound in frames
pub const DEFAULT_COOLDOWN_FRAMES: u32 = 10;
/// Accepted clicks kept for display
const CLICK_LOG_LEN: usize = 8;

/// Click resolver tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSettings {
    /// Pinch distance at or below which a click is possible
    pub pinch_threshold: f32,
    /// The cooldown counter resets once it exceeds this value
    pub cooldown_frames: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            cooldown_frames: DEFAULT_COOLDOWN_FRAMES,
        }
    }
}

/// An accepted button press
#[derive(Clone, Debug, PartialEq)]
pub struct ClickEvent {
    /// Frame (tick) the click was accepted on
    pub frame: u64,
    /// Label of the pressed button
    pub label: &'static str,
    /// Expression text after the press
    pub expression: String,
    /// Set when the press was `=` and evaluation failed
    pub error: Option<EvalError>,
}

/// Everything the renderer needs about one processed frame
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    /// Layout used for this frame
    pub layout: CalculatorLayout,
    /// Pinch state of the first hand
    pub pinch: PinchReading,
    /// Button under a closed pinch, whether or not the cooldown let it click
    pub highlighted: Option<usize>,
    /// Click accepted this frame
    pub click: Option<ClickEvent>,
}

/// Owns the calculator state that persists across frames
#[derive(Debug)]
pub struct CalculatorSession {
    settings: SessionSettings,
    expression: Expression,
    /// Frames since the last accepted click, 0 when clicks are allowed
    cooldown: u32,
    frame_count: u64,
    recent_clicks: VecDeque<ClickEvent>,
}

impl CalculatorSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            expression: Expression::default(),
            cooldown: 0,
            frame_count: 0,
            recent_clicks: VecDeque::with_capacity(CLICK_LOG_LEN),
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Most recent accepted clicks, oldest first
    pub fn recent_clicks(&self) -> impl Iterator<Item = &ClickEvent> {
        self.recent_clicks.iter()
    }

    /// Clear the expression, debounce state and click log
    pub fn reset(&mut self) {
        self.expression = Expression::default();
        self.cooldown = 0;
        self.recent_clicks.clear();
    }

    /// Process one frame of detector output
    pub fn update(&mut self, frame_width: u32, frame_height: u32, hands: &[Hand]) -> FrameOutcome {
        let layout = CalculatorLayout::compute(frame_width, frame_height);
        let pinch = PinchReading::from_hands(hands, frame_width, frame_height);
        self.resolve(layout, pinch)
    }

    /// Resolve a click for one frame given an already computed layout and pinch.
    ///
    /// The first button in layout order under a closed pinch wins; no other
    /// button is tested that frame.
    pub fn resolve(&mut self, layout: CalculatorLayout, pinch: PinchReading) -> FrameOutcome {
        self.frame_count += 1;

        let mut highlighted = None;
        let mut click = None;

        let target = pinch
            .tip
            .filter(|_| pinch.is_pinched(self.settings.pinch_threshold))
            .and_then(|(x, y)| layout.hit_test(x, y));

        if let Some(index) = target {
            highlighted = Some(index);
            if self.cooldown == 0 {
                click = Some(self.press(layout.buttons[index].label));
                self.cooldown = 1;
            }
        }

        if self.cooldown > 0 {
            self.cooldown += 1;
            if self.cooldown > self.settings.cooldown_frames {
                self.cooldown = 0;
            }
        }

        FrameOutcome {
            layout,
            pinch,
            highlighted,
            click,
        }
    }

    /// Apply a button's action directly, bypassing geometry and cooldown
    pub fn press(&mut self, label: &'static str) -> ClickEvent {
        let error = match Key::from_label(label) {
            Some(key) => self.expression.apply(key).err(),
            None => {
                log::warn!("Ignoring press of unknown button {:?}", label);
                None
            }
        };

        match &error {
            Some(e) => log::info!("Pressed {} -> {} ({})", label, self.expression, e),
            None => log::debug!("Pressed {} -> {}", label, self.expression),
        }

        let event = ClickEvent {
            frame: self.frame_count,
            label,
            expression: self.expression.as_str().to_string(),
            error,
        };

        if self.recent_clicks.len() == CLICK_LOG_LEN {
            self.recent_clicks.pop_front();
        }
        self.recent_clicks.push_back(event.clone());
        event
    }
}

impl Default for CalculatorSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

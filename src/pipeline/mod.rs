//! One processing tick: read a frame, mirror it, find the hand, resolve clicks
//!
//! Kept apart from the window so the whole path runs without a GPU.

use std::time::{Duration, Instant};

use crate::calculator::{CalculatorSession, FrameOutcome};
use crate::camera::{CameraFrame, FrameSource};
use crate::ml::{Hand, HandDetector};

/// Result of a tick that got a frame
#[derive(Clone)]
pub struct ProcessedFrame {
    /// Mirrored frame, as shown on screen
    pub frame: CameraFrame,
    /// Hands found in the mirrored frame
    pub hands: Vec<Hand>,
    pub outcome: FrameOutcome,
}

/// Run one tick.
///
/// Returns `None` when no frame could be read. The session is left untouched
/// in that case, so a failed read never advances the cooldown.
pub fn process_tick(
    source: &mut dyn FrameSource,
    detector: &mut dyn HandDetector,
    session: &mut CalculatorSession,
) -> Option<ProcessedFrame> {
    let frame = match source.read_frame() {
        Ok(frame) => frame.mirrored(),
        Err(e) => {
            log::warn!("Failed to read frame from webcam: {}. Please check your camera settings.", e);
            return None;
        }
    };

    let hands = match detector.detect(&frame.data, frame.width, frame.height) {
        Ok(hands) => hands,
        Err(e) => {
            log::warn!("Inference error: {}", e);
            Vec::new()
        }
    };

    let outcome = session.update(frame.width, frame.height, &hands);
    if let Some(click) = &outcome.click {
        log::debug!("Click {} on camera frame {}", click.label, frame.frame_number);
    }

    Some(ProcessedFrame {
        frame,
        hands,
        outcome,
    })
}

/// Paces processing ticks and tells scheduled redraws from input repaints
#[derive(Debug)]
pub struct TickSchedule {
    interval: Duration,
    next_at: Instant,
    due: bool,
}

impl TickSchedule {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_at: now,
            due: false,
        }
    }

    /// Check the clock before the event loop waits.
    ///
    /// Returns true when a tick is due and a redraw should be requested.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_at {
            return false;
        }

        self.due = true;
        self.next_at += self.interval;

        // Reset if too far behind
        if now > self.next_at + self.interval * 2 {
            self.next_at = now + self.interval;
        }
        true
    }

    /// When the loop should wake for the next tick
    pub fn next_at(&self) -> Instant {
        self.next_at
    }

    /// Consume the pending tick, if any. Redraws without one only repaint.
    pub fn take_due(&mut self) -> bool {
        std::mem::take(&mut self.due)
    }

    /// Make the next poll fire immediately
    pub fn restart(&mut self, now: Instant) {
        self.next_at = now;
        self.due = false;
    }
}

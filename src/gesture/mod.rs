//! Pinch gesture recognition
//!
//! Turns the landmarks of the first detected hand into a pinch reading: the
//! pixel distance between the index and middle fingertips and the pixel
//! position of the index fingertip.

use crate::ml::Hand;

/// Hand landmark indices (MediaPipe hand model convention)
pub mod landmarks {
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
}

/// Fingertip whose position is reported as the pointer
pub const POINTER_LANDMARK: usize = landmarks::INDEX_FINGER_TIP;
/// Fingertip brought against the pointer to pinch
pub const PINCH_PARTNER_LANDMARK: usize = landmarks::MIDDLE_FINGER_TIP;

/// Pinch state for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchReading {
    /// Pixel distance between the two fingertips, infinite with no hand
    pub distance: f32,
    /// Pointer fingertip in frame pixels
    pub tip: Option<(f32, f32)>,
}

impl PinchReading {
    /// Reading for a frame without any hand
    pub const NONE: Self = Self {
        distance: f32::INFINITY,
        tip: None,
    };

    /// Build a reading from the detector output for a frame of the given size.
    ///
    /// Only the first hand is considered.
    pub fn from_hands(hands: &[Hand], frame_width: u32, frame_height: u32) -> Self {
        let Some(hand) = hands.first() else {
            return Self::NONE;
        };

        let (w, h) = (frame_width as f32, frame_height as f32);
        let pointer = hand.landmarks[POINTER_LANDMARK];
        let partner = hand.landmarks[PINCH_PARTNER_LANDMARK];

        let (x1, y1) = (pointer.x * w, pointer.y * h);
        let (x2, y2) = (partner.x * w, partner.y * h);
        let distance = (x2 - x1).hypot(y2 - y1);

        Self {
            distance,
            tip: Some((x1, y1)),
        }
    }

    pub fn has_hand(&self) -> bool {
        self.tip.is_some()
    }

    /// True when a hand is present and its fingertips are within `threshold` pixels
    pub fn is_pinched(&self, threshold: f32) -> bool {
        self.tip.is_some() && self.distance <= threshold
    }
}

impl Default for PinchReading {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::HandLandmark;

    fn hand_with_tips(index: (f32, f32), middle: (f32, f32)) -> Hand {
        let mut hand = Hand::default();
        hand.landmarks[POINTER_LANDMARK] = HandLandmark { x: index.0, y: index.1, z: 0.0 };
        hand.landmarks[PINCH_PARTNER_LANDMARK] = HandLandmark { x: middle.0, y: middle.1, z: 0.0 };
        hand
    }

    #[test]
    fn test_no_hand_never_pinches() {
        let reading = PinchReading::from_hands(&[], 1280, 720);
        assert_eq!(reading, PinchReading::NONE);
        assert!(!reading.has_hand());
        assert!(!reading.is_pinched(f32::MAX));
    }

    #[test]
    fn test_distance_in_pixels() {
        // 0.1 of 1000px wide and 0.1 of 400px tall: a 3-4-5 triangle scaled by 20
        let hand = hand_with_tips((0.5, 0.5), (0.56, 0.7));
        let reading = PinchReading::from_hands(&[hand], 1000, 400);
        assert!((reading.distance - 100.0).abs() < 1e-3);
        let (x, y) = reading.tip.unwrap();
        assert!((x - 500.0).abs() < 1e-3);
        assert!((y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_only_first_hand_used() {
        let first = hand_with_tips((0.1, 0.1), (0.1, 0.1));
        let second = hand_with_tips((0.9, 0.9), (0.5, 0.5));
        let reading = PinchReading::from_hands(&[first, second], 100, 100);
        assert_eq!(reading.distance, 0.0);
        assert!(reading.is_pinched(20.0));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let reading = PinchReading {
            distance: 20.0,
            tip: Some((0.0, 0.0)),
        };
        assert!(reading.is_pinched(20.0));
        assert!(!reading.is_pinched(19.999));
    }
}

//! Calculator overlay rendering
//!
//! Draws the panel, buttons, expression text and hand landmarks on top of the
//! camera image with egui's painter. Everything is laid out in frame pixels
//! and mapped to the on-screen image rectangle with a single transform.

use egui::emath::RectTransform;
use egui::{pos2, vec2, Align2, Color32, CornerRadius, FontId, Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::calculator::{self, CalculatorLayout};
use crate::ml::Hand;

const PANEL_FILL: Color32 = Color32::from_rgb(30, 30, 30);
const DISPLAY_FILL: Color32 = Color32::from_rgb(10, 10, 10);
const BUTTON_FILL: Color32 = Color32::from_rgb(50, 50, 50);
const BUTTON_PRESSED_FILL: Color32 = Color32::from_rgb(0, 255, 0);
const BORDER: Color32 = Color32::WHITE;
const TEXT: Color32 = Color32::WHITE;

/// Border width in frame pixels
const BORDER_WIDTH: f32 = 2.0;
/// Landmark marker radius in frame pixels
const LANDMARK_RADIUS: f32 = 10.0;

/// Largest rectangle with the frame's aspect ratio, centred in `available`
pub fn fit_rect(available: Rect, frame_width: u32, frame_height: u32) -> Rect {
    if frame_width == 0 || frame_height == 0 {
        return Rect::from_center_size(available.center(), egui::Vec2::ZERO);
    }
    let frame = vec2(frame_width as f32, frame_height as f32);
    let scale = (available.width() / frame.x).min(available.height() / frame.y);
    Rect::from_center_size(available.center(), frame * scale)
}

/// Transform from frame pixels to screen points
pub fn frame_to_screen(frame_width: u32, frame_height: u32, screen: Rect) -> RectTransform {
    let frame = Rect::from_min_size(Pos2::ZERO, vec2(frame_width as f32, frame_height as f32));
    RectTransform::from_to(frame, screen)
}

fn to_egui_rect(rect: calculator::Rect) -> Rect {
    Rect::from_min_size(
        pos2(rect.x as f32, rect.y as f32),
        vec2(rect.w as f32, rect.h as f32),
    )
}

/// Label size for a button, proportional to its smaller side
pub fn label_font_size(rect: calculator::Rect) -> f32 {
    rect.w.min(rect.h) as f32 * 0.35
}

/// Expression text size, proportional to the panel height
pub fn expression_font_size(layout: &CalculatorLayout) -> f32 {
    layout.panel.h as f32 * 0.06
}

/// Paint the calculator panel, its buttons and the expression text
pub fn paint_calculator(
    painter: &Painter,
    to_screen: &RectTransform,
    layout: &CalculatorLayout,
    highlighted: Option<usize>,
    expression: &str,
) {
    let scale = to_screen.scale().x;
    let border = Stroke::new((BORDER_WIDTH * scale).max(1.0), BORDER);

    let panel = to_screen.transform_rect(to_egui_rect(layout.panel));
    painter.rect_filled(panel, CornerRadius::ZERO, PANEL_FILL);
    painter.rect_stroke(panel, CornerRadius::ZERO, border, StrokeKind::Inside);

    let display = to_screen.transform_rect(to_egui_rect(layout.display_rect()));
    painter.rect_filled(display, CornerRadius::ZERO, DISPLAY_FILL);
    painter.rect_stroke(display, CornerRadius::ZERO, border, StrokeKind::Inside);

    for (index, button) in layout.buttons.iter().enumerate() {
        let rect = to_screen.transform_rect(to_egui_rect(button.rect));
        let fill = if highlighted == Some(index) {
            BUTTON_PRESSED_FILL
        } else {
            BUTTON_FILL
        };
        painter.rect_filled(rect, CornerRadius::ZERO, fill);
        painter.rect_stroke(rect, CornerRadius::ZERO, border, StrokeKind::Inside);
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            button.label,
            FontId::proportional(label_font_size(button.rect) * scale),
            TEXT,
        );
    }

    let text_pos = pos2(
        display.left() + display.width() / 20.0,
        display.center().y,
    );
    painter.text(
        text_pos,
        Align2::LEFT_CENTER,
        expression,
        FontId::proportional(expression_font_size(layout) * scale),
        TEXT,
    );
}

/// Paint every landmark of every hand as a translucent marker
pub fn paint_landmarks(
    painter: &Painter,
    to_screen: &RectTransform,
    hands: &[Hand],
    frame_width: u32,
    frame_height: u32,
) {
    let radius = LANDMARK_RADIUS * to_screen.scale().x;
    let color = Color32::from_white_alpha(128);
    let (w, h) = (frame_width as f32, frame_height as f32);

    for hand in hands {
        for landmark in &hand.landmarks {
            let center = to_screen.transform_pos(pos2(landmark.x * w, landmark.y * h));
            painter.circle_filled(center, radius, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_rect_letterboxes() {
        let available = Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 1000.0));
        let fitted = fit_rect(available, 1400, 900);
        assert!((fitted.width() - 1000.0).abs() < 1e-3);
        assert!((fitted.height() - 1000.0 * 900.0 / 1400.0).abs() < 1e-3);
        assert_eq!(fitted.center(), available.center());
    }

    #[test]
    fn test_fit_rect_empty_frame() {
        let available = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert_eq!(fit_rect(available, 0, 0).area(), 0.0);
    }

    #[test]
    fn test_frame_to_screen_maps_corners() {
        let screen = Rect::from_min_size(pos2(10.0, 20.0), vec2(700.0, 450.0));
        let t = frame_to_screen(1400, 900, screen);
        assert_eq!(t.transform_pos(Pos2::ZERO), pos2(10.0, 20.0));
        assert_eq!(t.transform_pos(pos2(1400.0, 900.0)), pos2(710.0, 470.0));
        assert_eq!(t.scale().x, 0.5);
    }

    #[test]
    fn test_font_sizes_scale_with_layout() {
        let small = CalculatorLayout::compute(640, 480);
        let large = CalculatorLayout::compute(1920, 1080);
        assert!(expression_font_size(&large) > expression_font_size(&small));
        assert!(label_font_size(large.buttons[0].rect) > label_font_size(small.buttons[0].rect));
    }
}

//! Calculator panel and button layout
//!
//! The layout is a pure function of the frame size. It is rebuilt every frame,
//! so a camera that changes resolution mid-session never sees stale rectangles.

/// Panel width as a fraction of the frame width
pub const PANEL_WIDTH_FRACTION: f64 = 0.35;
/// Panel height as a fraction of the frame height
pub const PANEL_HEIGHT_FRACTION: f64 = 0.95;
/// Gap between the panel and the right frame edge, as a fraction of frame width
pub const RIGHT_MARGIN_FRACTION: f64 = 0.05;
/// Gap above the panel, as a fraction of frame height
pub const TOP_OFFSET_FRACTION: f64 = 0.025;

/// Columns in the button grid
pub const GRID_COLUMNS: i32 = 4;
/// Rows in the panel: display row, header row and four grid rows
pub const PANEL_ROWS: i32 = 6;

/// Digit/operator grid, row-major
pub const GRID_LABELS: [[&str; 4]; 4] = [
    ["1", "2", "3", "/"],
    ["4", "5", "6", "*"],
    ["7", "8", "9", "-"],
    ["0", ".", "=", "+"],
];

/// Axis-aligned rectangle in frame pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Strict interior test. Points on an edge are outside.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        (self.x as f32) < px
            && px < self.right() as f32
            && (self.y as f32) < py
            && py < self.bottom() as f32
    }
}

/// What a button does when pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Digit, decimal point or arithmetic operator appended verbatim
    Literal(char),
    /// Evaluate the expression
    Equals,
    /// Remove the last character
    Delete,
    /// Append the power operator
    Power,
    /// Empty the expression
    Clear,
}

impl Key {
    /// Map a button label to its action
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "=" => Some(Key::Equals),
            "DEL" => Some(Key::Delete),
            "^" => Some(Key::Power),
            "CLEAR" => Some(Key::Clear),
            _ => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(c @ ('0'..='9' | '.' | '/' | '*' | '-' | '+')), None) => {
                        Some(Key::Literal(c))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// A labelled button rectangle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub rect: Rect,
    pub label: &'static str,
}

impl Button {
    pub fn new(x: i32, y: i32, w: i32, h: i32, label: &'static str) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            label,
        }
    }
}

/// Panel rectangle plus every button, in hit-test order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalculatorLayout {
    /// Whole calculator panel
    pub panel: Rect,
    /// Width of a single grid cell
    pub button_width: i32,
    /// Height of a single grid cell (also the display row height)
    pub button_height: i32,
    /// Sixteen grid buttons row-major, then CLEAR, DEL and ^
    pub buttons: Vec<Button>,
}

impl CalculatorLayout {
    /// Lay the calculator out for a frame of the given size
    pub fn compute(frame_width: u32, frame_height: u32) -> Self {
        let w = f64::from(frame_width);
        let h = f64::from(frame_height);

        let panel_width = (w * PANEL_WIDTH_FRACTION) as i32;
        let panel_height = (h * PANEL_HEIGHT_FRACTION) as i32;
        let right_margin = (w * RIGHT_MARGIN_FRACTION) as i32;
        let start_x = frame_width as i32 - panel_width - right_margin;
        let start_y = (h * TOP_OFFSET_FRACTION) as i32;

        let button_width = panel_width / GRID_COLUMNS;
        let button_height = panel_height / PANEL_ROWS;

        let mut buttons = Vec::with_capacity(19);
        for (row, labels) in GRID_LABELS.iter().enumerate() {
            for (col, label) in labels.iter().enumerate() {
                buttons.push(Button::new(
                    start_x + col as i32 * button_width,
                    start_y + (row as i32 + 2) * button_height,
                    button_width,
                    button_height,
                    label,
                ));
            }
        }

        let header_y = start_y + button_height;
        buttons.push(Button::new(start_x, header_y, button_width * 2, button_height, "CLEAR"));
        buttons.push(Button::new(start_x + button_width * 2, header_y, button_width, button_height, "DEL"));
        buttons.push(Button::new(start_x + button_width * 3, header_y, button_width, button_height, "^"));

        Self {
            panel: Rect::new(start_x, start_y, panel_width, panel_height),
            button_width,
            button_height,
            buttons,
        }
    }

    /// Display row at the top of the panel where the expression is drawn
    pub fn display_rect(&self) -> Rect {
        Rect::new(self.panel.x, self.panel.y, self.panel.w, self.button_height)
    }

    /// First button (in layout order) whose interior contains the point
    pub fn hit_test(&self, px: f32, py: f32) -> Option<usize> {
        self.buttons.iter().position(|b| b.rect.contains(px, py))
    }

    /// Find a button by label
    pub fn button(&self, label: &str) -> Option<&Button> {
        self.buttons.iter().find(|b| b.label == label)
    }
}

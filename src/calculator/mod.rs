//! Calculator core
//!
//! Layout of the on-screen keypad, the expression buffer it edits, the
//! arithmetic evaluator behind `=`, and the session that turns per-frame pinch
//! readings into debounced button presses.

pub mod eval;
pub mod expression;
pub mod layout;
pub mod session;

pub use eval::{evaluate, EvalError, Value};
pub use expression::{Expression, ERROR_TEXT};
pub use layout::{Button, CalculatorLayout, Key, Rect};
pub use session::{CalculatorSession, ClickEvent, FrameOutcome, SessionSettings};

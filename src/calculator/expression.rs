//! Expression buffer edited by button presses

use std::fmt;

use super::eval::{self, EvalError};
use super::layout::Key;

/// Text shown after a failed evaluation
pub const ERROR_TEXT: &str = "error";

/// Token appended by the `^` button
pub const POWER_TOKEN: &str = "**";

/// Current calculator input or result
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    /// Typed input, or the result of the last evaluation
    Text(String),
    /// The last evaluation failed
    Error,
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Text(String::new())
    }
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Expression::Text(text) => text,
            Expression::Error => ERROR_TEXT,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expression::Error)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Expression::Text(text) if text.is_empty())
    }

    /// Apply one key press.
    ///
    /// Returns the evaluation failure when `=` moved the expression into the
    /// error state, so the caller can report why.
    pub fn apply(&mut self, key: Key) -> Result<(), EvalError> {
        match key {
            Key::Literal(c) => match self {
                Expression::Text(text) => text.push(c),
                Expression::Error => *self = Expression::Text(c.to_string()),
            },
            Key::Delete => match self {
                Expression::Text(text) => {
                    text.pop();
                }
                Expression::Error => *self = Expression::default(),
            },
            Key::Power => {
                if let Expression::Text(text) = self {
                    text.push_str(POWER_TOKEN);
                }
            }
            Key::Clear => *self = Expression::default(),
            Key::Equals => {
                let Expression::Text(text) = self else {
                    return Ok(());
                };
                if text.is_empty() {
                    return Ok(());
                }
                match eval::evaluate(text) {
                    Ok(value) => *self = Expression::Text(value.to_string()),
                    Err(e) => {
                        *self = Expression::Error;
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

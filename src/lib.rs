//! Gesture Calculator - a calculator operated by pinching in front of a webcam
//!
//! Captures camera frames, tracks the hand with an ONNX landmark model and
//! turns index/middle fingertip pinches over an on-screen keypad into
//! calculator input.

pub mod app;
pub mod calculator;
pub mod camera;
pub mod config;
pub mod gesture;
pub mod ml;
pub mod pipeline;
pub mod render;

pub use app::App;

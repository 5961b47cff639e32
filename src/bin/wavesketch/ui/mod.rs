//! TUI widgets for wavesketch
//!
//! Stateless render functions plus the two pieces of UI state that need to
//! outlive a frame: the drawing canvas and the spectrum analyzer.

mod canvas;
mod keyboard;
mod scope;
mod spectrum;

pub use canvas::{render_canvas, Canvas};
pub use keyboard::render_keyboard;
pub use scope::{render_preview, render_scope};
pub use spectrum::{render_spectrum, SpectrumAnalyzer};

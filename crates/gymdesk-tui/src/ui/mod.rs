//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title/status bars and overlays
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling
//! - `views`: per-screen content (dashboard, tables, forms, profile)

pub mod input;
pub mod render;
pub mod styles;
pub mod views;

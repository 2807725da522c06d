//! TUI module for the interactive browser.
//!
//! Uses `ratatui` + `crossterm` for rendering.

mod browser;
/// Browser state types.
pub mod state;
mod ui;

pub use browser::{BrowserData, preload_tabs, run_browser};

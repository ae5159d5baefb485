//! tailgrid-tui: the multi-pane log dashboard.
//!
//! Pane buffers, grid layout, focus and selection are plain state driven by
//! [`app::App`]; the `tailgrid` binary wires that state to a crossterm
//! terminal and the async workers from `tailgrid-runtime`.

pub mod app;
pub mod config;
pub mod debounce;
pub mod focus;
pub mod keymap;
pub mod layout;
pub mod logging;
pub mod pane;
pub mod panel_error_boundary;
pub mod selection;
pub mod theme;
pub mod toast;

/// Stable crate label used by bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "tailgrid-tui"
}

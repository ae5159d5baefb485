//! tailgrid-render: boundary layer between the dashboard and the terminal backend.
//!
//! Panes and overlays draw into a [`render::RenderFrame`] cell grid; only the
//! binary translates frames and input to and from the real terminal.

/// Stable crate label used by bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "tailgrid-render"
}

pub mod input;
pub mod render;
pub mod sgr;
pub mod style;
pub mod widgets;

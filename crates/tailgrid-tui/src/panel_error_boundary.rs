//! Guard pane rendering so one failing pane does not take down the grid.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tailgrid_render::render::{FrameSize, RenderFrame, TextRole};
use tailgrid_render::style::ThemeSpec;

/// Text shown in place of a pane whose renderer failed.
pub const RENDER_ERROR_PLACEHOLDER: &str = "render error";

/// Render a pane inside a panic boundary; a failure yields a frame of the
/// same size holding only the placeholder.
#[must_use]
pub fn render_pane_with_boundary<F>(pane_name: &str, size: FrameSize, theme: ThemeSpec, render: F) -> RenderFrame
where
    F: FnOnce() -> RenderFrame,
{
    match catch_unwind(AssertUnwindSafe(render)) {
        Ok(frame) if frame.size() == size => frame,
        Ok(frame) => {
            tracing::error!(pane = pane_name, got = ?frame.size(), want = ?size, "pane rendered at wrong size");
            render_placeholder(size, theme)
        }
        Err(payload) => {
            tracing::error!(pane = pane_name, cause = %panic_payload_message(payload), "pane render failed");
            render_placeholder(size, theme)
        }
    }
}

fn render_placeholder(size: FrameSize, theme: ThemeSpec) -> RenderFrame {
    let mut frame = RenderFrame::new(size, theme);
    if size.width == 0 || size.height == 0 {
        return frame;
    }
    let text: String = RENDER_ERROR_PLACEHOLDER.chars().take(size.width).collect();
    let x = (size.width - text.chars().count()) / 2;
    frame.draw_text(x, size.height / 2, &text, TextRole::Danger);
    frame
}

fn panic_payload_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "unknown panic payload".to_owned(),
        },
    }
}

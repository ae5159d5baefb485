//! Cell grid that panes, the status bar and overlays draw into.
//!
//! Every write goes through one clipped primitive, so nothing drawn here can
//! spill outside the frame or wrap onto the next row.

use crate::style::{StyleToken, ThemeSpec};
use crate::widgets::BorderStyle;

/// Terminal color: ANSI256 index or 24-bit RGB from a log line's SGR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColor {
    Ansi256(u8),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

/// A rectangular region in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    #[must_use]
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Content area inside a one-cell border; empty when there is no room.
    #[must_use]
    pub fn inner(self) -> Self {
        if self.width < 2 || self.height < 2 {
            return Self::new(self.x, self.y, 0, 0);
        }
        Self::new(self.x + 1, self.y + 1, self.width - 2, self.height - 2)
    }

    #[must_use]
    pub fn contains(self, x: usize, y: usize) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: TermColor,
    pub bg: TermColor,
    pub bold: bool,
    pub dim: bool,
    pub underline: bool,
}

impl CellStyle {
    /// Theme foreground on theme background, no attributes.
    #[must_use]
    pub fn base(theme: ThemeSpec) -> Self {
        Self {
            fg: TermColor::Ansi256(theme.color(StyleToken::Foreground)),
            bg: TermColor::Ansi256(theme.color(StyleToken::Background)),
            bold: false,
            dim: false,
            underline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCell {
    pub glyph: char,
    pub style: CellStyle,
}

/// A character of a log line with the style its escape codes resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledChar {
    pub ch: char,
    pub style: CellStyle,
}

/// What a piece of chrome text means; the theme decides how it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Primary,
    Muted,
    Accent,
    Success,
    Danger,
    Warning,
    Info,
    Focus,
}

impl TextRole {
    fn token(self) -> StyleToken {
        match self {
            Self::Primary => StyleToken::Foreground,
            Self::Muted => StyleToken::Muted,
            Self::Accent => StyleToken::Accent,
            Self::Success => StyleToken::Success,
            Self::Danger => StyleToken::Danger,
            Self::Warning => StyleToken::Warning,
            Self::Info => StyleToken::Info,
            Self::Focus => StyleToken::Focus,
        }
    }
}

/// Each pane renders into its own frame, which is then blitted into the
/// screen frame at the pane's layout rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    size: FrameSize,
    cells: Vec<FrameCell>,
    theme: ThemeSpec,
}

impl RenderFrame {
    #[must_use]
    pub fn new(size: FrameSize, theme: ThemeSpec) -> Self {
        let blank = FrameCell {
            glyph: ' ',
            style: CellStyle::base(theme),
        };
        Self {
            size,
            cells: vec![blank; size.width.saturating_mul(size.height)],
            theme,
        }
    }

    #[must_use]
    pub fn theme(&self) -> ThemeSpec {
        self.theme
    }

    #[must_use]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.size.width && y < self.size.height).then(|| y * self.size.width + x)
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<FrameCell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    fn put(&mut self, x: usize, y: usize, cell: FrameCell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
        }
    }

    /// Write cells left to right from (x, y), stopping at the frame edge.
    fn write_run(&mut self, x: usize, y: usize, run: impl Iterator<Item = FrameCell>) {
        if y >= self.size.height {
            return;
        }
        for (col, cell) in (x..self.size.width).zip(run) {
            self.put(col, y, cell);
        }
    }

    /// Replace the background of one cell, keeping glyph and foreground.
    pub fn set_bg(&mut self, x: usize, y: usize, bg: TermColor) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx].style.bg = bg;
        }
    }

    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, role: TextRole) {
        let style = self.style_for_role(role);
        self.draw_with_style(x, y, text, style, usize::MAX);
    }

    /// Draw text in one style, writing at most `max_width` cells.
    pub fn draw_with_style(&mut self, x: usize, y: usize, text: &str, style: CellStyle, max_width: usize) {
        let run = text.chars().take(max_width).map(|glyph| FrameCell { glyph, style });
        self.write_run(x, y, run);
    }

    /// Draw a decoded log line, writing at most `max_width` cells.
    pub fn draw_styled_chars(&mut self, x: usize, y: usize, chars: &[StyledChar], max_width: usize) {
        let run = chars.iter().take(max_width).map(|styled| FrameCell {
            glyph: styled.ch,
            style: styled.style,
        });
        self.write_run(x, y, run);
    }

    /// Draw a bordered pane with its title set into the top edge and return
    /// the content area.
    pub fn draw_panel(&mut self, rect: Rect, title: &str, border: BorderStyle, border_color: TermColor) -> Rect {
        if rect.width < 2 || rect.height < 2 {
            return rect.inner();
        }
        let glyphs = border.glyphs();
        let edge = CellStyle {
            fg: border_color,
            ..CellStyle::base(self.theme)
        };
        self.fill_bg(rect, edge.bg);

        let right = rect.x + rect.width - 1;
        let bottom = rect.y + rect.height - 1;
        let line = |glyph| FrameCell { glyph, style: edge };
        for col in rect.x + 1..right {
            self.put(col, rect.y, line(glyphs.horizontal()));
            self.put(col, bottom, line(glyphs.horizontal()));
        }
        for row in rect.y + 1..bottom {
            self.put(rect.x, row, line(glyphs.vertical()));
            self.put(right, row, line(glyphs.vertical()));
        }
        let [top_left, top_right, bottom_left, bottom_right] = glyphs.corners();
        self.put(rect.x, rect.y, line(top_left));
        self.put(right, rect.y, line(top_right));
        self.put(rect.x, bottom, line(bottom_left));
        self.put(right, bottom, line(bottom_right));

        if !title.is_empty() && rect.width > 4 {
            let name: String = title.chars().take(rect.width - 4).collect();
            let style = CellStyle { bold: true, ..edge };
            self.draw_with_style(rect.x + 1, rect.y, &format!(" {name} "), style, rect.width - 2);
        }
        rect.inner()
    }

    /// Blank a region with the given background.
    pub fn fill_bg(&mut self, rect: Rect, bg: TermColor) {
        let blank = FrameCell {
            glyph: ' ',
            style: CellStyle {
                bg,
                ..CellStyle::base(self.theme)
            },
        };
        for row in rect.y..rect.y + rect.height {
            self.write_run(rect.x, row, std::iter::repeat(blank).take(rect.width));
        }
    }

    /// Copy `other` with its top-left corner at (x, y), clipped to this frame.
    pub fn blit(&mut self, x: usize, y: usize, other: &RenderFrame) {
        if other.size.width == 0 {
            return;
        }
        for (row, cells) in other.cells.chunks(other.size.width).enumerate() {
            self.write_run(x, y + row, cells.iter().copied());
        }
    }

    #[must_use]
    pub fn row_text(&self, y: usize) -> String {
        if y >= self.size.height {
            return String::new();
        }
        let start = y * self.size.width;
        self.cells[start..start + self.size.width]
            .iter()
            .map(|cell| cell.glyph)
            .collect()
    }

    /// Glyphs only, one line per row.
    #[must_use]
    pub fn snapshot(&self) -> String {
        (0..self.size.height)
            .map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn color_for_role(&self, role: TextRole) -> TermColor {
        TermColor::Ansi256(self.theme.color(role.token()))
    }

    /// Role color on the frame background, with the theme's emphasis.
    #[must_use]
    pub fn style_for_role(&self, role: TextRole) -> CellStyle {
        let emphasis = self.theme.emphasis;
        CellStyle {
            fg: self.color_for_role(role),
            bold: match role {
                TextRole::Accent | TextRole::Danger | TextRole::Warning => emphasis.bold_alerts,
                TextRole::Focus => true,
                _ => false,
            },
            dim: role == TextRole::Muted && emphasis.dim_muted,
            underline: role == TextRole::Focus && emphasis.underline_focus,
            ..CellStyle::base(self.theme)
        }
    }
}

//! Pane chrome: border weights and their box-drawing glyphs.

/// Border treatment for a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    Rounded,
    Heavy,
}

/// Box-drawing glyphs in the order top-left, top-right, bottom-left,
/// bottom-right, horizontal, vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs([char; 6]);

impl BorderGlyphs {
    #[must_use]
    pub fn corners(self) -> [char; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    #[must_use]
    pub fn horizontal(self) -> char {
        self.0[4]
    }

    #[must_use]
    pub fn vertical(self) -> char {
        self.0[5]
    }
}

impl BorderStyle {
    /// Border used for a pane; the focused pane stands out.
    #[must_use]
    pub fn for_focus(focused: bool) -> Self {
        if focused {
            Self::Heavy
        } else {
            Self::Rounded
        }
    }

    #[must_use]
    pub fn glyphs(self) -> BorderGlyphs {
        match self {
            Self::Rounded => BorderGlyphs(['╭', '╮', '╰', '╯', '─', '│']),
            Self::Heavy => BorderGlyphs(['┏', '┓', '┗', '┛', '━', '┃']),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BorderStyle;

    #[test]
    fn focused_pane_gets_the_heavy_border() {
        assert_eq!(BorderStyle::for_focus(true).glyphs().horizontal(), '━');
        assert_eq!(BorderStyle::for_focus(false).glyphs().corners()[0], '╭');
        assert_ne!(
            BorderStyle::Heavy.glyphs().vertical(),
            BorderStyle::Rounded.glyphs().vertical()
        );
    }
}

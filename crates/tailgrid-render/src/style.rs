//! Palettes for the log dashboard.
//!
//! A theme is a table of ANSI256 indexes keyed by [`StyleToken`] plus a small
//! emphasis policy. Log content keeps its own SGR colors; the palette only
//! covers chrome, badges, selection and search highlights.

/// Logical theme choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
    HighContrast,
}

impl ThemeKind {
    /// Parse a palette name from configuration. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            "high-contrast" | "high_contrast" | "contrast" => Some(Self::HighContrast),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "default",
            Self::Light => "light",
            Self::HighContrast => "high-contrast",
        }
    }
}

/// Colors a theme provides, in palette table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleToken {
    Background,
    Foreground,
    Muted,
    Accent,
    Success,
    Danger,
    Warning,
    Info,
    Focus,
    Selection,
    Match,
    CurrentMatch,
}

const TOKEN_COUNT: usize = 12;

//                         bg   fg  mute acc  ok  err warn info foc  sel  hit  cur
const DARK: [u8; TOKEN_COUNT] = [16, 252, 244, 45, 41, 197, 220, 117, 81, 24, 58, 130];
const LIGHT: [u8; TOKEN_COUNT] = [255, 234, 244, 25, 28, 160, 172, 31, 21, 153, 229, 214];
const HIGH_CONTRAST: [u8; TOKEN_COUNT] = [16, 231, 250, 51, 118, 203, 226, 159, 229, 21, 94, 202];

/// Text attributes a theme layers on top of color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emphasis {
    /// Accent, danger and warning text is bold.
    pub bold_alerts: bool,
    /// Muted text (timestamps, hints) is dimmed.
    pub dim_muted: bool,
    /// The focused pane's title is underlined as well as colored.
    pub underline_focus: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSpec {
    pub kind: ThemeKind,
    pub emphasis: Emphasis,
    colors: [u8; TOKEN_COUNT],
}

impl ThemeSpec {
    #[must_use]
    pub fn color(self, token: StyleToken) -> u8 {
        self.colors[token as usize]
    }

    #[must_use]
    pub fn for_kind(kind: ThemeKind) -> Self {
        let (colors, emphasis) = match kind {
            ThemeKind::Dark => (
                DARK,
                Emphasis {
                    bold_alerts: true,
                    dim_muted: true,
                    underline_focus: false,
                },
            ),
            ThemeKind::Light => (
                LIGHT,
                Emphasis {
                    bold_alerts: true,
                    dim_muted: false,
                    underline_focus: false,
                },
            ),
            // Dim is unreliable on 16-color terminals, so it never relies on it.
            ThemeKind::HighContrast => (
                HIGH_CONTRAST,
                Emphasis {
                    bold_alerts: true,
                    dim_muted: false,
                    underline_focus: true,
                },
            ),
        };
        Self {
            kind,
            emphasis,
            colors,
        }
    }
}

impl Default for ThemeSpec {
    fn default() -> Self {
        Self::for_kind(ThemeKind::Dark)
    }
}

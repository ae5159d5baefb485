//! Palette selection.

use tailgrid_render::style::{ThemeKind, ThemeSpec};

pub const PALETTE_ORDER: [ThemeKind; 3] = [ThemeKind::Dark, ThemeKind::HighContrast, ThemeKind::Light];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCapability {
    Ansi16,
    Ansi256,
}

/// Guess color depth from `TERM`; 16-color terminals get the high-contrast
/// palette regardless of configuration.
#[must_use]
pub fn detect_color_capability(term: Option<&str>) -> ColorCapability {
    match term.map(str::trim) {
        Some("linux" | "vt100" | "vt220" | "xterm" | "ansi") => ColorCapability::Ansi16,
        _ => ColorCapability::Ansi256,
    }
}

/// Theme for a configured palette name; unknown names fall back to default.
#[must_use]
pub fn resolve_theme(name: &str, capability: ColorCapability) -> ThemeSpec {
    if capability == ColorCapability::Ansi16 {
        return ThemeSpec::for_kind(ThemeKind::HighContrast);
    }
    ThemeSpec::for_kind(ThemeKind::parse(name).unwrap_or(ThemeKind::Dark))
}

#[must_use]
pub fn cycle_theme(current: ThemeKind, delta: isize) -> ThemeSpec {
    let len = PALETTE_ORDER.len() as isize;
    let index = PALETTE_ORDER
        .iter()
        .position(|kind| *kind == current)
        .unwrap_or(0) as isize;
    let next = (index + delta).rem_euclid(len) as usize;
    ThemeSpec::for_kind(PALETTE_ORDER[next])
}

#[cfg(test)]
mod tests {
    use tailgrid_render::style::ThemeKind;

    use super::{cycle_theme, detect_color_capability, resolve_theme, ColorCapability};

    #[test]
    fn unknown_palette_falls_back_to_default() {
        assert_eq!(resolve_theme("sunset", ColorCapability::Ansi256).kind, ThemeKind::Dark);
        assert_eq!(
            resolve_theme(" High-Contrast ", ColorCapability::Ansi256).kind,
            ThemeKind::HighContrast
        );
    }

    #[test]
    fn sixteen_color_terminals_force_high_contrast() {
        assert_eq!(detect_color_capability(Some("linux")), ColorCapability::Ansi16);
        assert_eq!(detect_color_capability(Some("xterm-256color")), ColorCapability::Ansi256);
        assert_eq!(resolve_theme("light", ColorCapability::Ansi16).kind, ThemeKind::HighContrast);
    }

    #[test]
    fn cycle_wraps_both_ways() {
        assert_eq!(cycle_theme(ThemeKind::Dark, 1).kind, ThemeKind::HighContrast);
        assert_eq!(cycle_theme(ThemeKind::Dark, -1).kind, ThemeKind::Light);
        assert_eq!(cycle_theme(ThemeKind::Light, 1).kind, ThemeKind::Dark);
    }
}

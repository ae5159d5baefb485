//! SGR interpretation for sanitized log content.
//!
//! Input is expected to contain only SGR escapes (`ESC [ params m`); any other
//! escape byte is skipped rather than rendered.

use crate::render::{CellStyle, StyledChar, TermColor};

const ESC: char = '\u{1b}';

/// Resolve `text` into styled characters, starting from `base`.
///
/// `0`/empty resets to `base`; unsupported parameters are ignored.
#[must_use]
pub fn styled_chars(text: &str, base: CellStyle) -> Vec<StyledChar> {
    let mut out = Vec::with_capacity(text.len());
    let mut style = base;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != ESC {
            out.push(StyledChar { ch, style });
            continue;
        }
        if chars.peek() != Some(&'[') {
            continue;
        }
        chars.next();
        let mut params = String::new();
        let mut terminated = false;
        for next in chars.by_ref() {
            if next == 'm' {
                terminated = true;
                break;
            }
            if next.is_ascii_digit() || next == ';' || next == ':' {
                params.push(next);
            } else {
                break;
            }
        }
        if terminated {
            apply_sgr(&params, base, &mut style);
        }
    }
    out
}

fn apply_sgr(params: &str, base: CellStyle, style: &mut CellStyle) {
    let codes: Vec<u16> = params
        .split([';', ':'])
        .map(|code| code.parse::<u16>().unwrap_or(0))
        .collect();
    let mut i = 0usize;
    while i < codes.len() {
        match codes[i] {
            0 => *style = base,
            1 => style.bold = true,
            2 => style.dim = true,
            4 => style.underline = true,
            22 => {
                style.bold = false;
                style.dim = false;
            }
            24 => style.underline = false,
            code @ 30..=37 => style.fg = TermColor::Ansi256((code - 30) as u8),
            code @ 90..=97 => style.fg = TermColor::Ansi256((code - 90 + 8) as u8),
            39 => style.fg = base.fg,
            code @ 40..=47 => style.bg = TermColor::Ansi256((code - 40) as u8),
            code @ 100..=107 => style.bg = TermColor::Ansi256((code - 100 + 8) as u8),
            49 => style.bg = base.bg,
            38 | 48 => {
                let (color, used) = extended_color(&codes[i + 1..]);
                if let Some(color) = color {
                    if codes[i] == 38 {
                        style.fg = color;
                    } else {
                        style.bg = color;
                    }
                }
                i += used;
            }
            _ => {}
        }
        i += 1;
    }
}

/// Parse `5;n` or `2;r;g;b`; returns the color and how many codes were consumed.
fn extended_color(rest: &[u16]) -> (Option<TermColor>, usize) {
    match rest {
        [5, n, ..] => (Some(TermColor::Ansi256((*n).min(255) as u8)), 2),
        [2, r, g, b, ..] => (
            Some(TermColor::Rgb(
                (*r).min(255) as u8,
                (*g).min(255) as u8,
                (*b).min(255) as u8,
            )),
            4,
        ),
        [] => (None, 0),
        _ => (None, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::styled_chars;
    use crate::render::{CellStyle, TermColor};
    use crate::style::ThemeSpec;

    fn base() -> CellStyle {
        CellStyle::base(ThemeSpec::default())
    }

    #[test]
    fn plain_text_keeps_base_style() {
        let chars = styled_chars("ok", base());
        assert_eq!(chars.len(), 2);
        assert!(chars.iter().all(|c| c.style == base()));
    }

    #[test]
    fn basic_colors_and_reset() {
        let chars = styled_chars("\x1b[31mr\x1b[0mn", base());
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].style.fg, TermColor::Ansi256(1));
        assert_eq!(chars[1].style, base());
    }

    #[test]
    fn bright_bold_and_extended_colors() {
        let chars = styled_chars("\x1b[1;92ma\x1b[38;5;208mb\x1b[48;2;1;2;3mc", base());
        assert!(chars[0].style.bold);
        assert_eq!(chars[0].style.fg, TermColor::Ansi256(10));
        assert_eq!(chars[1].style.fg, TermColor::Ansi256(208));
        assert!(chars[1].style.bold);
        assert_eq!(chars[2].style.bg, TermColor::Rgb(1, 2, 3));
    }

    #[test]
    fn empty_params_reset() {
        let chars = styled_chars("\x1b[4mu\x1b[mv", base());
        assert!(chars[0].style.underline);
        assert!(!chars[1].style.underline);
    }
}

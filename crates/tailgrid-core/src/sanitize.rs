//! Terminal control sequence sanitizer for untrusted container output.
//!
//! Everything that could move the cursor, switch screens, retitle the window
//! or otherwise corrupt the dashboard is removed. SGR (color/style) sequences
//! are kept byte-for-byte so the renderer can color them.
//!
//! ```text
//! ESC c                  reset to initial state        -> dropped
//! ESC [ params final     CSI (SGR when final == 'm')   -> SGR kept, rest dropped
//! ESC ] / P / _ / ^ / X  OSC, DCS, APC, PM, SOS string -> dropped through BEL or ST
//! ESC <byte>             two/three byte escapes        -> dropped
//! C0 / C1 / DEL          bare controls incl. CR        -> dropped (TAB expands)
//! ```

use crate::line::MAX_LINE_CHARS;

const ESC: char = '\u{1b}';
const BEL: char = '\u{7}';
const CSI_8BIT: char = '\u{9b}';
const ST_8BIT: char = '\u{9c}';
const TAB_WIDTH: usize = 4;

/// Appended when a line is cut at [`MAX_LINE_CHARS`]; counted inside the cap.
pub const TRUNCATION_MARKER: &str = " …[truncated]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Text(char),
    Sgr(&'a str),
}

/// Sanitize one log line: strip unsafe sequences, cap visible width, trim the end.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)` for every input.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let pieces = strip_controls(input, true);
    let visible = pieces
        .iter()
        .filter(|piece| matches!(piece, Piece::Text(_)))
        .count();

    let mut out = String::with_capacity(input.len().min(MAX_LINE_CHARS * 4));
    if visible > MAX_LINE_CHARS {
        let keep = MAX_LINE_CHARS - TRUNCATION_MARKER.chars().count();
        let mut kept = 0usize;
        for piece in pieces {
            match piece {
                Piece::Text(ch) => {
                    if kept == keep {
                        break;
                    }
                    out.push(ch);
                    kept += 1;
                }
                Piece::Sgr(seq) => out.push_str(seq),
            }
        }
        out.push_str(TRUNCATION_MARKER);
        return out;
    }

    for piece in pieces {
        match piece {
            Piece::Text(ch) => out.push(ch),
            Piece::Sgr(seq) => out.push_str(seq),
        }
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

/// Lossy UTF-8 decode followed by [`sanitize`].
#[must_use]
pub fn sanitize_bytes(input: &[u8]) -> String {
    sanitize(&String::from_utf8_lossy(input))
}

/// Visible text only: every escape sequence (SGR included) removed.
#[must_use]
pub fn plain_text(input: &str) -> String {
    strip_controls(input, false)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Text(ch) => Some(ch),
            Piece::Sgr(_) => None,
        })
        .collect()
}

fn strip_controls(input: &str, keep_sgr: bool) -> Vec<Piece<'_>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut pieces = Vec::with_capacity(chars.len());
    let mut column = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i].1;
        match ch {
            ESC => {
                i = consume_escape(input, &chars, i, keep_sgr, &mut pieces);
            }
            CSI_8BIT => {
                i = consume_csi(input, &chars, i, i + 1, false, &mut pieces);
            }
            '\u{90}' | '\u{98}' | '\u{9d}' | '\u{9e}' | '\u{9f}' => {
                i = skip_string(&chars, i + 1);
            }
            '\t' => {
                let spaces = TAB_WIDTH - (column % TAB_WIDTH);
                for _ in 0..spaces {
                    pieces.push(Piece::Text(' '));
                }
                column += spaces;
                i += 1;
            }
            _ if ch.is_control() => {
                i += 1;
            }
            _ => {
                pieces.push(Piece::Text(ch));
                column += 1;
                i += 1;
            }
        }
    }
    pieces
}

/// Consume the escape starting at `start` (an ESC) and return the next index to scan.
fn consume_escape<'a>(
    input: &'a str,
    chars: &[(usize, char)],
    start: usize,
    keep_sgr: bool,
    pieces: &mut Vec<Piece<'a>>,
) -> usize {
    let Some(&(_, next)) = chars.get(start + 1) else {
        return start + 1;
    };
    match next {
        '[' => consume_csi(input, chars, start, start + 2, keep_sgr, pieces),
        ']' | 'P' | '_' | '^' | 'X' => skip_string(chars, start + 2),
        // Character set designators carry one more byte.
        '(' | ')' | '*' | '+' | '-' | '.' | '/' | '#' | '%' | ' ' => match chars.get(start + 2) {
            Some(&(_, designator)) if !designator.is_control() => start + 3,
            _ => start + 2,
        },
        '\u{30}'..='\u{7e}' => start + 2,
        // Lone ESC: drop it and rescan whatever follows.
        _ => start + 1,
    }
}

/// Consume a control sequence whose parameters start at `body`.
///
/// Malformed sequences are dropped up to the offending character, which is
/// rescanned so a following real sequence is still recognized.
fn consume_csi<'a>(
    input: &'a str,
    chars: &[(usize, char)],
    start: usize,
    body: usize,
    keep_sgr: bool,
    pieces: &mut Vec<Piece<'a>>,
) -> usize {
    let mut j = body;
    let mut plain_params = true;
    while let Some(&(byte_idx, ch)) = chars.get(j) {
        match ch {
            '0'..='9' | ';' | ':' => {}
            '\u{20}'..='\u{3f}' => plain_params = false,
            '\u{40}'..='\u{7e}' => {
                if keep_sgr && ch == 'm' && plain_params {
                    let from = chars[start].0;
                    let to = byte_idx + ch.len_utf8();
                    pieces.push(Piece::Sgr(&input[from..to]));
                }
                return j + 1;
            }
            _ => return j,
        }
        j += 1;
    }
    chars.len()
}

/// Skip an OSC/DCS/APC/PM/SOS string body through its terminator.
fn skip_string(chars: &[(usize, char)], body: usize) -> usize {
    let mut j = body;
    while let Some(&(_, ch)) = chars.get(j) {
        match ch {
            BEL | ST_8BIT => return j + 1,
            ESC => {
                return match chars.get(j + 1) {
                    Some(&(_, '\\')) => j + 2,
                    _ => j,
                };
            }
            _ => j += 1,
        }
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::{plain_text, sanitize, sanitize_bytes, TRUNCATION_MARKER};
    use crate::line::MAX_LINE_CHARS;

    #[test]
    fn sgr_sequences_survive_unchanged() {
        assert_eq!(sanitize("\x1b[31mred\x1b[0m"), "\x1b[31mred\x1b[0m");
        assert_eq!(
            sanitize("\x1b[1;38;5;208mwarn\x1b[m"),
            "\x1b[1;38;5;208mwarn\x1b[m"
        );
    }

    #[test]
    fn strips_reset_erase_and_cursor_movement() {
        assert_eq!(sanitize("\x1bcboot"), "boot");
        assert_eq!(sanitize("a\x1b[2Jb\x1b[Kc"), "abc");
        assert_eq!(sanitize("\x1b[10;5Hx\x1b[3Ay\x1b7z\x1b8"), "xyz");
        assert_eq!(sanitize("\x1b[1;24rscroll"), "scroll");
    }

    #[test]
    fn strips_mode_switches_and_window_ops() {
        assert_eq!(sanitize("\x1b[?1049hfull\x1b[?1049l"), "full");
        assert_eq!(sanitize("\x1b[?25lhidden"), "hidden");
        assert_eq!(sanitize("\x1b[8;40;120tsize"), "size");
    }

    #[test]
    fn strips_osc_and_dcs_strings() {
        assert_eq!(sanitize("\x1b]0;pwned title\x07after"), "after");
        assert_eq!(sanitize("\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\"), "link");
        assert_eq!(sanitize("\x1bPq#0;2;0;0;0\x1b\\ok"), "ok");
        assert_eq!(sanitize("\x1b_apc\x1b\\\x1b^pm\x07\x1bXsos\x1b\\end"), "end");
    }

    #[test]
    fn unterminated_string_is_dropped_to_end() {
        assert_eq!(sanitize("keep\x1b]2;never ends"), "keep");
    }

    #[test]
    fn interrupted_string_keeps_following_sgr() {
        assert_eq!(sanitize("\x1b]0;oops\x1b[32mgreen"), "\x1b[32mgreen");
    }

    #[test]
    fn carriage_returns_and_controls_removed() {
        assert_eq!(sanitize("progress 10%\rprogress 20%\r\n"), "progress 10%progress 20%");
        assert_eq!(sanitize("bell\x07 back\x08space\x7f"), "bell backspace");
    }

    #[test]
    fn tabs_expand_to_next_stop() {
        assert_eq!(sanitize("a\tb"), "a   b");
        assert_eq!(sanitize("abcd\te"), "abcd    e");
    }

    #[test]
    fn malformed_csi_does_not_swallow_text() {
        assert_eq!(sanitize("\x1b[12\x1b[31mred"), "\x1b[31mred");
        assert_eq!(sanitize("\x1b[12"), "");
        assert_eq!(sanitize("x\x1b"), "x");
        assert_eq!(sanitize("\x1b\x1b[1mbold"), "\x1b[1mbold");
    }

    #[test]
    fn private_sgr_like_sequences_are_not_preserved() {
        assert_eq!(sanitize("\x1b[>4;2mkeys"), "keys");
    }

    #[test]
    fn eight_bit_controls_removed() {
        assert_eq!(sanitize("a\u{9b}2Jb"), "ab");
        assert_eq!(sanitize("a\u{9d}0;t\u{9c}b"), "ab");
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        assert_eq!(sanitize("value   \t "), "value");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn long_lines_are_capped_with_marker_inside_limit() {
        let input = "x".repeat(MAX_LINE_CHARS + 250);
        let out = sanitize(&input);
        assert_eq!(out.chars().count(), MAX_LINE_CHARS);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn cap_counts_visible_characters_only() {
        let input = format!("\x1b[32m{}\x1b[0m", "y".repeat(MAX_LINE_CHARS));
        assert_eq!(sanitize(&input), input);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        assert_eq!(sanitize_bytes(b"ok \xff\xfe done"), "ok \u{fffd}\u{fffd} done");
    }

    #[test]
    fn plain_text_drops_sgr() {
        assert_eq!(plain_text("\x1b[31merror\x1b[0m: disk"), "error: disk");
    }

    #[test]
    fn sanitized_output_never_contains_reset() {
        for input in ["\x1bc", "\x1b\x1bcc", "\x1b[\x1bc", "\x1b]\x1bc\x07"] {
            let out = sanitize(input);
            assert!(!out.contains("\x1bc"), "{input:?} -> {out:?}");
        }
    }
}

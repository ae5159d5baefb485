//! Leading RFC3339 timestamps emitted by the runtime's `timestamps=1` mode.

use chrono::{DateTime, Utc};

/// Width of the runtime's fixed nanosecond RFC3339 form, e.g.
/// `2024-05-01T12:00:00.123456789Z`.
pub const RFC3339_NANO_WIDTH: usize = 30;

/// Upper bound on a timestamp token; longer prefixes are treated as content.
const MAX_TIMESTAMP_TOKEN: usize = 40;

/// Split a leading `<timestamp> ` prefix from `line`.
///
/// Returns the parsed timestamp and the remaining content when the prefix is a
/// valid RFC3339 timestamp followed by a single space; otherwise `None` and
/// the untouched line.
#[must_use]
pub fn split_leading_timestamp(line: &str) -> (Option<DateTime<Utc>>, &str) {
    // The runtime's own form is the common case; try it before scanning.
    if line.as_bytes().get(RFC3339_NANO_WIDTH) == Some(&b' ') {
        if let Some(parsed) = parse_token(&line[..RFC3339_NANO_WIDTH]) {
            return (Some(parsed), &line[RFC3339_NANO_WIDTH + 1..]);
        }
    }
    let Some(space) = line.as_bytes().iter().take(MAX_TIMESTAMP_TOKEN + 1).position(|b| *b == b' ')
    else {
        return (None, line);
    };
    if space < "2006-01-02T15:04:05Z".len() {
        return (None, line);
    }
    match parse_token(&line[..space]) {
        Some(parsed) => (Some(parsed), &line[space + 1..]),
        None => (None, line),
    }
}

fn parse_token(token: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::{split_leading_timestamp, RFC3339_NANO_WIDTH};
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_fixed_nano_prefix() {
        let line = "2024-05-01T12:34:56.123456789Z server started";
        assert_eq!(line.find(' '), Some(RFC3339_NANO_WIDTH));
        let (ts, rest) = split_leading_timestamp(line);
        let ts = ts.unwrap_or_default();
        assert_eq!(rest, "server started");
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.nanosecond(), 123_456_789);
    }

    #[test]
    fn accepts_offsets_and_short_fractions() {
        let (ts, rest) = split_leading_timestamp("2024-05-01T12:34:56+02:00 hi");
        assert_eq!(ts.map(|ts| ts.hour()), Some(10));
        assert_eq!(rest, "hi");
    }

    #[test]
    fn leaves_non_timestamp_lines_alone() {
        for line in ["plain message", "", "2024-05-01 not iso", "2024-05-01T12:34:56.123Z"] {
            let (ts, rest) = split_leading_timestamp(line);
            assert!(ts.is_none(), "{line:?}");
            assert_eq!(rest, line);
        }
    }

    #[test]
    fn short_timestamp_with_space_at_nano_width_still_splits() {
        let line = "2024-05-01T12:34:56Z abcdefghi rest";
        assert_eq!(line.as_bytes()[RFC3339_NANO_WIDTH], b' ');
        let (ts, rest) = split_leading_timestamp(line);
        assert_eq!(ts.map(|ts| ts.minute()), Some(34));
        assert_eq!(rest, "abcdefghi rest");
    }

    #[test]
    fn keeps_content_that_starts_with_spaces() {
        let (ts, rest) = split_leading_timestamp("2024-05-01T12:34:56.000000000Z   indented");
        assert!(ts.is_some());
        assert_eq!(rest, "  indented");
    }
}

//! Classified, timestamped, sanitized log lines.

use chrono::{DateTime, Utc};

use crate::sanitize::{plain_text, sanitize};
use crate::timestamp::split_leading_timestamp;

/// Maximum visible characters kept for one line of content.
pub const MAX_LINE_CHARS: usize = 1000;

/// Origin of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamClass {
    Stdout,
    Stderr,
    /// Lines generated by the viewer itself (reconnect notices, action output).
    System,
}

impl StreamClass {
    /// Decode the stream type byte of a multiplexed frame header.
    ///
    /// `0` (stdin) and unknown values are shown as stdout.
    #[must_use]
    pub fn from_frame_type(value: u8) -> Self {
        match value {
            2 => Self::Stderr,
            _ => Self::Stdout,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::System => "system",
        }
    }
}

/// One immutable log line as stored in a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub source_id: String,
    pub timestamp: DateTime<Utc>,
    pub stream: StreamClass,
    /// Sanitized content; may contain SGR sequences.
    pub content: String,
}

impl LogLine {
    /// Build a line from raw runtime text.
    ///
    /// A leading RFC3339 timestamp becomes the line timestamp; otherwise
    /// `received_at` is used. Content is always sanitized.
    #[must_use]
    pub fn from_raw(
        source_id: impl Into<String>,
        stream: StreamClass,
        raw: &str,
        received_at: DateTime<Utc>,
    ) -> Self {
        let (parsed, rest) = split_leading_timestamp(raw);
        Self {
            source_id: source_id.into(),
            timestamp: parsed.unwrap_or(received_at),
            stream,
            content: sanitize(rest),
        }
    }

    /// Viewer-generated line stamped with the current time.
    #[must_use]
    pub fn system(source_id: impl Into<String>, message: &str) -> Self {
        Self {
            source_id: source_id.into(),
            timestamp: Utc::now(),
            stream: StreamClass::System,
            content: sanitize(message),
        }
    }

    /// Content with every escape sequence removed.
    #[must_use]
    pub fn plain(&self) -> String {
        plain_text(&self.content)
    }
}

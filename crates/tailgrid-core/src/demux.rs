//! Incremental decoder for container log byte streams.
//!
//! Containers started without a TTY deliver stdout and stderr multiplexed in
//! frames:
//!
//! ```text
//! +--------+----------+---------------------+----------------------+
//! | type:1 | zero:3   | length:4 big-endian | payload: length bytes |
//! +--------+----------+---------------------+----------------------+
//! ```
//!
//! TTY containers deliver plain newline-separated bytes. Bytes may arrive in
//! arbitrary chunks; the decoder keeps whatever is incomplete between calls.

use crate::error::DemuxError;
use crate::line::StreamClass;

pub const FRAME_HEADER_LEN: usize = 8;
/// Largest frame payload accepted before the stream is treated as corrupt.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
/// TTY lines longer than this are emitted without waiting for a newline.
pub const MAX_PENDING_LINE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Tty,
    Multiplexed,
}

impl StreamMode {
    #[must_use]
    pub fn for_tty(tty: bool) -> Self {
        if tty {
            Self::Tty
        } else {
            Self::Multiplexed
        }
    }
}

/// A decoded line before timestamp extraction and sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub stream: StreamClass,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Demuxer {
    mode: StreamMode,
    header: [u8; FRAME_HEADER_LEN],
    header_len: usize,
    frame_stream: StreamClass,
    frame_remaining: usize,
    pending: Vec<u8>,
}

impl Demuxer {
    #[must_use]
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            header: [0; FRAME_HEADER_LEN],
            header_len: 0,
            frame_stream: StreamClass::Stdout,
            frame_remaining: 0,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Feed the next chunk of bytes, returning every line completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<RawLine>, DemuxError> {
        match self.mode {
            StreamMode::Tty => Ok(self.push_tty(bytes)),
            StreamMode::Multiplexed => self.push_multiplexed(bytes),
        }
    }

    /// Flush a trailing partial line at end of stream.
    ///
    /// A multiplexed frame cut short by the end of stream is emitted as far as
    /// it was received.
    pub fn finish(&mut self) -> Vec<RawLine> {
        let mut lines = Vec::new();
        if !self.pending.is_empty() {
            let stream = match self.mode {
                StreamMode::Tty => StreamClass::Stdout,
                StreamMode::Multiplexed => self.frame_stream,
            };
            let payload = std::mem::take(&mut self.pending);
            split_payload(&payload, stream, &mut lines);
        }
        self.header_len = 0;
        self.frame_remaining = 0;
        lines
    }

    fn push_tty(&mut self, bytes: &[u8]) -> Vec<RawLine> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                lines.push(raw_line(StreamClass::Stdout, &self.pending));
                self.pending.clear();
                continue;
            }
            self.pending.push(byte);
            if self.pending.len() >= MAX_PENDING_LINE {
                lines.push(raw_line(StreamClass::Stdout, &self.pending));
                self.pending.clear();
            }
        }
        lines
    }

    fn push_multiplexed(&mut self, mut bytes: &[u8]) -> Result<Vec<RawLine>, DemuxError> {
        let mut lines = Vec::new();
        while !bytes.is_empty() {
            if self.frame_remaining == 0 {
                let take = (FRAME_HEADER_LEN - self.header_len).min(bytes.len());
                self.header[self.header_len..self.header_len + take]
                    .copy_from_slice(&bytes[..take]);
                self.header_len += take;
                bytes = &bytes[take..];
                if self.header_len < FRAME_HEADER_LEN {
                    break;
                }
                self.header_len = 0;
                let declared = u32::from_be_bytes([
                    self.header[4],
                    self.header[5],
                    self.header[6],
                    self.header[7],
                ]) as usize;
                if declared > MAX_FRAME_LEN {
                    return Err(DemuxError::FrameTooLarge {
                        declared,
                        limit: MAX_FRAME_LEN,
                    });
                }
                self.frame_stream = StreamClass::from_frame_type(self.header[0]);
                self.frame_remaining = declared;
                continue;
            }

            let take = self.frame_remaining.min(bytes.len());
            self.pending.extend_from_slice(&bytes[..take]);
            self.frame_remaining -= take;
            bytes = &bytes[take..];
            if self.frame_remaining == 0 {
                let payload = std::mem::take(&mut self.pending);
                split_payload(&payload, self.frame_stream, &mut lines);
            }
        }
        Ok(lines)
    }
}

/// Split a complete payload on newlines; a trailing segment without newline is a line too.
fn split_payload(payload: &[u8], stream: StreamClass, out: &mut Vec<RawLine>) {
    let mut segments = payload.split(|byte| *byte == b'\n').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() && segment.is_empty() {
            break;
        }
        out.push(raw_line(stream, segment));
    }
}

fn raw_line(stream: StreamClass, bytes: &[u8]) -> RawLine {
    RawLine {
        stream,
        text: String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Encode one multiplexed frame in the engine's wire format.
#[must_use]
pub fn encode_frame(stream_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.push(stream_type);
    frame.extend_from_slice(&[0, 0, 0]);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

//! Errors raised while decoding container log streams.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemuxError {
    /// A multiplexed frame header declared a payload larger than the decoder accepts.
    #[error("log frame of {declared} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { declared: usize, limit: usize },
}

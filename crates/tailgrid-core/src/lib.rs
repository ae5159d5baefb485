//! tailgrid-core: log line model, sanitization and stream demultiplexing.
//!
//! Everything in this crate is synchronous and allocation-bounded so it can be
//! driven from worker tasks and exercised directly in tests.

pub mod container;
pub mod demux;
pub mod error;
pub mod ids;
pub mod line;
pub mod sanitize;
pub mod timestamp;

pub use container::{ContainerInfo, RunState};
pub use demux::{Demuxer, RawLine, StreamMode};
pub use error::DemuxError;
pub use ids::{PaneId, SessionId};
pub use line::{LogLine, StreamClass, MAX_LINE_CHARS};
pub use sanitize::sanitize;

/// Stable crate label used by bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "tailgrid-core"
}

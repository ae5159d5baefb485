//! Request and response types shared by runtime implementations.

use std::fmt;

use tokio::io::AsyncRead;

/// An operation the user can run against a container from its pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerAction {
    Restart,
    Kill,
    Remove,
    ComposeUp,
    ComposeDown,
    ComposeDownUp,
    ComposeBuildUp,
}

impl ContainerAction {
    pub const ALL: [Self; 7] = [
        Self::Restart,
        Self::Kill,
        Self::Remove,
        Self::ComposeUp,
        Self::ComposeDown,
        Self::ComposeDownUp,
        Self::ComposeBuildUp,
    ];

    /// Compose actions need the project/service labels on the container.
    #[must_use]
    pub fn requires_compose(self) -> bool {
        matches!(
            self,
            Self::ComposeUp | Self::ComposeDown | Self::ComposeDownUp | Self::ComposeBuildUp
        )
    }

    /// Whether a successful run leaves the pane without a container.
    #[must_use]
    pub fn removes_container(self) -> bool {
        matches!(self, Self::Remove)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Kill => "kill",
            Self::Remove => "remove",
            Self::ComposeUp => "compose up",
            Self::ComposeDown => "compose down",
            Self::ComposeDownUp => "compose down+up",
            Self::ComposeBuildUp => "compose build+up",
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which part of the log history to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRequest {
    /// Keep the stream open for new output.
    pub follow: bool,
    /// Only the last `n` lines of history; `None` means all of it.
    pub tail: Option<usize>,
}

impl LogRequest {
    /// Running containers are followed after `running_tail` lines of history;
    /// stopped ones are read as a bounded tail without follow.
    #[must_use]
    pub fn for_state(running: bool, running_tail: usize, stopped_tail: usize) -> Self {
        if running {
            Self {
                follow: true,
                tail: Some(running_tail),
            }
        } else {
            Self {
                follow: false,
                tail: Some(stopped_tail),
            }
        }
    }
}

/// An open log byte stream plus the framing it uses.
pub struct LogByteStream {
    /// TTY containers send plain lines; others send multiplexed frames.
    pub tty: bool,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for LogByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogByteStream")
            .field("tty", &self.tty)
            .finish_non_exhaustive()
    }
}

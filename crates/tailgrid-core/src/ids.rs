//! Identifiers shared between the control loop and worker tasks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a pane slot. Survives container replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(pub u64);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

/// One connection attempt of a pane. Events tagged with a stale session are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate a process-unique, increasing session id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{PaneId, SessionId};

    #[test]
    fn session_ids_increase() {
        let first = SessionId::next();
        let second = SessionId::next();
        assert!(second > first);
    }

    #[test]
    fn display_forms() {
        assert_eq!(PaneId(3).to_string(), "pane-3");
        assert_eq!(SessionId(9).to_string(), "session-9");
    }
}

//! Error types for runtime calls, log streams and container actions.
//!
//! Transport details (socket paths, engine status codes) are folded into a few
//! categories so callers can decide between retrying and reporting.

use thiserror::Error;

use crate::types::ContainerAction;

/// Failure talking to the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The runtime socket is unreachable or the connection dropped.
    #[error("container runtime unavailable: {message}")]
    Unavailable { message: String },

    #[error("container {reference:?} not found")]
    NotFound { reference: String },

    /// The runtime answered with a non-success status.
    #[error("runtime request failed with status {status}: {message}")]
    Api { status: u16, message: String },
}

impl RuntimeError {
    /// Whether a later attempt may succeed without user intervention.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::NotFound { .. } => true,
            Self::Api { status, .. } => *status >= 500,
        }
    }
}

/// Failure of a pane's log stream. Both variants trigger reconnection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("cannot open log stream for {container}: {source}")]
    Open {
        container: String,
        #[source]
        source: RuntimeError,
    },

    #[error("log stream for {container} failed: {message}")]
    Read { container: String, message: String },
}

impl StreamError {
    #[must_use]
    pub fn container(&self) -> &str {
        match self {
            Self::Open { container, .. } | Self::Read { container, .. } => container,
        }
    }
}

/// A restart/kill/remove/compose operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{action} of {container} failed: {message}")]
    Failed {
        action: ContainerAction,
        container: String,
        message: String,
        /// Output captured before the failure, shown in the pane.
        output: Vec<String>,
    },

    #[error("{action} is not available for {container}: {reason}")]
    Unsupported {
        action: ContainerAction,
        container: String,
        reason: String,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ActionError {
    /// Output lines worth appending to the pane alongside the error.
    #[must_use]
    pub fn output(&self) -> &[String] {
        match self {
            Self::Failed { output, .. } => output,
            Self::Unsupported { .. } | Self::Runtime(_) => &[],
        }
    }
}

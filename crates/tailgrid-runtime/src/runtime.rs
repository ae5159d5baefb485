//! The container runtime seam consumed by stream sessions and the control loop.

use async_trait::async_trait;
use tailgrid_core::ContainerInfo;

use crate::error::{ActionError, RuntimeError};
use crate::types::{ContainerAction, LogByteStream, LogRequest};

/// Operations the dashboard needs from a container runtime.
///
/// Implementations must be cheap to share behind an `Arc`; every pane worker
/// holds one.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Open the log byte stream for `container`.
    async fn open_log_stream(
        &self,
        container: &ContainerInfo,
        request: LogRequest,
    ) -> Result<LogByteStream, RuntimeError>;

    /// List all containers, running or not.
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError>;

    /// List containers straight from the runtime, bypassing any shared
    /// listing. Reconnection uses this so a dead container is never
    /// re-adopted from a stale snapshot.
    async fn refresh_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        self.list_containers().await
    }

    /// Run `action` against `container`, returning its output lines.
    async fn perform(
        &self,
        action: ContainerAction,
        container: &ContainerInfo,
    ) -> Result<Vec<String>, ActionError>;
}

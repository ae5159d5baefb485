//! tailgrid-runtime: container runtime seam and the async workers built on it.
//!
//! Provides a transport-agnostic [`runtime::ContainerRuntime`] trait with
//! implementations for:
//! - [`docker::DockerRuntime`]: Docker Engine API over its unix socket
//! - [`mock::MockRuntime`]: scripted in-memory runtime for tests
//!
//! On top of the trait live the per-pane stream sessions, the reconnection
//! supervisor, bulk action fan-out and TTL caches.

pub mod actions;
pub mod cache;
pub mod docker;
pub mod error;
pub mod mock;
pub mod reconnect;
pub mod runtime;
pub mod session;
pub mod types;

/// Stable crate label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "tailgrid-runtime"
}

//! Reconnection supervisor: re-resolve a pane's container after its stream ends.
//!
//! A restarted compose service usually comes back under a new container id, so
//! identity is matched by compose project+service first and by name second.
//! Only running candidates qualify.

use std::sync::Arc;
use std::time::Duration;

use tailgrid_core::{ContainerInfo, PaneId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::runtime::ContainerRuntime;

/// Delays before each reconnection attempt.
pub const DEFAULT_SCHEDULE: [Duration; 4] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(3),
    Duration::from_secs(5),
];

/// Result of a reconnection run, tagged with the pane it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectEvent {
    Reconnected {
        pane: PaneId,
        container: ContainerInfo,
        attempt: usize,
    },
    /// Every scheduled attempt failed; the pane stays disconnected.
    GaveUp { pane: PaneId, attempts: usize },
}

impl ReconnectEvent {
    #[must_use]
    pub fn pane(&self) -> PaneId {
        match self {
            Self::Reconnected { pane, .. } | Self::GaveUp { pane, .. } => *pane,
        }
    }
}

/// Whether a finished stream should be followed by reconnection attempts.
///
/// A stopped container read as a bounded tail ends cleanly by design.
#[must_use]
pub fn should_reconnect(container: &ContainerInfo, clean_close: bool) -> bool {
    !(clean_close && !container.is_running())
}

/// Pick the running container that takes over `previous`'s pane.
#[must_use]
pub fn resolve_replacement<'a>(
    previous: &ContainerInfo,
    candidates: &'a [ContainerInfo],
) -> Option<&'a ContainerInfo> {
    let mut running = candidates.iter().filter(|candidate| candidate.is_running());
    if let Some(key) = previous.compose_key() {
        if let Some(found) = running
            .clone()
            .find(|candidate| candidate.compose_key() == Some(key))
        {
            return Some(found);
        }
    }
    let name = previous.display_name();
    running.find(|candidate| candidate.display_name() == name)
}

/// Run the schedule until a replacement is found.
///
/// Returns `None` when cancelled.
pub async fn reconnect(
    runtime: &dyn ContainerRuntime,
    pane: PaneId,
    previous: &ContainerInfo,
    schedule: &[Duration],
    cancel: &CancellationToken,
) -> Option<ReconnectEvent> {
    for (index, delay) in schedule.iter().enumerate() {
        let attempt = index + 1;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(*delay) => {}
        }
        let listed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            listed = runtime.refresh_containers() => listed,
        };
        match listed {
            Ok(candidates) => {
                if let Some(found) = resolve_replacement(previous, &candidates) {
                    info!(
                        %pane,
                        attempt,
                        old = %previous.short_id(),
                        new = %found.short_id(),
                        "reconnected pane"
                    );
                    return Some(ReconnectEvent::Reconnected {
                        pane,
                        container: found.clone(),
                        attempt,
                    });
                }
                debug!(%pane, attempt, name = %previous.display_name(), "no replacement yet");
            }
            Err(err) => {
                warn!(%pane, attempt, error = %err, "listing containers failed during reconnect");
            }
        }
    }
    warn!(%pane, attempts = schedule.len(), "giving up on reconnection");
    Some(ReconnectEvent::GaveUp {
        pane,
        attempts: schedule.len(),
    })
}

/// Spawn [`reconnect`] and deliver its result on `events`.
pub fn spawn_reconnect<E>(
    runtime: Arc<dyn ContainerRuntime>,
    pane: PaneId,
    previous: ContainerInfo,
    schedule: Vec<Duration>,
    cancel: CancellationToken,
    events: mpsc::Sender<E>,
) -> JoinHandle<()>
where
    E: From<ReconnectEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let Some(event) = reconnect(runtime.as_ref(), pane, &previous, &schedule, &cancel).await
        else {
            return;
        };
        let _ = events.send(E::from(event)).await;
    })
}

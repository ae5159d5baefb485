//! Container actions, single and bulk.
//!
//! Bulk actions never fail fast: every target runs (at most `concurrency` at
//! once) and the caller gets aggregate counts.

use std::sync::Arc;

use tailgrid_core::{ContainerInfo, PaneId};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::ActionError;
use crate::runtime::ContainerRuntime;
use crate::types::ContainerAction;

pub const DEFAULT_BULK_CONCURRENCY: usize = 3;

/// Result of one action against one pane's container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub pane: PaneId,
    pub action: ContainerAction,
    pub container: ContainerInfo,
    pub result: Result<Vec<String>, ActionError>,
}

impl ActionOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate of a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    pub action: ContainerAction,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-target outcomes in request order.
    pub outcomes: Vec<ActionOutcome>,
}

impl BulkSummary {
    /// Short human summary, e.g. `restart: 3 ok, 1 failed`.
    #[must_use]
    pub fn headline(&self) -> String {
        if self.failed == 0 {
            format!("{}: {} ok", self.action, self.succeeded)
        } else {
            format!("{}: {} ok, {} failed", self.action, self.succeeded, self.failed)
        }
    }
}

/// Completion events delivered to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    Finished(ActionOutcome),
    BulkFinished(BulkSummary),
}

/// Run one action and log its result.
pub async fn run_action(
    runtime: &dyn ContainerRuntime,
    pane: PaneId,
    action: ContainerAction,
    container: ContainerInfo,
) -> ActionOutcome {
    let result = runtime.perform(action, &container).await;
    match &result {
        Ok(output) => info!(%pane, %action, container = %container.display_name(), lines = output.len(), "action finished"),
        Err(err) => warn!(%pane, %action, container = %container.display_name(), error = %err, "action failed"),
    }
    ActionOutcome {
        pane,
        action,
        container,
        result,
    }
}

/// Run `action` against every target with at most `concurrency` in flight.
pub async fn run_bulk(
    runtime: Arc<dyn ContainerRuntime>,
    action: ContainerAction,
    targets: Vec<(PaneId, ContainerInfo)>,
    concurrency: usize,
) -> BulkSummary {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();
    let total = targets.len();
    for (index, (pane, container)) in targets.into_iter().enumerate() {
        let runtime = Arc::clone(&runtime);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (index, run_action(runtime.as_ref(), pane, action, container).await)
        });
    }

    let mut slots: Vec<Option<ActionOutcome>> = vec![None; total];
    let mut lost = 0usize;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(err) => {
                warn!(%action, error = %err, "bulk action task aborted");
                lost += 1;
            }
        }
    }
    let outcomes: Vec<ActionOutcome> = slots.into_iter().flatten().collect();
    let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded()).count();
    let summary = BulkSummary {
        action,
        succeeded,
        failed: outcomes.len() - succeeded + lost,
        outcomes,
    };
    info!(%action, succeeded = summary.succeeded, failed = summary.failed, "bulk action finished");
    summary
}

/// Spawn [`run_action`] and deliver its outcome on `events`.
pub fn spawn_action<E>(
    runtime: Arc<dyn ContainerRuntime>,
    pane: PaneId,
    action: ContainerAction,
    container: ContainerInfo,
    events: mpsc::Sender<E>,
) where
    E: From<ActionEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = run_action(runtime.as_ref(), pane, action, container).await;
        let _ = events.send(E::from(ActionEvent::Finished(outcome))).await;
    });
}

/// Spawn [`run_bulk`] and deliver its summary on `events`.
pub fn spawn_bulk<E>(
    runtime: Arc<dyn ContainerRuntime>,
    action: ContainerAction,
    targets: Vec<(PaneId, ContainerInfo)>,
    concurrency: usize,
    events: mpsc::Sender<E>,
) where
    E: From<ActionEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let summary = run_bulk(runtime, action, targets, concurrency).await;
        let _ = events.send(E::from(ActionEvent::BulkFinished(summary))).await;
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tailgrid_core::PaneId;

    use super::{run_bulk, DEFAULT_BULK_CONCURRENCY};
    use crate::error::ActionError;
    use crate::mock::{test_container, MockRuntime};
    use crate::types::ContainerAction;

    fn targets(n: usize) -> Vec<(PaneId, tailgrid_core::ContainerInfo)> {
        (0..n)
            .map(|i| {
                (
                    PaneId(i as u64),
                    test_container(&format!("c{i}"), &format!("svc-{i}"), "shop", &format!("svc{i}")),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_respects_concurrency_cap() {
        let runtime = Arc::new(MockRuntime::new().with_action_delay(Duration::from_millis(100)));
        let summary = run_bulk(
            runtime.clone(),
            ContainerAction::Restart,
            targets(7),
            DEFAULT_BULK_CONCURRENCY,
        )
        .await;
        assert_eq!(summary.succeeded, 7);
        assert_eq!(summary.failed, 0);
        assert_eq!(runtime.max_concurrent_actions(), 3);
        let panes: Vec<u64> = summary.outcomes.iter().map(|o| o.pane.0).collect();
        assert_eq!(panes, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn bulk_reports_failures_without_stopping() {
        let runtime = Arc::new(MockRuntime::new().with_action_result(
            ContainerAction::Kill,
            Err(ActionError::Failed {
                action: ContainerAction::Kill,
                container: "x".into(),
                message: "denied".into(),
                output: Vec::new(),
            }),
        ));
        let summary = run_bulk(runtime, ContainerAction::Kill, targets(4), 3).await;
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 4);
        assert_eq!(summary.headline(), "kill: 0 ok, 4 failed");
    }

    #[tokio::test]
    async fn empty_bulk_is_a_noop() {
        let runtime = Arc::new(MockRuntime::new());
        let summary = run_bulk(runtime, ContainerAction::Restart, Vec::new(), 3).await;
        assert_eq!(summary.headline(), "restart: 0 ok");
        assert!(summary.outcomes.is_empty());
    }
}

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tailgrid_core::PaneId;
use tailgrid_runtime::actions::{spawn_action, spawn_bulk};
use tailgrid_runtime::reconnect::spawn_reconnect;
use tailgrid_runtime::runtime::ContainerRuntime;
use tailgrid_runtime::session::StreamSession;
use tailgrid_tui::app::{App, AppEvent, Command};
use tailgrid_tui::config::ViewerConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::terminal::write_clipboard;

/// Carries out [`Command`]s against the runtime and owns the live workers.
pub struct Dispatcher {
    runtime: Arc<dyn ContainerRuntime>,
    cancel: CancellationToken,
    events: mpsc::Sender<AppEvent>,
    sessions: HashMap<PaneId, StreamSession>,
    reconnects: HashMap<PaneId, CancellationToken>,
    schedule: Vec<Duration>,
    bulk_concurrency: usize,
}

impl Dispatcher {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        cancel: CancellationToken,
        events: mpsc::Sender<AppEvent>,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            runtime,
            cancel,
            events,
            sessions: HashMap::new(),
            reconnects: HashMap::new(),
            schedule: config.reconnect_schedule.clone(),
            bulk_concurrency: config.bulk_concurrency,
        }
    }

    pub fn execute<W: Write>(&mut self, command: Command, app: &mut App, out: &mut W) -> io::Result<()> {
        for command in command.into_vec() {
            match command {
                Command::None | Command::Batch(_) => {}
                Command::Quit => self.cancel.cancel(),
                Command::OpenStream {
                    pane,
                    container,
                    request,
                } => {
                    self.cancel_reconnect(pane);
                    let session = StreamSession::spawn(
                        Arc::clone(&self.runtime),
                        pane,
                        container,
                        request,
                        &self.cancel,
                        self.events.clone(),
                    );
                    app.attach_session(pane, session.id());
                    if let Some(previous) = self.sessions.insert(pane, session) {
                        previous.teardown();
                    }
                }
                Command::CloseStream { pane } => {
                    if let Some(session) = self.sessions.remove(&pane) {
                        session.teardown();
                    }
                    self.cancel_reconnect(pane);
                }
                Command::Reconnect { pane, previous } => {
                    self.cancel_reconnect(pane);
                    let token = self.cancel.child_token();
                    spawn_reconnect(
                        Arc::clone(&self.runtime),
                        pane,
                        previous,
                        self.schedule.clone(),
                        token.clone(),
                        self.events.clone(),
                    );
                    self.reconnects.insert(pane, token);
                }
                Command::RunAction {
                    pane,
                    action,
                    container,
                } => spawn_action(
                    Arc::clone(&self.runtime),
                    pane,
                    action,
                    container,
                    self.events.clone(),
                ),
                Command::RunBulk { action, targets } => spawn_bulk(
                    Arc::clone(&self.runtime),
                    action,
                    targets,
                    self.bulk_concurrency,
                    self.events.clone(),
                ),
                Command::CopyToClipboard(text) => write_clipboard(out, &text)?,
                Command::ScheduleToastDismiss { id, after } => {
                    let events = self.events.clone();
                    let cancel = self.cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(after) => {
                                let _ = events.send(AppEvent::ToastExpired(id)).await;
                            }
                        }
                    });
                }
            }
        }
        Ok(())
    }

    fn cancel_reconnect(&mut self, pane: PaneId) {
        if let Some(token) = self.reconnects.remove(&pane) {
            debug!(%pane, "cancelling reconnection");
            token.cancel();
        }
    }

    /// Stop every worker; sessions unwind at their next suspension point.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        for (_, session) in self.sessions.drain() {
            session.teardown();
        }
        self.reconnects.clear();
    }
}

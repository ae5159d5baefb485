//! Per-pane log stream sessions.
//!
//! A session is two tasks joined by bounded queues:
//!
//! ```text
//! runtime bytes -> [ingest] -> lines (cap 100) --+
//!                          \-> errors (cap 1) ---+-> [pump] -> control loop
//! ```
//!
//! The ingest task owns both senders; when it returns both queues close. The
//! pump forwards lines in order, then reports `Failed` if an error was queued
//! or `Closed` for a clean end of stream. A cancelled session reports nothing.

use std::sync::Arc;

use chrono::Utc;
use tailgrid_core::{ContainerInfo, Demuxer, LogLine, PaneId, SessionId, StreamMode};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::runtime::ContainerRuntime;
use crate::types::LogRequest;

pub const LINE_QUEUE_CAPACITY: usize = 100;
pub const ERROR_QUEUE_CAPACITY: usize = 1;
const READ_BUFFER: usize = 8 * 1024;

/// What a session reports to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Line {
        pane: PaneId,
        session: SessionId,
        line: LogLine,
    },
    /// The stream reached a clean end of file.
    Closed { pane: PaneId, session: SessionId },
    Failed {
        pane: PaneId,
        session: SessionId,
        error: StreamError,
    },
}

impl SessionEvent {
    #[must_use]
    pub fn pane(&self) -> PaneId {
        match self {
            Self::Line { pane, .. } | Self::Closed { pane, .. } | Self::Failed { pane, .. } => *pane,
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        match self {
            Self::Line { session, .. }
            | Self::Closed { session, .. }
            | Self::Failed { session, .. } => *session,
        }
    }
}

/// Handle to a running session. Dropping it tears the session down.
#[derive(Debug)]
pub struct StreamSession {
    pane: PaneId,
    id: SessionId,
    container_id: String,
    cancel: CancellationToken,
    ingest: JoinHandle<()>,
    pump: JoinHandle<()>,
}

impl StreamSession {
    /// Open a log stream for `container` and start forwarding its lines.
    ///
    /// The session's token is a child of `parent`, so cancelling the viewer
    /// session stops every stream at once.
    pub fn spawn<E>(
        runtime: Arc<dyn ContainerRuntime>,
        pane: PaneId,
        container: ContainerInfo,
        request: LogRequest,
        parent: &CancellationToken,
        events: mpsc::Sender<E>,
    ) -> Self
    where
        E: From<SessionEvent> + Send + 'static,
    {
        let id = SessionId::next();
        let cancel = parent.child_token();
        let (line_tx, line_rx) = mpsc::channel(LINE_QUEUE_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_QUEUE_CAPACITY);
        let container_id = container.id.clone();
        debug!(%pane, session = %id, container = %container.display_name(), ?request, "opening log session");

        let ingest = tokio::spawn(ingest(
            runtime,
            container,
            request,
            cancel.clone(),
            line_tx,
            error_tx,
        ));
        let pump = tokio::spawn(pump(pane, id, line_rx, error_rx, cancel.clone(), events));
        Self {
            pane,
            id,
            container_id,
            cancel,
            ingest,
            pump,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn pane(&self) -> PaneId {
        self.pane
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Whether both tasks have exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.ingest.is_finished() && self.pump.is_finished()
    }

    /// Cancel both tasks; they unwind at their next suspension point.
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            debug!(pane = %self.pane, session = %self.id, "tearing down log session");
            self.cancel.cancel();
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn ingest(
    runtime: Arc<dyn ContainerRuntime>,
    container: ContainerInfo,
    request: LogRequest,
    cancel: CancellationToken,
    lines: mpsc::Sender<LogLine>,
    errors: mpsc::Sender<StreamError>,
) {
    let name = container.display_name().to_owned();
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = runtime.open_log_stream(&container, request) => opened,
    };
    let stream = match opened {
        Ok(stream) => stream,
        Err(source) => {
            warn!(container = %name, error = %source, "log stream open failed");
            let _ = errors.try_send(StreamError::Open {
                container: name,
                source,
            });
            return;
        }
    };

    let mut demuxer = Demuxer::new(StreamMode::for_tty(stream.tty));
    let mut reader = stream.reader;
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            read = reader.read(&mut buf) => read,
        };
        let raw_lines = match read {
            Ok(0) => {
                for raw in demuxer.finish() {
                    let line = LogLine::from_raw(&container.id, raw.stream, &raw.text, Utc::now());
                    if !send_line(&lines, &cancel, line).await {
                        return;
                    }
                }
                debug!(container = %name, "log stream reached end of file");
                return;
            }
            Ok(n) => match demuxer.push(&buf[..n]) {
                Ok(raw_lines) => raw_lines,
                Err(err) => {
                    warn!(container = %name, error = %err, "log stream is corrupt");
                    let _ = errors.try_send(StreamError::Read {
                        container: name,
                        message: err.to_string(),
                    });
                    return;
                }
            },
            Err(err) => {
                warn!(container = %name, error = %err, "log stream read failed");
                let _ = errors.try_send(StreamError::Read {
                    container: name,
                    message: err.to_string(),
                });
                return;
            }
        };
        let received_at = Utc::now();
        for raw in raw_lines {
            let line = LogLine::from_raw(&container.id, raw.stream, &raw.text, received_at);
            if !send_line(&lines, &cancel, line).await {
                return;
            }
        }
    }
}

/// Send with backpressure; false when cancelled or the pump is gone.
async fn send_line(
    lines: &mpsc::Sender<LogLine>,
    cancel: &CancellationToken,
    line: LogLine,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = lines.send(line) => sent.is_ok(),
    }
}

async fn pump<E>(
    pane: PaneId,
    session: SessionId,
    mut lines: mpsc::Receiver<LogLine>,
    mut errors: mpsc::Receiver<StreamError>,
    cancel: CancellationToken,
    events: mpsc::Sender<E>,
) where
    E: From<SessionEvent> + Send + 'static,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = lines.recv() => next,
        };
        let Some(line) = next else {
            break;
        };
        if !forward(&events, &cancel, SessionEvent::Line {
            pane,
            session,
            line,
        })
        .await
        {
            return;
        }
    }

    // The ingest task queues its error before dropping the line sender.
    let event = match errors.try_recv() {
        Ok(error) => SessionEvent::Failed {
            pane,
            session,
            error,
        },
        Err(_) => SessionEvent::Closed { pane, session },
    };
    forward(&events, &cancel, event).await;
}

async fn forward<E>(events: &mpsc::Sender<E>, cancel: &CancellationToken, event: SessionEvent) -> bool
where
    E: From<SessionEvent> + Send + 'static,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = events.send(E::from(event)) => sent.is_ok(),
    }
}

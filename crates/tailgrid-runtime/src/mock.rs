//! Scripted in-memory runtime for tests.
//!
//! Records every call and serves pre-configured container lists, log streams
//! and action results.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tailgrid_core::demux::encode_frame;
use tailgrid_core::{ContainerInfo, RunState};
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};

use crate::error::{ActionError, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerAction, LogByteStream, LogRequest};

/// A recorded call to the mock runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    OpenLogStream {
        container_id: String,
        request: LogRequest,
    },
    ListContainers,
    Perform {
        action: ContainerAction,
        container_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptStep {
    Bytes(Vec<u8>),
    Fail(String),
}

/// Byte reader that replays a script, then either ends or stays open.
#[derive(Debug)]
pub struct ScriptedReader {
    steps: VecDeque<ScriptStep>,
    hold_open: bool,
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.steps.pop_front() {
            Some(ScriptStep::Bytes(bytes)) => {
                let n = bytes.len().min(buf.remaining());
                buf.put_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(ScriptStep::Bytes(bytes[n..].to_vec()));
                }
                Poll::Ready(Ok(()))
            }
            Some(ScriptStep::Fail(message)) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                message,
            ))),
            // Held-open streams only finish through cancellation.
            None if self.hold_open => Poll::Pending,
            None => Poll::Ready(Ok(())),
        }
    }
}

/// Builder for one scripted log stream.
#[derive(Debug, Clone, Default)]
pub struct MockStream {
    tty: bool,
    steps: Vec<ScriptStep>,
    hold_open: bool,
}

impl MockStream {
    /// Multiplexed stream.
    #[must_use]
    pub fn multiplexed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tty() -> Self {
        Self {
            tty: true,
            ..Self::default()
        }
    }

    /// Append one stdout line, framed when the stream is multiplexed.
    #[must_use]
    pub fn stdout(self, line: &str) -> Self {
        self.line(1, line)
    }

    #[must_use]
    pub fn stderr(self, line: &str) -> Self {
        self.line(2, line)
    }

    fn line(mut self, stream_type: u8, line: &str) -> Self {
        let payload = format!("{line}\n");
        let bytes = if self.tty {
            payload.into_bytes()
        } else {
            encode_frame(stream_type, payload.as_bytes())
        };
        self.steps.push(ScriptStep::Bytes(bytes));
        self
    }

    /// Append raw bytes as one read.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.steps.push(ScriptStep::Bytes(bytes.to_vec()));
        self
    }

    /// Fail the next read with a connection reset.
    #[must_use]
    pub fn fail(mut self, message: &str) -> Self {
        self.steps.push(ScriptStep::Fail(message.to_owned()));
        self
    }

    /// Keep the stream open after the script instead of reaching EOF.
    #[must_use]
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    fn into_log_stream(self) -> LogByteStream {
        LogByteStream {
            tty: self.tty,
            reader: Box::new(ScriptedReader {
                steps: self.steps.into(),
                hold_open: self.hold_open,
            }),
        }
    }
}

enum StreamSource {
    Scripted(MockStream),
    Live { tty: bool, reader: DuplexStream },
    OpenError(RuntimeError),
}

/// Mock implementation of [`ContainerRuntime`].
pub struct MockRuntime {
    containers: Mutex<Vec<ContainerInfo>>,
    list_sequence: Mutex<VecDeque<Result<Vec<ContainerInfo>, RuntimeError>>>,
    streams: Mutex<HashMap<String, VecDeque<StreamSource>>>,
    action_results: Mutex<HashMap<ContainerAction, Result<Vec<String>, ActionError>>>,
    action_delay: Mutex<Duration>,
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            containers: Mutex::new(Vec::new()),
            list_sequence: Mutex::new(VecDeque::new()),
            streams: Mutex::new(HashMap::new()),
            action_results: Mutex::new(HashMap::new()),
            action_delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Register a container returned by `list_containers`.
    pub fn with_container(self, container: ContainerInfo) -> Self {
        guard(&self.containers).push(container);
        self
    }

    /// Replace the listed containers.
    pub fn set_containers(&self, containers: Vec<ContainerInfo>) {
        *guard(&self.containers) = containers;
    }

    /// Queue one-shot `list_containers` results served before the registered list.
    pub fn with_list_results(
        self,
        results: impl IntoIterator<Item = Result<Vec<ContainerInfo>, RuntimeError>>,
    ) -> Self {
        guard(&self.list_sequence).extend(results);
        self
    }

    /// Queue a scripted stream for the next open of `container_id`.
    pub fn with_stream(self, container_id: &str, stream: MockStream) -> Self {
        self.push_source(container_id, StreamSource::Scripted(stream));
        self
    }

    /// Queue an open failure for the next open of `container_id`.
    pub fn with_open_error(self, container_id: &str, err: RuntimeError) -> Self {
        self.push_source(container_id, StreamSource::OpenError(err));
        self
    }

    /// Queue a live stream and return its write half. Dropping the writer ends the stream.
    pub fn live_stream(&self, container_id: &str, tty: bool) -> DuplexStream {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        self.push_source(container_id, StreamSource::Live { tty, reader });
        writer
    }

    pub fn with_action_result(
        self,
        action: ContainerAction,
        result: Result<Vec<String>, ActionError>,
    ) -> Self {
        guard(&self.action_results).insert(action, result);
        self
    }

    /// Make every action take `delay` before completing.
    pub fn with_action_delay(self, delay: Duration) -> Self {
        *guard(&self.action_delay) = delay;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        guard(&self.calls).clone()
    }

    /// Number of `open_log_stream` calls seen for `container_id`.
    pub fn open_count(&self, container_id: &str) -> usize {
        guard(&self.calls)
            .iter()
            .filter(|call| {
                matches!(call, MockCall::OpenLogStream { container_id: id, .. } if id == container_id)
            })
            .count()
    }

    /// Highest number of actions observed running at once.
    pub fn max_concurrent_actions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push_source(&self, container_id: &str, source: StreamSource) {
        guard(&self.streams)
            .entry(container_id.to_owned())
            .or_default()
            .push_back(source);
    }

    fn record(&self, call: MockCall) {
        guard(&self.calls).push(call);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn open_log_stream(
        &self,
        container: &ContainerInfo,
        request: LogRequest,
    ) -> Result<LogByteStream, RuntimeError> {
        self.record(MockCall::OpenLogStream {
            container_id: container.id.clone(),
            request,
        });
        let source = guard(&self.streams)
            .get_mut(&container.id)
            .and_then(VecDeque::pop_front);
        match source {
            Some(StreamSource::Scripted(stream)) => Ok(stream.into_log_stream()),
            Some(StreamSource::Live { tty, reader }) => Ok(LogByteStream {
                tty,
                reader: Box::new(reader),
            }),
            Some(StreamSource::OpenError(err)) => Err(err),
            None => Err(RuntimeError::NotFound {
                reference: container.id.clone(),
            }),
        }
    }

    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        self.record(MockCall::ListContainers);
        if let Some(result) = guard(&self.list_sequence).pop_front() {
            return result;
        }
        Ok(guard(&self.containers).clone())
    }

    async fn perform(
        &self,
        action: ContainerAction,
        container: &ContainerInfo,
    ) -> Result<Vec<String>, ActionError> {
        self.record(MockCall::Perform {
            action,
            container_id: container.id.clone(),
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *guard(&self.action_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if action.requires_compose() && container.compose_key().is_none() {
            return Err(ActionError::Unsupported {
                action,
                container: container.display_name().to_owned(),
                reason: "not managed by compose".to_owned(),
            });
        }
        match guard(&self.action_results).get(&action) {
            Some(result) => result.clone(),
            None => Ok(vec![format!("{action} {}: done", container.display_name())]),
        }
    }
}

/// Running container fixture with compose labels.
pub fn test_container(id: &str, name: &str, project: &str, service: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.to_owned(),
        name: name.to_owned(),
        project: project.to_owned(),
        service: service.to_owned(),
        image: format!("{project}/{service}:latest"),
        state: RunState::Running,
        working_dir: String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::{test_container, MockCall, MockRuntime, MockStream};
    use crate::error::RuntimeError;
    use crate::runtime::ContainerRuntime;
    use crate::types::{ContainerAction, LogRequest};

    const FOLLOW: LogRequest = LogRequest {
        follow: true,
        tail: Some(10),
    };

    #[tokio::test]
    async fn scripted_stream_replays_then_ends() {
        let api = test_container("c1", "api", "shop", "api");
        let runtime = MockRuntime::new().with_stream("c1", MockStream::tty().stdout("a").stdout("b"));
        let mut stream = runtime.open_log_stream(&api, FOLLOW).await.unwrap();
        assert!(stream.tty);
        let mut out = String::new();
        stream.reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "a\nb\n");
        assert_eq!(
            runtime.calls(),
            vec![MockCall::OpenLogStream {
                container_id: "c1".into(),
                request: FOLLOW,
            }]
        );
    }

    #[tokio::test]
    async fn unscripted_open_is_not_found() {
        let api = test_container("c1", "api", "shop", "api");
        let err = MockRuntime::new()
            .open_log_stream(&api, FOLLOW)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::NotFound {
                reference: "c1".into()
            }
        );
    }

    #[tokio::test]
    async fn live_stream_ends_when_writer_drops() {
        let api = test_container("c1", "api", "shop", "api");
        let runtime = MockRuntime::new();
        let mut writer = runtime.live_stream("c1", true);
        let mut stream = runtime.open_log_stream(&api, FOLLOW).await.unwrap();
        writer.write_all(b"live\n").await.unwrap();
        drop(writer);
        let mut out = String::new();
        stream.reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "live\n");
    }

    #[tokio::test]
    async fn list_results_are_served_before_registered_containers() {
        let runtime = MockRuntime::new()
            .with_container(test_container("c2", "api", "shop", "api"))
            .with_list_results([Ok(Vec::new())]);
        assert!(runtime.list_containers().await.unwrap().is_empty());
        assert_eq!(runtime.list_containers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn compose_actions_need_labels() {
        let bare = test_container("c3", "solo", "", "");
        let runtime = MockRuntime::new();
        assert!(runtime.perform(ContainerAction::ComposeUp, &bare).await.is_err());
        assert_eq!(
            runtime.perform(ContainerAction::Restart, &bare).await.unwrap(),
            vec!["restart solo: done".to_owned()]
        );
    }
}

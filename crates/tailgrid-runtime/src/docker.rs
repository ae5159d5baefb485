//! Docker Engine client built on `bollard`, talking to the local unix socket.
//!
//! The engine's log endpoint is consumed through bollard's `logs()` stream.
//! Each chunk is handed on as a byte stream in the engine's own framing so the
//! demultiplexer stays the single place that splits and classifies lines.
//! Compose actions shell out to `docker compose`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, KillContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
    RemoveContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::ContainerSummary;
use bollard::{Docker, API_DEFAULT_VERSION};
use bytes::Bytes;
use futures_util::StreamExt;
use tailgrid_core::demux::encode_frame;
use tailgrid_core::{ContainerInfo, RunState};
use tokio::process::Command;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::error::{ActionError, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerAction, LogByteStream, LogRequest};

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Seconds bollard waits for the engine to answer a request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

const PROJECT_LABEL: &str = "com.docker.compose.project";
const SERVICE_LABEL: &str = "com.docker.compose.service";
const WORKING_DIR_LABEL: &str = "com.docker.compose.project.working_dir";

/// Resolve the socket path from a `DOCKER_HOST` value; only `unix://` is supported.
#[must_use]
pub fn socket_from_docker_host(value: &str) -> Option<PathBuf> {
    value
        .trim()
        .strip_prefix("unix://")
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

fn summary_to_info(summary: ContainerSummary) -> ContainerInfo {
    let labels: HashMap<String, String> = summary.labels.unwrap_or_default();
    let label = |key: &str| labels.get(key).cloned().unwrap_or_default();
    ContainerInfo {
        name: summary
            .names
            .unwrap_or_default()
            .first()
            .map(|name| name.trim_start_matches('/').to_owned())
            .unwrap_or_default(),
        project: label(PROJECT_LABEL),
        service: label(SERVICE_LABEL),
        working_dir: label(WORKING_DIR_LABEL),
        image: summary.image.unwrap_or_default(),
        state: RunState::parse(summary.state.as_deref().unwrap_or_default()),
        id: summary.id.unwrap_or_default(),
    }
}

fn runtime_error(err: BollardError, reference: &str) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound {
            reference: reference.to_owned(),
        },
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Api {
            status: status_code,
            message,
        },
        other => RuntimeError::Unavailable {
            message: other.to_string(),
        },
    }
}

fn logs_options(request: LogRequest) -> LogsOptions<String> {
    LogsOptions {
        follow: request.follow,
        stdout: true,
        stderr: true,
        timestamps: true,
        tail: request
            .tail
            .map_or_else(|| "all".to_owned(), |n| n.to_string()),
        ..Default::default()
    }
}

/// Bytes for one bollard log chunk in the framing the demultiplexer expects
/// for this container.
fn wire_bytes(output: LogOutput, tty: bool) -> Bytes {
    let (stream_type, message) = match output {
        LogOutput::StdIn { message } => (0, message),
        LogOutput::StdOut { message } | LogOutput::Console { message } => (1, message),
        LogOutput::StdErr { message } => (2, message),
    };
    if tty {
        message
    } else {
        Bytes::from(encode_frame(stream_type, &message))
    }
}

/// [`ContainerRuntime`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    socket: PathBuf,
}

impl DockerRuntime {
    /// Client for the engine at `socket`. Nothing is sent until the first call.
    pub fn connect(socket: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let socket = socket.into();
        let docker = Docker::connect_with_unix(
            &socket.to_string_lossy(),
            REQUEST_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        )
        .map_err(|err| RuntimeError::Unavailable {
            message: format!("{}: {err}", socket.display()),
        })?;
        Ok(Self { docker, socket })
    }

    #[must_use]
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    async fn is_tty(&self, id: &str) -> Result<bool, RuntimeError> {
        let inspected = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|err| runtime_error(err, id))?;
        Ok(inspected
            .config
            .and_then(|config| config.tty)
            .unwrap_or(false))
    }

    async fn engine_action(
        &self,
        action: ContainerAction,
        container: &ContainerInfo,
    ) -> Result<Vec<String>, ActionError> {
        let id = container.id.as_str();
        let result = match action {
            ContainerAction::Restart => self.docker.restart_container(id, None).await,
            ContainerAction::Kill => {
                self.docker
                    .kill_container(id, None::<KillContainerOptions<String>>)
                    .await
            }
            ContainerAction::Remove => {
                let options = RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                };
                self.docker.remove_container(id, Some(options)).await
            }
            _ => {
                return Err(ActionError::Unsupported {
                    action,
                    container: container.display_name().to_owned(),
                    reason: "not an engine action".to_owned(),
                })
            }
        };
        debug!(%action, container = %container.short_id(), ok = result.is_ok(), "engine action");
        match result.map_err(|err| runtime_error(err, id)) {
            Ok(()) => Ok(vec![format!("{action}: {} ok", container.display_name())]),
            Err(RuntimeError::Api { status, message }) => Err(ActionError::Failed {
                action,
                container: container.display_name().to_owned(),
                message: format!("status {status}: {message}"),
                output: Vec::new(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// `docker compose` arguments for each step of a compose action.
fn compose_steps(action: ContainerAction, service: &str) -> Vec<Vec<String>> {
    let args = |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_owned()).collect() };
    match action {
        ContainerAction::ComposeUp => vec![args(&["up", "-d", service])],
        ContainerAction::ComposeDown => vec![args(&["rm", "--stop", "--force", service])],
        ContainerAction::ComposeDownUp => vec![
            args(&["rm", "--stop", "--force", service]),
            args(&["up", "-d", service]),
        ],
        ContainerAction::ComposeBuildUp => vec![args(&["up", "-d", "--build", service])],
        ContainerAction::Restart | ContainerAction::Kill | ContainerAction::Remove => Vec::new(),
    }
}

async fn run_compose(
    action: ContainerAction,
    container: &ContainerInfo,
) -> Result<Vec<String>, ActionError> {
    let Some((project, service)) = container.compose_key() else {
        return Err(ActionError::Unsupported {
            action,
            container: container.display_name().to_owned(),
            reason: "not managed by compose".to_owned(),
        });
    };
    let mut output = Vec::new();
    for step in compose_steps(action, service) {
        let mut command = Command::new("docker");
        command.arg("compose").arg("-p").arg(project);
        if !container.working_dir.is_empty() {
            command.arg("--project-directory").arg(&container.working_dir);
        }
        command
            .args(&step)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        info!(%action, %project, %service, args = ?step, "running docker compose");
        let finished = command.output().await.map_err(|err| ActionError::Failed {
            action,
            container: container.display_name().to_owned(),
            message: format!("cannot run docker compose: {err}"),
            output: output.clone(),
        })?;
        for stream in [&finished.stdout, &finished.stderr] {
            output.extend(
                String::from_utf8_lossy(stream)
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_owned),
            );
        }
        if !finished.status.success() {
            return Err(ActionError::Failed {
                action,
                container: container.display_name().to_owned(),
                message: finished.status.to_string(),
                output,
            });
        }
    }
    Ok(output)
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn open_log_stream(
        &self,
        container: &ContainerInfo,
        request: LogRequest,
    ) -> Result<LogByteStream, RuntimeError> {
        let tty = self.is_tty(&container.id).await?;
        let chunks = self
            .docker
            .logs(&container.id, Some(logs_options(request)))
            .map(move |chunk| match chunk {
                Ok(output) => Ok(wire_bytes(output, tty)),
                Err(err) => Err(io::Error::other(err)),
            });
        Ok(LogByteStream {
            tty,
            reader: Box::new(StreamReader::new(Box::pin(chunks))),
        })
    }

    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let listed = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|err| runtime_error(err, "containers"))?;
        Ok(listed.into_iter().map(summary_to_info).collect())
    }

    async fn perform(
        &self,
        action: ContainerAction,
        container: &ContainerInfo,
    ) -> Result<Vec<String>, ActionError> {
        if action.requires_compose() {
            run_compose(action, container).await
        } else {
            self.engine_action(action, container).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use bollard::container::LogOutput;
    use bollard::errors::Error as BollardError;
    use bollard::models::ContainerSummary;
    use bytes::Bytes;
    use tailgrid_core::{Demuxer, RunState, StreamClass, StreamMode};

    use super::{
        compose_steps, logs_options, runtime_error, socket_from_docker_host, summary_to_info,
        wire_bytes,
    };
    use crate::error::RuntimeError;
    use crate::types::{ContainerAction, LogRequest};

    #[test]
    fn docker_host_only_accepts_unix_sockets() {
        assert_eq!(
            socket_from_docker_host("unix:///run/user/1000/docker.sock"),
            Some(PathBuf::from("/run/user/1000/docker.sock"))
        );
        assert_eq!(socket_from_docker_host("tcp://10.0.0.1:2375"), None);
        assert_eq!(socket_from_docker_host("unix://"), None);
    }

    #[test]
    fn logs_options_encode_follow_and_tail() {
        let follow = logs_options(LogRequest { follow: true, tail: Some(100) });
        assert!(follow.follow && follow.stdout && follow.stderr && follow.timestamps);
        assert_eq!(follow.tail, "100");
        let all = logs_options(LogRequest { follow: false, tail: None });
        assert!(!all.follow);
        assert_eq!(all.tail, "all");
    }

    #[test]
    fn summary_maps_compose_labels() {
        let labels = HashMap::from([
            ("com.docker.compose.project".to_owned(), "shop".to_owned()),
            ("com.docker.compose.service".to_owned(), "api".to_owned()),
            ("com.docker.compose.project.working_dir".to_owned(), "/srv/shop".to_owned()),
        ]);
        let info = summary_to_info(ContainerSummary {
            id: Some("deadbeef".to_owned()),
            names: Some(vec!["/shop-api-1".to_owned()]),
            image: Some("shop/api".to_owned()),
            state: Some("running".to_owned()),
            labels: Some(labels),
            ..Default::default()
        });
        assert_eq!(info.name, "shop-api-1");
        assert_eq!(info.compose_key(), Some(("shop", "api")));
        assert_eq!(info.working_dir, "/srv/shop");
        assert_eq!(info.state, RunState::Running);

        let bare = summary_to_info(ContainerSummary {
            id: Some("cafe".to_owned()),
            state: Some("exited".to_owned()),
            ..Default::default()
        });
        assert_eq!(bare.display_name(), "cafe");
        assert_eq!(bare.state, RunState::Exited);
        assert_eq!(bare.compose_key(), None);
    }

    #[test]
    fn reframed_chunks_decode_with_their_stream_class() {
        let mut demuxer = Demuxer::new(StreamMode::for_tty(false));
        let mut bytes = wire_bytes(
            LogOutput::StdOut {
                message: Bytes::from_static(b"ready\n"),
            },
            false,
        )
        .to_vec();
        bytes.extend_from_slice(&wire_bytes(
            LogOutput::StdErr {
                message: Bytes::from_static(b"boom\n"),
            },
            false,
        ));
        let lines = demuxer.push(&bytes).unwrap();
        let decoded: Vec<_> = lines.iter().map(|line| (line.stream, line.text.as_str())).collect();
        assert_eq!(
            decoded,
            vec![(StreamClass::Stdout, "ready"), (StreamClass::Stderr, "boom")]
        );
    }

    #[test]
    fn tty_chunks_pass_through_untouched() {
        let console = LogOutput::Console {
            message: Bytes::from_static(b"half a li"),
        };
        assert_eq!(wire_bytes(console, true), Bytes::from_static(b"half a li"));
    }

    #[test]
    fn engine_errors_map_to_runtime_categories() {
        let missing = BollardError::DockerResponseServerError {
            status_code: 404,
            message: "no such container".to_owned(),
        };
        assert_eq!(
            runtime_error(missing, "abc"),
            RuntimeError::NotFound {
                reference: "abc".to_owned()
            }
        );
        let conflict = BollardError::DockerResponseServerError {
            status_code: 409,
            message: "is not running".to_owned(),
        };
        assert_eq!(
            runtime_error(conflict, "abc"),
            RuntimeError::Api {
                status: 409,
                message: "is not running".to_owned()
            }
        );
    }

    #[test]
    fn compose_down_up_runs_two_steps() {
        let steps = compose_steps(ContainerAction::ComposeDownUp, "api");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], vec!["rm", "--stop", "--force", "api"]);
        assert_eq!(steps[1], vec!["up", "-d", "api"]);
        assert!(compose_steps(ContainerAction::Kill, "api").is_empty());
    }
}

//! Viewer configuration: defaults, environment overrides and clamping.

use std::path::PathBuf;
use std::time::Duration;

use tailgrid_runtime::actions::DEFAULT_BULK_CONCURRENCY;
use tailgrid_runtime::docker::{socket_from_docker_host, DEFAULT_SOCKET};
use tailgrid_runtime::reconnect::DEFAULT_SCHEDULE;
use tailgrid_runtime::types::LogRequest;

use crate::debounce::DEFAULT_RESIZE_DEBOUNCE;
use crate::pane::DEFAULT_HISTORY;

const MAX_HISTORY: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub history_limit: usize,
    /// Recent lines shown when attaching to a running container.
    pub running_tail: usize,
    /// Bounded tail read from stopped containers.
    pub stopped_tail: usize,
    pub resize_debounce: Duration,
    pub toast_duration: Duration,
    pub reconnect_schedule: Vec<Duration>,
    pub bulk_concurrency: usize,
    pub listing_ttl: Duration,
    pub palette: String,
    pub socket: PathBuf,
    pub log_file: PathBuf,
    /// Container ids or names to open; empty means every running container.
    pub containers: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY,
            running_tail: 100,
            stopped_tail: 50,
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            toast_duration: Duration::from_millis(3000),
            reconnect_schedule: DEFAULT_SCHEDULE.to_vec(),
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
            listing_ttl: Duration::from_secs(2),
            palette: "default".to_owned(),
            socket: PathBuf::from(DEFAULT_SOCKET),
            log_file: std::env::temp_dir().join("tailgrid.log"),
            containers: Vec::new(),
        }
    }
}

impl ViewerConfig {
    /// Defaults overridden by `TAILGRID_*` and `DOCKER_HOST`, plus positional
    /// container arguments.
    #[must_use]
    pub fn from_env(args: Vec<String>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), args)
    }

    pub fn from_lookup<F>(lookup: F, args: Vec<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let number = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());

        if let Some(value) = number("TAILGRID_HISTORY") {
            config.history_limit = value as usize;
        }
        if let Some(value) = number("TAILGRID_TAIL") {
            config.running_tail = value as usize;
        }
        if let Some(value) = number("TAILGRID_STOPPED_TAIL") {
            config.stopped_tail = value as usize;
        }
        if let Some(value) = number("TAILGRID_DEBOUNCE_MS") {
            config.resize_debounce = Duration::from_millis(value);
        }
        if let Some(value) = number("TAILGRID_TOAST_MS") {
            config.toast_duration = Duration::from_millis(value);
        }
        if let Some(value) = number("TAILGRID_BULK_CONCURRENCY") {
            config.bulk_concurrency = value as usize;
        }
        if let Some(value) = lookup("TAILGRID_RECONNECT_SCHEDULE") {
            if let Some(schedule) = parse_schedule(&value) {
                config.reconnect_schedule = schedule;
            }
        }
        if let Some(value) = lookup("TAILGRID_PALETTE") {
            config.palette = value;
        }
        if let Some(socket) = lookup("DOCKER_HOST").as_deref().and_then(socket_from_docker_host) {
            config.socket = socket;
        }
        if let Some(value) = lookup("TAILGRID_LOG_FILE").filter(|value| !value.trim().is_empty()) {
            config.log_file = PathBuf::from(value);
        }
        config.containers = args
            .into_iter()
            .map(|arg| arg.trim().to_owned())
            .filter(|arg| !arg.is_empty())
            .collect();
        config.normalized()
    }

    /// Clamp every field into a usable range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.history_limit = self.history_limit.clamp(1, MAX_HISTORY);
        self.running_tail = self.running_tail.min(self.history_limit);
        self.stopped_tail = self.stopped_tail.clamp(1, self.history_limit);
        if self.resize_debounce.is_zero() {
            self.resize_debounce = Duration::from_millis(1);
        }
        if self.toast_duration.is_zero() {
            self.toast_duration = Duration::from_millis(3000);
        }
        if self.reconnect_schedule.is_empty() {
            self.reconnect_schedule = DEFAULT_SCHEDULE.to_vec();
        }
        self.bulk_concurrency = self.bulk_concurrency.max(1);
        let palette = self.palette.trim().to_ascii_lowercase();
        self.palette = if palette.is_empty() {
            "default".to_owned()
        } else {
            palette
        };
        self
    }

    /// Log request for a container in the given run state.
    #[must_use]
    pub fn log_request(&self, running: bool) -> LogRequest {
        LogRequest::for_state(running, self.running_tail, self.stopped_tail)
    }
}

/// Comma-separated seconds, e.g. `1,2,3,5`. Any bad entry rejects the value.
fn parse_schedule(value: &str) -> Option<Vec<Duration>> {
    let schedule = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        })
        .collect::<Option<Vec<_>>>()?;
    (!schedule.is_empty()).then_some(schedule)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::ViewerConfig;

    fn from(vars: &[(&str, &str)], args: &[&str]) -> ViewerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ViewerConfig::from_lookup(
            |key| map.get(key).cloned(),
            args.iter().map(|a| (*a).to_owned()).collect(),
        )
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ViewerConfig::default();
        assert_eq!(config.history_limit, 1000);
        assert_eq!(config.stopped_tail, 50);
        assert_eq!(config.resize_debounce, Duration::from_millis(50));
        assert_eq!(config.toast_duration, Duration::from_millis(3000));
        assert_eq!(config.bulk_concurrency, 3);
        assert_eq!(
            config.reconnect_schedule,
            [1, 2, 3, 5].map(Duration::from_secs).to_vec()
        );
        assert_eq!(config.socket, PathBuf::from("/var/run/docker.sock"));
    }

    #[test]
    fn environment_overrides_and_args() {
        let config = from(
            &[
                ("TAILGRID_HISTORY", "200"),
                ("TAILGRID_RECONNECT_SCHEDULE", "0.5, 1"),
                ("TAILGRID_PALETTE", " Light "),
                ("DOCKER_HOST", "unix:///run/podman/podman.sock"),
                ("TAILGRID_LOG_FILE", "/tmp/tg.log"),
            ],
            &["api", " ", "worker"],
        );
        assert_eq!(config.history_limit, 200);
        assert_eq!(
            config.reconnect_schedule,
            vec![Duration::from_millis(500), Duration::from_secs(1)]
        );
        assert_eq!(config.palette, "light");
        assert_eq!(config.socket, PathBuf::from("/run/podman/podman.sock"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/tg.log"));
        assert_eq!(config.containers, vec!["api", "worker"]);
    }

    #[test]
    fn bad_values_are_ignored_or_clamped() {
        let config = from(
            &[
                ("TAILGRID_HISTORY", "0"),
                ("TAILGRID_BULK_CONCURRENCY", "0"),
                ("TAILGRID_RECONNECT_SCHEDULE", "1,soon"),
                ("TAILGRID_DEBOUNCE_MS", "nope"),
                ("DOCKER_HOST", "tcp://10.0.0.2:2375"),
            ],
            &[],
        );
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.bulk_concurrency, 1);
        assert_eq!(config.reconnect_schedule.len(), 4);
        assert_eq!(config.resize_debounce, Duration::from_millis(50));
        assert_eq!(config.socket, PathBuf::from("/var/run/docker.sock"));
    }

    #[test]
    fn out_of_range_schedule_is_rejected() {
        for value in ["1e30", "-1", "NaN", "inf"] {
            let config = from(&[("TAILGRID_RECONNECT_SCHEDULE", value)], &[]);
            assert_eq!(config.reconnect_schedule.len(), 4, "{value}");
        }
    }

    #[test]
    fn log_request_depends_on_run_state() {
        let config = ViewerConfig::default();
        assert!(config.log_request(true).follow);
        let stopped = config.log_request(false);
        assert!(!stopped.follow);
        assert_eq!(stopped.tail, Some(50));
    }
}

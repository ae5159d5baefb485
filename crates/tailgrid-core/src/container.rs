//! Container identity and metadata shown in pane titles.

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by the container runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    #[default]
    Unknown,
}

impl RunState {
    /// Parse the runtime's state label; unknown labels map to `Unknown`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    /// Whether log streams for this state should be followed indefinitely.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::Restarting)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One container as listed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    /// Compose project label, empty when the container is not compose-managed.
    pub project: String,
    /// Compose service label, empty when the container is not compose-managed.
    pub service: String,
    pub image: String,
    pub state: RunState,
    /// Compose project directory label, empty when unknown.
    #[serde(default)]
    pub working_dir: String,
}

impl ContainerInfo {
    #[must_use]
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(12)
            .map_or(self.id.len(), |(idx, _)| idx);
        &self.id[..end]
    }

    /// Name used in titles; falls back to the short id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            self.short_id()
        } else {
            trimmed
        }
    }

    /// Compose project/service pair when both labels are present.
    #[must_use]
    pub fn compose_key(&self) -> Option<(&str, &str)> {
        let project = self.project.trim();
        let service = self.service.trim();
        if project.is_empty() || service.is_empty() {
            None
        } else {
            Some((project, service))
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// True when `query` names this container by full id, id prefix or name.
    #[must_use]
    pub fn matches_reference(&self, query: &str) -> bool {
        let query = query.trim().trim_start_matches('/');
        if query.is_empty() {
            return false;
        }
        self.id == query || self.id.starts_with(query) || self.display_name() == query
    }
}

#[cfg(test)]
mod tests {
    use super::{ContainerInfo, RunState};

    fn container(name: &str) -> ContainerInfo {
        ContainerInfo {
            id: "0123456789abcdef0123".to_owned(),
            name: name.to_owned(),
            project: "shop".to_owned(),
            service: "api".to_owned(),
            image: "shop/api:latest".to_owned(),
            state: RunState::Running,
            working_dir: "/srv/shop".to_owned(),
        }
    }

    #[test]
    fn run_state_parses_runtime_labels() {
        assert_eq!(RunState::parse("Running"), RunState::Running);
        assert_eq!(RunState::parse(" exited "), RunState::Exited);
        assert_eq!(RunState::parse("weird"), RunState::Unknown);
        assert!(RunState::Restarting.is_running());
        assert!(!RunState::Exited.is_running());
    }

    #[test]
    fn display_name_strips_leading_slash_and_falls_back_to_short_id() {
        assert_eq!(container("/shop-api-1").display_name(), "shop-api-1");
        assert_eq!(container("").display_name(), "0123456789ab");
    }

    #[test]
    fn compose_key_requires_both_labels() {
        let mut info = container("api");
        assert_eq!(info.compose_key(), Some(("shop", "api")));
        info.service.clear();
        assert_eq!(info.compose_key(), None);
    }

    #[test]
    fn matches_reference_accepts_prefix_and_name() {
        let info = container("/shop-api-1");
        assert!(info.matches_reference("0123"));
        assert!(info.matches_reference("shop-api-1"));
        assert!(!info.matches_reference("shop"));
        assert!(!info.matches_reference("  "));
    }
}

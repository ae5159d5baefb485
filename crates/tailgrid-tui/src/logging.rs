//! Tracing subscriber setup for the `tailgrid` binary.
//!
//! The terminal belongs to the dashboard, so logs go to a file. Filter
//! priority: `TAILGRID_LOG`, then `RUST_LOG`, then `warn`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "warn";

/// Build the filter from the two environment values, skipping unparseable ones.
#[must_use]
pub fn build_env_filter(tailgrid_log: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    [tailgrid_log, rust_log]
        .into_iter()
        .flatten()
        .filter(|directives| !directives.trim().is_empty())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber writing to `path`.
pub fn init_file_logging(path: &Path) -> Result<(), String> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("open log file {}: {err}", path.display()))?;
    let filter = build_env_filter(
        std::env::var("TAILGRID_LOG").ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| format!("install log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::build_env_filter;

    #[test]
    fn filter_priority() {
        assert_eq!(
            build_env_filter(Some("tailgrid_runtime=debug"), Some("info")).to_string(),
            "tailgrid_runtime=debug"
        );
        assert_eq!(build_env_filter(None, Some("info")).to_string(), "info");
        assert_eq!(build_env_filter(Some("  "), None).to_string(), "warn");
        assert_eq!(build_env_filter(Some("tailgrid=loud"), None).to_string(), "warn");
    }
}

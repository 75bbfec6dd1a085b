//! Lifecycle events for one dockbar run.
//!
//! A run is a single CLI invocation. The finish event carries how much was
//! written to stdout so an idle `watch` can be told apart from a stuck one.

use tracing::{error, info, warn};

use crate::errors::DockbarError;

/// The subcommand a run is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Watch,
    List,
    Config,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Watch => "watch",
            RunMode::List => "list",
            RunMode::Config => "config",
        }
    }
}

pub fn log_run_started(mode: RunMode) {
    info!(
        event = "core.run.start_completed",
        mode = mode.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS
    );
}

/// `emitted` counts snapshots for `watch` and windows for `list`.
pub fn log_run_finished(mode: RunMode, emitted: usize) {
    info!(
        event = "core.run.finish_completed",
        mode = mode.as_str(),
        emitted = emitted
    );
}

/// User-fixable failures are warnings; everything else is an error.
pub fn log_run_failed(mode: RunMode, failure: &dyn DockbarError) {
    if failure.is_user_error() {
        warn!(
            event = "core.run.failed",
            mode = mode.as_str(),
            code = failure.error_code(),
            error = %failure
        );
    } else {
        error!(
            event = "core.run.failed",
            mode = mode.as_str(),
            code = failure.error_code(),
            error = %failure
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowServiceError;

    #[test]
    fn test_run_mode_names_match_subcommands() {
        assert_eq!(RunMode::Watch.as_str(), "watch");
        assert_eq!(RunMode::List.as_str(), "list");
        assert_eq!(RunMode::Config.as_str(), "config");
    }

    #[test]
    fn test_run_events() {
        log_run_started(RunMode::List);
        log_run_failed(RunMode::List, &WindowServiceError::Unsupported);
        log_run_failed(
            RunMode::Watch,
            &WindowServiceError::EnumerationFailed {
                reason: "window server unavailable".to_string(),
            },
        );
        log_run_finished(RunMode::List, 0);
    }
}

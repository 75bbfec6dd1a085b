//! Error conventions shared by every dockbar module.
//!
//! Each module owns a `thiserror` enum and implements [`DockbarError`] on it
//! so the CLI and the lifecycle events can report a stable code.

use std::error::Error;

/// Base trait for all dockbar errors
pub trait DockbarError: Error + Send + Sync + 'static {
    /// Stable code for programmatic handling, e.g. `CONFIG_INVALID_TIMING`.
    fn error_code(&self) -> &'static str;

    /// Errors the user can fix (bad config, missing permission). Logged as
    /// warnings rather than errors.
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Configuration failures. Validation variants name the offending key as it
/// is spelled in `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at '{path}'")]
    NotFound { path: String },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("timing.{key} must be greater than 0")]
    ZeroTiming { key: &'static str },

    #[error("timing.title_confirm_cycles must be at least 1")]
    ZeroTitleCycles,

    #[error("{key} must be a positive number of points, got {height}")]
    InvalidBarHeight { key: String, height: f64 },

    #[error("taskbar.displays key '{key}' is not a display id")]
    InvalidDisplayKey { key: String },

    #[error("IO error reading config: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// True for the rejections produced by validating a merged config.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConfigError::ZeroTiming { .. }
                | ConfigError::ZeroTitleCycles
                | ConfigError::InvalidBarHeight { .. }
                | ConfigError::InvalidDisplayKey { .. }
        )
    }
}

impl DockbarError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::NotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::Parse { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::ZeroTiming { .. } => "CONFIG_INVALID_TIMING",
            ConfigError::ZeroTitleCycles => "CONFIG_INVALID_TITLE_CYCLES",
            ConfigError::InvalidBarHeight { .. } => "CONFIG_INVALID_BAR_HEIGHT",
            ConfigError::InvalidDisplayKey { .. } => "CONFIG_INVALID_DISPLAY_KEY",
            ConfigError::Io { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::Io { .. })
    }
}

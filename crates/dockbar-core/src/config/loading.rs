//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.dockbar/config.toml` (global user preferences)
//! 3. **Explicit config** - the file named by `DOCKBAR_CONFIG`
//! 4. **CLI arguments** - Command-line flags (highest priority)

use crate::config::types::{
    ActionsConfig, DockbarConfig, EdgeGuardConfig, FilterConfig, TaskbarConfig, TimingConfig,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DOCKBAR_CONFIG";

/// Load configuration from the hierarchy of config files.
///
/// A missing user config is not an error. A missing file named by
/// `DOCKBAR_CONFIG` is, because the user asked for it explicitly.
///
/// # Errors
///
/// Returns an error if a present file cannot be parsed or the merged
/// configuration fails validation.
pub fn load_hierarchy() -> Result<DockbarConfig, ConfigError> {
    let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    load_hierarchy_from(user_config_path(), explicit)
}

/// Same as [`load_hierarchy`] with the file locations supplied by the caller.
pub fn load_hierarchy_from(
    user_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
) -> Result<DockbarConfig, ConfigError> {
    let mut config = DockbarConfig::default();

    if let Some(path) = user_path {
        match load_config_file(&path) {
            Ok(user_config) => {
                debug!(event = "core.config.user_loaded", path = %path.display());
                config = merge_configs(config, user_config);
            }
            Err(ConfigError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    if let Some(path) = explicit_path {
        let explicit_config = load_config_file(&path)?;
        debug!(event = "core.config.explicit_loaded", path = %path.display());
        config = merge_configs(config, explicit_config);
    }

    validate_config(&config)?;

    info!(
        event = "core.config.load_completed",
        scan_interval_ms = config.timings().scan_interval.as_millis() as u64,
        bar_height = config.taskbar.bar_height(),
        edge_guard = config.edge_guard.enabled()
    );

    Ok(config)
}

/// Location of the user config file, `~/.dockbar/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dockbar").join("config.toml"))
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<DockbarConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::Io { source: e }
        }
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Optional fields are replaced only when the override sets them. Display
/// overrides merge per key; excluded apps are unioned.
pub fn merge_configs(base: DockbarConfig, override_config: DockbarConfig) -> DockbarConfig {
    let o = override_config;
    DockbarConfig {
        timing: TimingConfig {
            scan_interval_ms: o.timing.scan_interval_ms.or(base.timing.scan_interval_ms),
            appear_grace_ms: o.timing.appear_grace_ms.or(base.timing.appear_grace_ms),
            vanish_grace_ms: o.timing.vanish_grace_ms.or(base.timing.vanish_grace_ms),
            pending_grace_ms: o.timing.pending_grace_ms.or(base.timing.pending_grace_ms),
            edge_stability_ms: o.timing.edge_stability_ms.or(base.timing.edge_stability_ms),
            edge_rate_limit_ms: o
                .timing
                .edge_rate_limit_ms
                .or(base.timing.edge_rate_limit_ms),
            event_debounce_ms: o.timing.event_debounce_ms.or(base.timing.event_debounce_ms),
            title_confirm_cycles: o
                .timing
                .title_confirm_cycles
                .or(base.timing.title_confirm_cycles),
        },
        taskbar: TaskbarConfig {
            bar_height: o.taskbar.bar_height.or(base.taskbar.bar_height),
            displays: {
                let mut merged = base.taskbar.displays;
                for (key, value) in o.taskbar.displays {
                    merged.insert(key, value);
                }
                merged
            },
        },
        filter: FilterConfig {
            excluded_apps: {
                let mut merged = base.filter.excluded_apps;
                for app in o.filter.excluded_apps {
                    if !merged.contains(&app) {
                        merged.push(app);
                    }
                }
                merged
            },
        },
        edge_guard: EdgeGuardConfig {
            enabled: o.edge_guard.enabled.or(base.edge_guard.enabled),
        },
        actions: ActionsConfig {
            allow_terminate_on_close: o
                .actions
                .allow_terminate_on_close
                .or(base.actions.allow_terminate_on_close),
        },
    }
}

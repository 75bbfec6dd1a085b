use std::collections::HashMap;

use crate::actions::ActionError;
use crate::config::{DockbarConfig, EngineTimings, TaskbarConfig};
use crate::config::defaults::DEFAULT_BAR_HEIGHT;
use crate::window::{DisplayId, LocalId};

/// Reserved band height per display.
#[derive(Debug, Clone, PartialEq)]
pub struct BandHeights {
    default: f64,
    per_display: HashMap<DisplayId, f64>,
}

impl BandHeights {
    pub fn uniform(height: f64) -> Self {
        Self {
            default: height,
            per_display: HashMap::new(),
        }
    }

    pub fn with_display(mut self, display_id: DisplayId, height: f64) -> Self {
        self.per_display.insert(display_id, height);
        self
    }

    pub fn height_for(&self, display_id: DisplayId) -> f64 {
        self.per_display
            .get(&display_id)
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for BandHeights {
    fn default() -> Self {
        Self::uniform(DEFAULT_BAR_HEIGHT)
    }
}

impl From<&TaskbarConfig> for BandHeights {
    /// Display keys that are not numeric are skipped; validation rejects them
    /// before a config gets here.
    fn from(config: &TaskbarConfig) -> Self {
        let per_display = config
            .displays
            .iter()
            .filter_map(|(key, display)| {
                let id = key.parse::<DisplayId>().ok()?;
                Some((id, display.bar_height?))
            })
            .collect();
        Self {
            default: config.bar_height(),
            per_display,
        }
    }
}

/// Everything the engine needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub timings: EngineTimings,
    pub band_heights: BandHeights,
    pub edge_guard: bool,
    pub excluded_apps: Vec<String>,
    pub allow_terminate_on_close: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&DockbarConfig::default())
    }
}

impl From<&DockbarConfig> for EngineOptions {
    fn from(config: &DockbarConfig) -> Self {
        Self {
            timings: config.timings(),
            band_heights: BandHeights::from(&config.taskbar),
            edge_guard: config.edge_guard.enabled(),
            excluded_apps: config.filter.excluded_apps.clone(),
            allow_terminate_on_close: config.actions.allow_terminate_on_close(),
        }
    }
}

/// Commands accepted by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Toggle(LocalId),
    Focus(LocalId),
    Close {
        local_id: LocalId,
        allow_terminate: bool,
    },
    DisplaysChanged,
}

/// One-shot notices for the presentation layer, tied to a window.
#[derive(Debug, Clone)]
pub enum EngineNotice {
    ActionFailed { local_id: LocalId, error: ActionError },
    /// A close fell back to terminating the owning application.
    WindowTerminated { local_id: LocalId, app: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_heights_from_config() {
        let config: DockbarConfig = toml::from_str(
            r#"
[taskbar]
bar_height = 50

[taskbar.displays.3]
bar_height = 36
"#,
        )
        .unwrap();
        let heights = BandHeights::from(&config.taskbar);
        assert_eq!(heights.height_for(3), 36.0);
        assert_eq!(heights.height_for(1), 50.0);
    }

    #[test]
    fn test_engine_options_defaults() {
        let options = EngineOptions::default();
        assert!(options.edge_guard);
        assert!(!options.allow_terminate_on_close);
        assert_eq!(options.band_heights.height_for(1), 60.0);
        assert_eq!(options.timings, EngineTimings::default());
    }
}

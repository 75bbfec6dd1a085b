//! Default values and resolving accessors for configuration types.

use std::time::Duration;

use crate::config::types::{
    ActionsConfig, DockbarConfig, EdgeGuardConfig, EngineTimings, TaskbarConfig, TimingConfig,
};

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 120;
pub const DEFAULT_APPEAR_GRACE_MS: u64 = 150;
pub const DEFAULT_VANISH_GRACE_MS: u64 = 450;
pub const DEFAULT_PENDING_GRACE_MS: u64 = 350;
pub const DEFAULT_EDGE_STABILITY_MS: u64 = 180;
pub const DEFAULT_EDGE_RATE_LIMIT_MS: u64 = 250;
pub const DEFAULT_EVENT_DEBOUNCE_MS: u64 = 30;
pub const DEFAULT_TITLE_CONFIRM_CYCLES: u32 = 2;
pub const DEFAULT_BAR_HEIGHT: f64 = 60.0;

impl TimingConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.unwrap_or(DEFAULT_SCAN_INTERVAL_MS))
    }

    pub fn appear_grace(&self) -> Duration {
        Duration::from_millis(self.appear_grace_ms.unwrap_or(DEFAULT_APPEAR_GRACE_MS))
    }

    pub fn vanish_grace(&self) -> Duration {
        Duration::from_millis(self.vanish_grace_ms.unwrap_or(DEFAULT_VANISH_GRACE_MS))
    }

    pub fn pending_grace(&self) -> Duration {
        Duration::from_millis(self.pending_grace_ms.unwrap_or(DEFAULT_PENDING_GRACE_MS))
    }

    pub fn edge_stability(&self) -> Duration {
        Duration::from_millis(self.edge_stability_ms.unwrap_or(DEFAULT_EDGE_STABILITY_MS))
    }

    pub fn edge_rate_limit(&self) -> Duration {
        Duration::from_millis(self.edge_rate_limit_ms.unwrap_or(DEFAULT_EDGE_RATE_LIMIT_MS))
    }

    pub fn event_debounce(&self) -> Duration {
        Duration::from_millis(self.event_debounce_ms.unwrap_or(DEFAULT_EVENT_DEBOUNCE_MS))
    }

    pub fn title_confirm_cycles(&self) -> u32 {
        self.title_confirm_cycles
            .unwrap_or(DEFAULT_TITLE_CONFIRM_CYCLES)
    }
}

impl TaskbarConfig {
    /// Returns the global reserved band height, defaulting to 60.
    pub fn bar_height(&self) -> f64 {
        self.bar_height.unwrap_or(DEFAULT_BAR_HEIGHT)
    }
}

impl EdgeGuardConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl ActionsConfig {
    pub fn allow_terminate_on_close(&self) -> bool {
        self.allow_terminate_on_close.unwrap_or(false)
    }
}

impl DockbarConfig {
    /// Resolve every timing knob into the `Duration` view used by the engine.
    pub fn timings(&self) -> EngineTimings {
        EngineTimings {
            scan_interval: self.timing.scan_interval(),
            appear_grace: self.timing.appear_grace(),
            vanish_grace: self.timing.vanish_grace(),
            pending_grace: self.timing.pending_grace(),
            edge_stability: self.timing.edge_stability(),
            edge_rate_limit: self.timing.edge_rate_limit(),
            event_debounce: self.timing.event_debounce(),
            title_confirm_cycles: self.timing.title_confirm_cycles(),
        }
    }

    /// A copy with every optional knob filled in with its resolved value.
    pub fn effective(&self) -> DockbarConfig {
        let timing = TimingConfig {
            scan_interval_ms: Some(self.timing.scan_interval().as_millis() as u64),
            appear_grace_ms: Some(self.timing.appear_grace().as_millis() as u64),
            vanish_grace_ms: Some(self.timing.vanish_grace().as_millis() as u64),
            pending_grace_ms: Some(self.timing.pending_grace().as_millis() as u64),
            edge_stability_ms: Some(self.timing.edge_stability().as_millis() as u64),
            edge_rate_limit_ms: Some(self.timing.edge_rate_limit().as_millis() as u64),
            event_debounce_ms: Some(self.timing.event_debounce().as_millis() as u64),
            title_confirm_cycles: Some(self.timing.title_confirm_cycles()),
        };
        let mut taskbar = self.taskbar.clone();
        taskbar.bar_height = Some(self.taskbar.bar_height());

        DockbarConfig {
            timing,
            taskbar,
            filter: self.filter.clone(),
            edge_guard: EdgeGuardConfig {
                enabled: Some(self.edge_guard.enabled()),
            },
            actions: ActionsConfig {
                allow_terminate_on_close: Some(self.actions.allow_terminate_on_close()),
            },
        }
    }
}

impl Default for EngineTimings {
    fn default() -> Self {
        DockbarConfig::default().timings()
    }
}

//! Configuration type definitions for dockbar.
//!
//! These types are serialized/deserialized from TOML config files. Every
//! tunable is optional in the file; accessors in [`super::defaults`] resolve
//! the documented default.
//!
//! # Example Configuration
//!
//! ```toml
//! [timing]
//! scan_interval_ms = 120
//! appear_grace_ms = 150
//! vanish_grace_ms = 450
//!
//! [taskbar]
//! bar_height = 60
//!
//! [taskbar.displays.2]
//! bar_height = 44
//!
//! [filter]
//! excluded_apps = ["Raycast"]
//!
//! [edge_guard]
//! enabled = true
//!
//! [actions]
//! allow_terminate_on_close = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration loaded from TOML config files.
///
/// Loaded from (later overrides earlier):
/// 1. User config: `~/.dockbar/config.toml`
/// 2. Explicit config: the file named by `DOCKBAR_CONFIG`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DockbarConfig {
    /// Reconciliation timings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Reserved band geometry
    #[serde(default)]
    pub taskbar: TaskbarConfig,

    /// Extra window-owner exclusions
    #[serde(default)]
    pub filter: FilterConfig,

    /// Edge enforcement toggle
    #[serde(default)]
    pub edge_guard: EdgeGuardConfig,

    /// Action policy
    #[serde(default)]
    pub actions: ActionsConfig,
}

/// Reconciliation timing knobs, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TimingConfig {
    /// Period of the scan timer. Default: 120ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_ms: Option<u64>,

    /// Continuous presence required before a window is published. Default: 150ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear_grace_ms: Option<u64>,

    /// Absence tolerated before a window is removed. Default: 450ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vanish_grace_ms: Option<u64>,

    /// Lifetime of an optimistic post-toggle override. Default: 350ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_grace_ms: Option<u64>,

    /// How long a frame must stay put before it may be corrected. Default: 180ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_stability_ms: Option<u64>,

    /// Minimum gap between two corrections of one window. Default: 250ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_rate_limit_ms: Option<u64>,

    /// Coalescing window for bursts of OS notifications. Default: 30ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_debounce_ms: Option<u64>,

    /// Consecutive identical sightings before a title change is accepted. Default: 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_confirm_cycles: Option<u32>,
}

/// Taskbar geometry.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TaskbarConfig {
    /// Height in points of the reserved band at the bottom of every display.
    /// Default: 60.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_height: Option<f64>,

    /// Per-display overrides keyed by display id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub displays: BTreeMap<String, DisplayOverride>,
}

/// Settings for a single display, used in `[taskbar.displays.<id>]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_height: Option<f64>,
}

/// Window-owner exclusions on top of the built-in system list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FilterConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_apps: Vec<String>,
}

/// Edge enforcement configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EdgeGuardConfig {
    /// Whether foreign windows are pushed out of the reserved band. Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Action policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ActionsConfig {
    /// Whether a failed close may terminate the owning process. Default: false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_terminate_on_close: Option<bool>,
}

/// Resolved timing values consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimings {
    pub scan_interval: Duration,
    pub appear_grace: Duration,
    pub vanish_grace: Duration,
    pub pending_grace: Duration,
    pub edge_stability: Duration,
    pub edge_rate_limit: Duration,
    pub event_debounce: Duration,
    pub title_confirm_cycles: u32,
}

use std::time::Duration;

use crate::config::EngineTimings;
use crate::window::{ExternalWindowId, Point, Rect};

/// Frame movement below this many points does not restart the stability clock.
pub const DEFAULT_FRAME_EPSILON: f64 = 1.5;

/// Overlap with the band below this many points is ignored.
pub const DEFAULT_MIN_INTRUSION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSettings {
    pub stability: Duration,
    pub rate_limit: Duration,
    pub frame_epsilon: f64,
    pub min_intrusion: f64,
}

impl From<&EngineTimings> for EdgeSettings {
    fn from(t: &EngineTimings) -> Self {
        Self {
            stability: t.edge_stability,
            rate_limit: t.edge_rate_limit,
            frame_epsilon: DEFAULT_FRAME_EPSILON,
            min_intrusion: DEFAULT_MIN_INTRUSION,
        }
    }
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self::from(&EngineTimings::default())
    }
}

/// Position-only move that puts a window's bottom edge on the band's top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub from: Rect,
    pub to: Point,
    /// Upward displacement in points.
    pub delta: f64,
}

impl Correction {
    pub fn corrected_frame(&self) -> Rect {
        self.from.with_origin(self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeDecision {
    NotIntruding,
    /// Zero-sized frame, read mid-transition.
    Degenerate,
    /// Frame is new or still moving.
    Settling,
    RateLimited,
    /// Already at the top of its display; taller than the space above the band.
    AtDisplayTop,
    Correct(Correction),
}

/// What one enforcement tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTickReport {
    pub corrections: Vec<(ExternalWindowId, Correction)>,
    pub failed: Vec<ExternalWindowId>,
}

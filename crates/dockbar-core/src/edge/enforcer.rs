use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::types::{Correction, EdgeDecision, EdgeSettings, EdgeTickReport};
use crate::window::{
    DisplayId, DisplaySurface, ExternalWindowId, Point, Rect, WindowAttributeValue, WindowRecord,
    WindowService,
};

#[derive(Debug, Clone, Copy)]
struct FrameTrack {
    last_frame: Rect,
    observed_at: Instant,
}

/// Pushes foreign windows out of the reserved band.
///
/// A window is only touched after its frame has stayed put for the stability
/// duration, and at most once per rate-limit gap.
#[derive(Debug)]
pub struct EdgeEnforcer {
    settings: EdgeSettings,
    tracks: HashMap<ExternalWindowId, FrameTrack>,
    last_adjusted: HashMap<ExternalWindowId, Instant>,
}

impl EdgeEnforcer {
    pub fn new(settings: EdgeSettings) -> Self {
        Self {
            settings,
            tracks: HashMap::new(),
            last_adjusted: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.last_adjusted.clear();
    }

    fn intrudes(&self, frame: &Rect, band: &Rect) -> bool {
        frame.max_x() > band.min_x()
            && frame.min_x() < band.max_x()
            && frame.max_y() > band.min_y() + self.settings.min_intrusion
            && frame.min_y() < band.max_y()
    }

    /// Decide what to do about one window's current frame.
    pub fn evaluate(
        &mut self,
        id: ExternalWindowId,
        frame: Rect,
        surface: &DisplaySurface,
        now: Instant,
    ) -> EdgeDecision {
        if frame.is_degenerate() {
            return EdgeDecision::Degenerate;
        }

        let band = surface.reserved_band();
        if band.is_degenerate() || !self.intrudes(&frame, &band) {
            self.tracks.remove(&id);
            return EdgeDecision::NotIntruding;
        }

        match self.tracks.get_mut(&id) {
            None => {
                self.tracks.insert(
                    id,
                    FrameTrack {
                        last_frame: frame,
                        observed_at: now,
                    },
                );
                return EdgeDecision::Settling;
            }
            Some(track) if !track.last_frame.approx_eq(&frame, self.settings.frame_epsilon) => {
                track.last_frame = frame;
                track.observed_at = now;
                return EdgeDecision::Settling;
            }
            Some(track) if now.duration_since(track.observed_at) < self.settings.stability => {
                return EdgeDecision::Settling;
            }
            Some(_) => {}
        }

        if let Some(last) = self.last_adjusted.get(&id)
            && now.duration_since(*last) < self.settings.rate_limit
        {
            return EdgeDecision::RateLimited;
        }

        // Windows taller than the space above the band stop at the display top.
        let wanted = frame.min_y() - (frame.max_y() - band.min_y());
        let target_y = wanted.max(surface.bounds.min_y());
        let delta = frame.min_y() - target_y;
        if delta <= 0.0 {
            return EdgeDecision::AtDisplayTop;
        }

        EdgeDecision::Correct(Correction {
            from: frame,
            to: Point::new(frame.min_x(), target_y),
            delta,
        })
    }

    /// Record that a correction was attempted at `now`.
    pub fn mark_corrected(&mut self, id: ExternalWindowId, correction: &Correction, now: Instant) {
        self.last_adjusted.insert(id, now);
        self.tracks.insert(
            id,
            FrameTrack {
                last_frame: correction.corrected_frame(),
                observed_at: now,
            },
        );
    }

    /// Forget windows that are no longer published.
    pub fn prune(&mut self, live: &HashSet<ExternalWindowId>) {
        self.tracks.retain(|id, _| live.contains(id));
        self.last_adjusted.retain(|id, _| live.contains(id));
    }

    /// Run one enforcement pass over the records published this pass.
    ///
    /// Only records in `observed` carry a frame read by this pass; the rest
    /// are held over by vanish grace and are never touched. Minimized
    /// windows are skipped. Each window gets at most one write per tick.
    pub fn tick(
        &mut self,
        service: &dyn WindowService,
        records: &[WindowRecord],
        observed: &HashSet<ExternalWindowId>,
        surfaces: &HashMap<DisplayId, DisplaySurface>,
        now: Instant,
    ) -> EdgeTickReport {
        let mut report = EdgeTickReport::default();

        for record in records {
            if record.minimized || !observed.contains(&record.external_id) {
                self.tracks.remove(&record.external_id);
                continue;
            }
            let Some(surface) = surfaces.get(&record.display_id) else {
                continue;
            };

            let correction = match self.evaluate(record.external_id, record.frame, surface, now) {
                EdgeDecision::Correct(correction) => correction,
                EdgeDecision::AtDisplayTop => {
                    debug!(
                        event = "core.edge.correction_pinned",
                        window = %record.external_id,
                        height = record.frame.height
                    );
                    continue;
                }
                _ => continue,
            };

            self.mark_corrected(record.external_id, &correction, now);
            let position = WindowAttributeValue::Position(correction.to);
            match service.write_attribute(record.handle, position) {
                Ok(()) => {
                    info!(
                        event = "core.edge.correction_applied",
                        window = %record.external_id,
                        app = %record.owner_app_name,
                        delta = correction.delta,
                        y = correction.to.y
                    );
                    report.corrections.push((record.external_id, correction));
                }
                Err(e) => {
                    warn!(
                        event = "core.edge.correction_failed",
                        window = %record.external_id,
                        error = %e
                    );
                    report.failed.push(record.external_id);
                }
            }
        }

        let live: HashSet<ExternalWindowId> = records.iter().map(|r| r.external_id).collect();
        self.prune(&live);

        report
    }
}

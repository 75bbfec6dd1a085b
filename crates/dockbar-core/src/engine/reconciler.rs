//! The synchronous half of the engine: everything one reconciliation pass
//! does with a completed scan, owned exclusively by the coordinator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::types::{BandHeights, EngineOptions};
use crate::edge::{EdgeEnforcer, EdgeSettings, EdgeTickReport};
use crate::order::OrderKeeper;
use crate::pending::PendingOverlay;
use crate::scan::{CapabilityStatus, ScanOutcome};
use crate::stability::{LivenessEvidence, StabilityFilter, StabilitySettings};
use crate::window::{
    DisplayId, DisplayInfo, DisplaySurface, LocalId, ScanSnapshot, WindowRecord, WindowService,
};

/// What one pass produced.
#[derive(Debug, Default)]
pub struct PassResult {
    /// Set when the visible snapshot changed.
    pub published: Option<Arc<ScanSnapshot>>,
    /// Set when the capability status changed.
    pub status_changed: Option<CapabilityStatus>,
    pub edge: EdgeTickReport,
}

pub struct Reconciler {
    stability: StabilityFilter,
    order: OrderKeeper,
    pending: PendingOverlay,
    edge: EdgeEnforcer,
    edge_enabled: bool,
    band_heights: BandHeights,
    generation: u64,
    sequence: u64,
    /// Ordered records of the last pass before the overlay was applied.
    observed: Vec<WindowRecord>,
    basis: Arc<ScanSnapshot>,
    snapshot: Arc<ScanSnapshot>,
    surfaces: HashMap<DisplayId, DisplaySurface>,
    status: CapabilityStatus,
}

impl Reconciler {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            stability: StabilityFilter::new(StabilitySettings::from(&options.timings)),
            order: OrderKeeper::new(),
            pending: PendingOverlay::new(options.timings.pending_grace),
            edge: EdgeEnforcer::new(EdgeSettings::from(&options.timings)),
            edge_enabled: options.edge_guard,
            band_heights: options.band_heights.clone(),
            generation: 0,
            sequence: 0,
            observed: Vec::new(),
            basis: Arc::new(ScanSnapshot::default()),
            snapshot: Arc::new(ScanSnapshot::default()),
            surfaces: HashMap::new(),
            status: CapabilityStatus::Ready,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> Arc<ScanSnapshot> {
        self.snapshot.clone()
    }

    /// Observed state of the last pass, handed to the next scan.
    pub fn scan_basis(&self) -> Arc<ScanSnapshot> {
        self.basis.clone()
    }

    pub fn status(&self) -> &CapabilityStatus {
        &self.status
    }

    pub fn surfaces(&self) -> &HashMap<DisplayId, DisplaySurface> {
        &self.surfaces
    }

    pub fn band_heights(&self) -> &BandHeights {
        &self.band_heights
    }

    pub fn find(&self, local_id: &LocalId) -> Option<&WindowRecord> {
        self.snapshot.find(local_id)
    }

    /// Whether a toggle on this window is still waiting to converge.
    pub fn is_pending(&self, local_id: &LocalId, now: Instant) -> bool {
        self.find(local_id)
            .is_some_and(|r| self.pending.is_pending(&r.external_id, now))
    }

    /// Record an optimistic override for a published window. Returns false
    /// when the window is not published.
    pub fn record_toggle(
        &mut self,
        local_id: &LocalId,
        minimized: bool,
        is_main: bool,
        now: Instant,
    ) -> bool {
        let Some(record) = self.snapshot.find(local_id) else {
            return false;
        };
        let (id, handle) = (record.external_id, record.handle);
        self.pending.record_toggle(id, handle, minimized, is_main, now);
        true
    }

    /// Re-run the overlay over the last observed records and publish the
    /// result if it differs. Used right after a toggle.
    pub fn reapply_overlay(&mut self, now: Instant) -> Option<Arc<ScanSnapshot>> {
        let mut records = self.observed.clone();
        self.pending.apply(&mut records, now);
        self.publish_if_changed(records)
    }

    /// Drop all state and start a new generation. Results of scans started
    /// under the old generation must be discarded by the caller.
    pub fn reset(&mut self) -> Option<Arc<ScanSnapshot>> {
        self.generation += 1;
        info!(event = "core.engine.generation_started", generation = self.generation);
        self.clear_state();
        self.publish_if_changed(Vec::new())
    }

    fn clear_state(&mut self) {
        self.stability.clear();
        self.order.clear();
        self.pending.clear();
        self.edge.clear();
        self.observed.clear();
        self.basis = Arc::new(ScanSnapshot::empty(self.generation, 0));
    }

    fn update_status(&mut self, status: CapabilityStatus) -> Option<CapabilityStatus> {
        if status == self.status {
            return None;
        }
        match &status {
            CapabilityStatus::Ready => info!(event = "core.engine.capability_restored"),
            CapabilityStatus::Degraded { reason } => {
                warn!(event = "core.engine.capability_degraded", reason = %reason)
            }
        }
        self.status = status.clone();
        Some(status)
    }

    fn rebuild_surfaces(&mut self, displays: &[DisplayInfo]) {
        self.surfaces = displays
            .iter()
            .map(|d| {
                (
                    d.id,
                    DisplaySurface {
                        id: d.id,
                        bounds: d.bounds,
                        reserved_band_height: self.band_heights.height_for(d.id),
                    },
                )
            })
            .collect();
    }

    /// Scan -> stability -> order -> overlay -> publish -> edge, in that order.
    pub fn reconcile(
        &mut self,
        outcome: ScanOutcome,
        service: &dyn WindowService,
        now: Instant,
    ) -> PassResult {
        let mut result = PassResult {
            status_changed: self.update_status(outcome.capability.clone()),
            ..Default::default()
        };

        if !outcome.capability.is_ready() {
            self.clear_state();
            result.published = self.publish_if_changed(Vec::new());
            return result;
        }

        self.rebuild_surfaces(&outcome.displays);

        let evidence = LivenessEvidence {
            live_owners: &outcome.live_owners,
            confirmed_live: outcome.confirmed_live.as_ref(),
        };
        let stable = self.stability.apply(&outcome.candidates, evidence, now);
        let observed = stable.observed;
        let ordered = self.order.apply(stable.published);

        self.observed = ordered.clone();
        self.basis = Arc::new(ScanSnapshot {
            order: self.order.order().to_vec(),
            records: ordered.clone(),
            generation: self.generation,
            sequence: self.sequence,
        });

        let mut records = ordered;
        self.pending.apply(&mut records, now);
        result.published = self.publish_if_changed(records.clone());

        if self.edge_enabled {
            result.edge = self
                .edge
                .tick(service, &records, &observed, &self.surfaces, now);
        }

        result
    }

    fn publish_if_changed(&mut self, records: Vec<WindowRecord>) -> Option<Arc<ScanSnapshot>> {
        if !visibly_differs(&self.snapshot.records, &records) {
            return None;
        }
        self.sequence += 1;
        let snapshot = Arc::new(ScanSnapshot {
            order: records.iter().map(|r| r.external_id).collect(),
            records,
            generation: self.generation,
            sequence: self.sequence,
        });
        debug!(
            event = "core.engine.snapshot_published",
            generation = self.generation,
            sequence = self.sequence,
            windows = snapshot.len()
        );
        self.snapshot = snapshot.clone();
        Some(snapshot)
    }
}

/// Frame changes alone do not count: the presentation layer does not show them.
fn visibly_differs(old: &[WindowRecord], new: &[WindowRecord]) -> bool {
    old.len() != new.len()
        || old.iter().zip(new).any(|(a, b)| {
            a.external_id != b.external_id
                || a.local_id != b.local_id
                || a.title != b.title
                || a.minimized != b.minimized
                || a.is_main != b.is_main
                || a.display_id != b.display_id
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineTimings;
    use crate::scan::ScanEngine;
    use crate::window::fake::FakeWindowService;
    use crate::window::{ExternalWindowId, Rect};
    use std::time::Duration;

    struct Rig {
        service: Arc<FakeWindowService>,
        scanner: ScanEngine,
        reconciler: Reconciler,
        t0: Instant,
    }

    impl Rig {
        fn new() -> Self {
            let service = Arc::new(FakeWindowService::new());
            let scanner = ScanEngine::new(service.clone(), &[]);
            let reconciler = Reconciler::new(&EngineOptions::default());
            Self {
                service,
                scanner,
                reconciler,
                t0: Instant::now(),
            }
        }

        fn pass(&mut self, ms: u64) -> PassResult {
            let outcome = self.scanner.scan(&self.reconciler.scan_basis());
            let now = self.t0 + Duration::from_millis(ms);
            self.reconciler
                .reconcile(outcome, self.service.as_ref(), now)
        }
    }

    fn frame() -> Rect {
        Rect::new(100.0, 100.0, 800.0, 600.0)
    }

    #[test]
    fn test_window_published_after_appear_grace() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        rig.service.add_window(owner, 1, "Page", frame());

        assert!(rig.pass(0).published.is_none());
        assert!(rig.pass(120).published.is_none());
        let published = rig.pass(240).published.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published.records[0].title, "Page");
    }

    #[test]
    fn test_unchanged_pass_does_not_republish() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        let handle = rig.service.add_window(owner, 1, "Page", frame());
        rig.pass(0);
        rig.pass(200);
        assert!(rig.pass(320).published.is_none());

        rig.service
            .update_window(handle, |w| w.attrs.frame = Rect::new(5.0, 5.0, 800.0, 600.0));
        assert!(rig.pass(440).published.is_none());
    }

    #[test]
    fn test_capability_outage_and_recovery() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        rig.service.add_window(owner, 1, "Page", frame());
        rig.pass(0);
        rig.pass(200);
        assert_eq!(rig.reconciler.snapshot().len(), 1);

        rig.service.set_trusted(false);
        let result = rig.pass(320);
        assert!(matches!(result.status_changed, Some(CapabilityStatus::Degraded { .. })));
        assert!(result.published.unwrap().is_empty());
        for i in 0..5 {
            let result = rig.pass(440 + i * 120);
            assert!(result.status_changed.is_none());
            assert!(rig.reconciler.snapshot().is_empty());
        }

        rig.service.set_trusted(true);
        let timings = EngineTimings::default();
        let recovered_at = 1_100;
        let result = rig.pass(recovered_at);
        assert_eq!(result.status_changed, Some(CapabilityStatus::Ready));
        let deadline = recovered_at
            + (timings.scan_interval + timings.appear_grace).as_millis() as u64;
        rig.pass(deadline);
        assert_eq!(rig.reconciler.snapshot().len(), 1);
    }

    #[test]
    fn test_overlay_applies_on_top_of_order() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        rig.service.add_window(owner, 1, "A", frame());
        rig.service.add_window(owner, 2, "B", frame());
        rig.pass(0);
        rig.pass(200);
        let snapshot = rig.reconciler.snapshot();
        let b = snapshot.records[1].local_id;

        let now = rig.t0 + Duration::from_millis(250);
        assert!(rig.reconciler.record_toggle(&b, true, false, now));
        let published = rig.reconciler.reapply_overlay(now).unwrap();
        assert_eq!(published.records[1].local_id, b);
        assert!(published.records[1].minimized);
        assert!(!published.records[0].minimized);
        assert!(rig.reconciler.is_pending(&b, now));
    }

    #[test]
    fn test_reset_bumps_generation_and_clears() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        rig.service.add_window(owner, 1, "Page", frame());
        rig.pass(0);
        rig.pass(200);

        let published = rig.reconciler.reset().unwrap();
        assert!(published.is_empty());
        assert_eq!(published.generation, 1);
        assert_eq!(rig.reconciler.generation(), 1);
        assert!(rig.pass(300).published.is_none());
    }

    #[test]
    fn test_edge_runs_on_pass_records() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Pages");
        let intruding = Rect::new(100.0, 440.0, 800.0, 600.0);
        let handle = rig.service.add_window(owner, 1, "Report", intruding);
        rig.pass(0);
        rig.pass(200);
        let result = rig.pass(400);
        assert_eq!(result.edge.corrections.len(), 1);
        assert_eq!(rig.service.window(handle).unwrap().attrs.frame.y, 420.0);
    }

    #[test]
    fn test_edge_leaves_held_over_records_alone() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Pages");
        let start = Rect::new(250.0, 440.0, 800.0, 600.0);
        let handle = rig.service.add_window(owner, 1, "Report", start);

        // Dragged around inside the band, never stationary long enough.
        for (ms, y) in [(0u64, 440.0), (120, 445.0), (240, 450.0), (300, 455.0)] {
            let moved = Rect::new(250.0, y, 800.0, 600.0);
            rig.service.update_window(handle, |w| w.attrs.frame = moved);
            rig.pass(ms);
        }

        // Then dragged offscreen: scans stop reporting it, vanish grace keeps it.
        let offscreen = Rect::new(-4000.0, -4000.0, 800.0, 600.0);
        rig.service.update_window(handle, |w| w.attrs.frame = offscreen);
        for ms in [420u64, 540, 660] {
            let result = rig.pass(ms);
            assert!(result.edge.corrections.is_empty());
            assert_eq!(rig.reconciler.snapshot().len(), 1);
        }

        assert!(rig.service.writes().is_empty());
        assert_eq!(rig.service.window(handle).unwrap().attrs.frame, offscreen);
    }

    #[test]
    fn test_window_readded_after_vanish_goes_to_end() {
        let mut rig = Rig::new();
        let owner = rig.service.add_owner(100, "Safari");
        let a = rig.service.add_window(owner, 1, "A", frame());
        rig.service.add_window(owner, 2, "B", frame());
        let c = rig.service.add_window(owner, 3, "C", frame());
        let titles = |snapshot: &ScanSnapshot| -> Vec<String> {
            snapshot.records.iter().map(|r| r.title.clone()).collect()
        };

        rig.pass(0);
        rig.pass(200);
        let first = rig.reconciler.snapshot();
        assert_eq!(titles(&first), ["A", "B", "C"]);
        let first_a = first.records[0].local_id;

        // A leaves every display, C is closed.
        let offscreen = Rect::new(-4000.0, -4000.0, 800.0, 600.0);
        rig.service.update_window(a, |w| w.attrs.frame = offscreen);
        rig.service.remove_window(c);
        rig.pass(300);
        assert_eq!(titles(&rig.reconciler.snapshot()), ["A", "B", "C"]);
        rig.pass(800);
        assert_eq!(titles(&rig.reconciler.snapshot()), ["B"]);

        // A comes back; enumeration still lists it first.
        rig.service.update_window(a, |w| w.attrs.frame = frame());
        rig.pass(900);
        rig.pass(1100);
        let snapshot = rig.reconciler.snapshot();
        assert_eq!(titles(&snapshot), ["B", "A"]);
        assert_eq!(snapshot.order.last(), Some(&ExternalWindowId::new(owner, 1)));
        assert_ne!(snapshot.records[1].local_id, first_a);
    }

    #[test]
    fn test_edge_disabled() {
        let service = Arc::new(FakeWindowService::new());
        let scanner = ScanEngine::new(service.clone(), &[]);
        let options = EngineOptions {
            edge_guard: false,
            ..Default::default()
        };
        let mut reconciler = Reconciler::new(&options);
        let owner = service.add_owner(100, "Pages");
        service.add_window(owner, 1, "Report", Rect::new(100.0, 440.0, 800.0, 600.0));
        let t0 = Instant::now();
        for ms in [0u64, 200, 400, 600] {
            let outcome = scanner.scan(&reconciler.scan_basis());
            reconciler.reconcile(outcome, service.as_ref(), t0 + Duration::from_millis(ms));
        }
        assert!(service.writes().is_empty());
    }

    #[test]
    fn test_surfaces_carry_band_heights() {
        let service = Arc::new(FakeWindowService::new());
        let scanner = ScanEngine::new(service.clone(), &[]);
        let options = EngineOptions {
            band_heights: BandHeights::uniform(60.0).with_display(1, 44.0),
            ..Default::default()
        };
        let mut reconciler = Reconciler::new(&options);
        let outcome = scanner.scan(&reconciler.scan_basis());
        reconciler.reconcile(outcome, service.as_ref(), Instant::now());
        assert_eq!(reconciler.surfaces()[&1].reserved_band_height, 44.0);
    }
}

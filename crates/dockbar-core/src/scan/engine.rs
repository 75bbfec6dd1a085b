use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::identity::{HandleFacts, IdentityResolver, Resolution, ResolveContext};
use crate::window::{
    CandidateWindow, DisplayId, ExternalWindowId, ScanSnapshot, WindowService,
};

use super::display::{assign_display, is_visible};
use super::filter::EligibilityFilter;
use super::types::{CapabilityStatus, ScanOutcome, ScanStats};

/// Performs one full enumeration pass against the window service.
///
/// `scan` only reads from the service and the previous snapshot; it never
/// touches coordinator state and is safe to run on a blocking worker.
pub struct ScanEngine {
    service: Arc<dyn WindowService>,
    filter: EligibilityFilter,
    resolver: IdentityResolver,
}

impl ScanEngine {
    pub fn new(service: Arc<dyn WindowService>, excluded_apps: &[String]) -> Self {
        let filter = EligibilityFilter::new(service.host_pid(), excluded_apps);
        Self {
            service,
            filter,
            resolver: IdentityResolver::standard(),
        }
    }

    pub fn scan(&self, previous: &ScanSnapshot) -> ScanOutcome {
        let service = self.service.as_ref();

        if !service.is_trusted() {
            return ScanOutcome::degraded("accessibility permission not granted");
        }

        let displays = match service.displays() {
            Ok(displays) if !displays.is_empty() => displays,
            Ok(_) => return ScanOutcome::degraded("no displays reported"),
            Err(e) => return ScanOutcome::degraded(e.to_string()),
        };

        let owners = match service.list_running_owners() {
            Ok(owners) => owners,
            Err(e) => return ScanOutcome::degraded(e.to_string()),
        };

        let previous_display: HashMap<ExternalWindowId, DisplayId> = previous
            .records
            .iter()
            .map(|r| (r.external_id, r.display_id))
            .collect();

        let ctx = ResolveContext::new(service);
        let mut stats = ScanStats {
            owners: owners.len(),
            ..Default::default()
        };
        let mut live_owners = HashSet::new();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for owner in &owners {
            live_owners.insert(owner.id);
            if self.filter.owner_allowed(owner).is_err() {
                continue;
            }

            let handles = match service.list_top_level_windows(owner.id) {
                Ok(handles) => handles,
                Err(e) => {
                    debug!(
                        event = "core.scan.owner_skipped",
                        pid = owner.id.pid(),
                        app = %owner.name,
                        error = %e
                    );
                    continue;
                }
            };

            for handle in handles {
                stats.windows_seen += 1;

                let attrs = match service.read_attributes(handle) {
                    Ok(attrs) => attrs,
                    Err(e) => {
                        stats.unreadable += 1;
                        debug!(
                            event = "core.scan.window_unreadable",
                            pid = owner.id.pid(),
                            error = %e
                        );
                        continue;
                    }
                };

                if self.filter.window_allowed(&attrs).is_err() {
                    stats.rejected += 1;
                    continue;
                }

                let facts = HandleFacts {
                    owner: owner.id,
                    handle,
                    title: &attrs.title,
                    frame: attrs.frame,
                };
                let (external_id, identity_tier) = match self.resolver.resolve(&ctx, &facts) {
                    Resolution::Resolved { id, tier } => (id, tier),
                    Resolution::NotApplicable => {
                        stats.unresolved += 1;
                        continue;
                    }
                };

                if !attrs.minimized && !is_visible(&attrs.frame, &displays) {
                    stats.offscreen += 1;
                    continue;
                }

                let Some(display_id) = assign_display(
                    &attrs.frame,
                    &displays,
                    previous_display.get(&external_id).copied(),
                ) else {
                    continue;
                };

                if !seen.insert(external_id) {
                    stats.duplicates += 1;
                    continue;
                }

                candidates.push(CandidateWindow {
                    external_id,
                    identity_tier,
                    owner_app_name: owner.name.clone(),
                    title: attrs.title,
                    display_id,
                    minimized: attrs.minimized,
                    is_main: attrs.is_main,
                    frame: attrs.frame,
                    handle,
                });
            }
        }

        // A published minimized window missing from enumeration can only be
        // confirmed gone against the system-wide list.
        let needs_confirmation = previous
            .records
            .iter()
            .any(|r| r.minimized && !seen.contains(&r.external_id));
        if needs_confirmation {
            ctx.system_list();
        }
        stats.system_list_fetched = ctx.was_fetched();

        debug!(
            event = "core.scan.completed",
            candidates = candidates.len(),
            owners = stats.owners,
            windows_seen = stats.windows_seen,
            rejected = stats.rejected,
            unreadable = stats.unreadable,
            offscreen = stats.offscreen
        );

        ScanOutcome {
            candidates,
            live_owners,
            confirmed_live: ctx.confirmed_live_ids(),
            displays,
            capability: CapabilityStatus::Ready,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::fake::{FakeWindowService, HOST_PID};
    use crate::window::{
        DisplayInfo, IdentityTier, LocalId, OwnerId, Rect, SystemWindowEntry, WindowRecord,
    };

    fn engine(service: &Arc<FakeWindowService>) -> ScanEngine {
        ScanEngine::new(service.clone(), &[])
    }

    fn frame() -> Rect {
        Rect::new(100.0, 100.0, 800.0, 600.0)
    }

    #[test]
    fn test_untrusted_is_degraded_and_empty() {
        let service = Arc::new(FakeWindowService::new());
        let owner = service.add_owner(100, "Safari");
        service.add_window(owner, 1, "Page", frame());
        service.set_trusted(false);

        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert!(outcome.candidates.is_empty());
        assert!(!outcome.capability.is_ready());
    }

    #[test]
    fn test_enumeration_failure_is_degraded() {
        let service = Arc::new(FakeWindowService::new());
        service.set_enumeration_fails(true);
        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert!(matches!(outcome.capability, CapabilityStatus::Degraded { .. }));
    }

    #[test]
    fn test_filters_host_system_and_empty_titles() {
        let service = Arc::new(FakeWindowService::new());
        let host = service.add_owner(HOST_PID, "dockbar");
        let dock = service.add_owner(50, "Dock");
        let app = service.add_owner(100, "Safari");
        service.add_window(host, 1, "Bar", frame());
        service.add_window(dock, 2, "Dock", frame());
        service.add_window(app, 3, "", frame());
        let sheet = service.add_window(app, 4, "Save", frame());
        service.update_window(sheet, |w| w.attrs.subrole = Some("AXSheet".to_string()));
        service.add_window(app, 5, "Page", frame());

        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].title, "Page");
        assert_eq!(outcome.stats.rejected, 2);
        assert!(outcome.live_owners.contains(&host));
        assert!(outcome.live_owners.contains(&dock));
    }

    #[test]
    fn test_unreadable_window_skipped_without_aborting() {
        let service = Arc::new(FakeWindowService::new());
        let app = service.add_owner(100, "Safari");
        let broken = service.add_window(app, 1, "Broken", frame());
        service.update_window(broken, |w| w.readable = false);
        service.add_window(app, 2, "Fine", frame());

        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.stats.unreadable, 1);
    }

    #[test]
    fn test_offscreen_dropped_unless_minimized() {
        let service = Arc::new(FakeWindowService::new());
        let app = service.add_owner(100, "Finder");
        let offscreen = Rect::new(-4000.0, -4000.0, 300.0, 200.0);
        service.add_window(app, 1, "Away", offscreen);
        let minimized = service.add_window(app, 2, "Docked", offscreen);
        service.update_window(minimized, |w| w.attrs.minimized = true);

        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].title, "Docked");
        assert_eq!(outcome.candidates[0].display_id, 1);
        assert_eq!(outcome.stats.offscreen, 1);
    }

    #[test]
    fn test_display_assignment_follows_overlap() {
        let service = Arc::new(FakeWindowService::new());
        service.set_displays(vec![
            DisplayInfo {
                id: 1,
                bounds: Rect::new(0.0, 0.0, 1920.0, 1080.0),
                is_primary: true,
            },
            DisplayInfo {
                id: 2,
                bounds: Rect::new(1920.0, 0.0, 1920.0, 1080.0),
                is_primary: false,
            },
        ]);
        let app = service.add_owner(100, "Mail");
        service.add_window(app, 1, "Inbox", Rect::new(2000.0, 100.0, 800.0, 600.0));

        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert_eq!(outcome.candidates[0].display_id, 2);
    }

    #[test]
    fn test_no_system_list_fetch_when_native_numbers_available() {
        let service = Arc::new(FakeWindowService::new());
        let app = service.add_owner(100, "Safari");
        for i in 0..10 {
            service.add_window(app, i, &format!("tab {i}"), frame());
        }
        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert_eq!(outcome.candidates.len(), 10);
        assert!(outcome.candidates.iter().all(|c| c.identity_tier == IdentityTier::Native));
        assert_eq!(service.system_list_fetches(), 0);
        assert!(outcome.confirmed_live.is_none());
    }

    #[test]
    fn test_missing_minimized_window_triggers_one_list_fetch() {
        let service = Arc::new(FakeWindowService::new());
        let app = service.add_owner(100, "Notes");
        service.set_system_list(vec![SystemWindowEntry {
            owner: app,
            number: 9,
            frame: Rect::default(),
            title: None,
        }]);
        let previous = ScanSnapshot {
            records: vec![WindowRecord {
                local_id: LocalId::new(),
                external_id: ExternalWindowId::new(OwnerId(100), 9),
                identity_tier: IdentityTier::Native,
                owner_app_name: "Notes".to_string(),
                title: "Groceries".to_string(),
                display_id: 1,
                minimized: true,
                is_main: false,
                frame: frame(),
                handle: crate::window::WindowHandle(1),
            }],
            order: vec![ExternalWindowId::new(OwnerId(100), 9)],
            generation: 0,
            sequence: 1,
        };

        let outcome = engine(&service).scan(&previous);
        assert_eq!(service.system_list_fetches(), 1);
        let confirmed = outcome.confirmed_live.unwrap();
        assert!(confirmed.contains(&ExternalWindowId::new(OwnerId(100), 9)));
    }

    fn minimized_record(number: u64) -> ScanSnapshot {
        let id = ExternalWindowId::new(OwnerId(100), number);
        ScanSnapshot {
            records: vec![WindowRecord {
                local_id: LocalId::new(),
                external_id: id,
                identity_tier: IdentityTier::Native,
                owner_app_name: "Notes".to_string(),
                title: "Groceries".to_string(),
                display_id: 1,
                minimized: true,
                is_main: false,
                frame: frame(),
                handle: crate::window::WindowHandle(1),
            }],
            order: vec![id],
            generation: 0,
            sequence: 1,
        }
    }

    #[test]
    fn test_failed_system_list_confirms_nothing() {
        let service = Arc::new(FakeWindowService::new());
        service.add_owner(100, "Notes");
        service.set_system_list_fails(true);

        let outcome = engine(&service).scan(&minimized_record(9));
        assert_eq!(service.system_list_fetches(), 1);
        assert!(outcome.confirmed_live.is_none());
        assert!(outcome.capability.is_ready());
    }

    #[test]
    fn test_exited_owner_is_not_live() {
        let service = Arc::new(FakeWindowService::new());
        let notes = service.add_owner(100, "Notes");
        let mail = service.add_owner(200, "Mail");
        service.add_window(notes, 1, "Groceries", frame());
        service.add_window(mail, 2, "Inbox", frame());

        service.remove_owner(notes);
        let outcome = engine(&service).scan(&ScanSnapshot::default());
        assert!(!outcome.live_owners.contains(&notes));
        assert!(outcome.live_owners.contains(&mail));
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].owner_app_name, "Mail");
    }
}

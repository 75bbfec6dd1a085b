//! Pending-State Overlay.
//!
//! After a user toggle the affected window's `minimized`/`is_main` values are
//! forced to the optimistic post-toggle state for a grace period. The entry
//! is cleared early once a scan observes the same values, and always once the
//! grace period elapses, after which the observed state wins.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::window::{ExternalWindowId, WindowHandle, WindowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEntry {
    pub handle: WindowHandle,
    pub overridden_minimized: bool,
    pub overridden_is_main: bool,
    pub created_at: Instant,
}

impl PendingEntry {
    fn matches(&self, record: &WindowRecord) -> bool {
        record.minimized == self.overridden_minimized && record.is_main == self.overridden_is_main
    }
}

#[derive(Debug)]
pub struct PendingOverlay {
    grace: Duration,
    entries: HashMap<ExternalWindowId, PendingEntry>,
}

impl PendingOverlay {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            entries: HashMap::new(),
        }
    }

    pub fn record_toggle(
        &mut self,
        id: ExternalWindowId,
        handle: WindowHandle,
        minimized: bool,
        is_main: bool,
        now: Instant,
    ) {
        self.entries.insert(
            id,
            PendingEntry {
                handle,
                overridden_minimized: minimized,
                overridden_is_main: is_main,
                created_at: now,
            },
        );
    }

    /// Whether an unexpired override exists for `id`.
    pub fn is_pending(&self, id: &ExternalWindowId, now: Instant) -> bool {
        self.entries
            .get(id)
            .is_some_and(|e| now.duration_since(e.created_at) < self.grace)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Overlay the active overrides onto freshly observed records.
    pub fn apply(&mut self, records: &mut [WindowRecord], now: Instant) {
        let grace = self.grace;
        self.entries.retain(|id, entry| {
            let keep = now.duration_since(entry.created_at) < grace;
            if !keep {
                debug!(event = "core.pending.entry_expired", window = %id);
            }
            keep
        });
        self.entries
            .retain(|id, _| records.iter().any(|r| &r.external_id == id));

        for record in records.iter_mut() {
            let Some(entry) = self.entries.get(&record.external_id) else {
                continue;
            };
            if entry.matches(record) {
                debug!(event = "core.pending.entry_converged", window = %record.external_id);
                self.entries.remove(&record.external_id);
                continue;
            }
            record.minimized = entry.overridden_minimized;
            record.is_main = entry.overridden_is_main;
        }
    }
}

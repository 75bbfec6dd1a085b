//! Stability Filter: timestamp-based hysteresis over raw scan candidates.
//!
//! - A new identity is published only after it has been seen continuously
//!   for `appear_grace`. A single miss restarts the clock.
//! - A published identity survives absence for `vanish_grace`. Minimized
//!   windows are retained until the scan confirms they are gone.
//! - A title change is accepted after `title_confirm_cycles` identical
//!   consecutive sightings.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::EngineTimings;
use crate::window::{
    CandidateWindow, ExternalWindowId, IdentityTier, LocalId, OwnerId, WindowRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilitySettings {
    pub appear_grace: Duration,
    pub vanish_grace: Duration,
    pub title_confirm_cycles: u32,
}

impl From<&EngineTimings> for StabilitySettings {
    fn from(t: &EngineTimings) -> Self {
        Self {
            appear_grace: t.appear_grace,
            vanish_grace: t.vanish_grace,
            title_confirm_cycles: t.title_confirm_cycles.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PresenceState {
    first_observed_at: Instant,
    last_observed_at: Instant,
    consecutive_sightings: u32,
    consecutive_misses: u32,
}

#[derive(Debug, Clone)]
struct TitleCandidate {
    title: String,
    sightings: u32,
}

/// Liveness evidence from the scan that produced the candidates.
#[derive(Debug, Clone, Copy)]
pub struct LivenessEvidence<'a> {
    pub live_owners: &'a HashSet<OwnerId>,
    pub confirmed_live: Option<&'a HashSet<ExternalWindowId>>,
}

impl LivenessEvidence<'_> {
    /// A window is confirmed gone when its owner has exited, or when the
    /// system-wide list was consulted and does not contain it. Opaque
    /// identities never appear in that list and can only be confirmed by
    /// owner exit.
    fn confirms_gone(&self, id: &ExternalWindowId, tier: IdentityTier) -> bool {
        if !self.live_owners.contains(&id.owner()) {
            return true;
        }
        if tier == IdentityTier::Opaque {
            return false;
        }
        self.confirmed_live.is_some_and(|live| !live.contains(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilityOutput {
    /// Present windows in candidate order, then retained absent ones.
    pub published: Vec<WindowRecord>,
    /// Identities seen in this pass's candidates. Published records outside
    /// this set carry the frame of an earlier scan.
    pub observed: HashSet<ExternalWindowId>,
    pub added: Vec<ExternalWindowId>,
    pub removed: Vec<ExternalWindowId>,
}

pub struct StabilityFilter {
    settings: StabilitySettings,
    presence: HashMap<ExternalWindowId, PresenceState>,
    published: HashMap<ExternalWindowId, WindowRecord>,
    title_candidates: HashMap<ExternalWindowId, TitleCandidate>,
}

impl StabilityFilter {
    pub fn new(settings: StabilitySettings) -> Self {
        Self {
            settings,
            presence: HashMap::new(),
            published: HashMap::new(),
            title_candidates: HashMap::new(),
        }
    }

    /// Forget everything. The next scan starts from scratch.
    pub fn clear(&mut self) {
        self.presence.clear();
        self.published.clear();
        self.title_candidates.clear();
    }

    pub fn apply(
        &mut self,
        candidates: &[CandidateWindow],
        evidence: LivenessEvidence<'_>,
        now: Instant,
    ) -> StabilityOutput {
        let present: HashSet<ExternalWindowId> = candidates.iter().map(|c| c.external_id).collect();
        let mut output = StabilityOutput {
            observed: present.clone(),
            ..Default::default()
        };

        for candidate in candidates {
            let id = candidate.external_id;
            let presence = self
                .presence
                .entry(id)
                .and_modify(|p| {
                    p.last_observed_at = now;
                    p.consecutive_sightings += 1;
                    p.consecutive_misses = 0;
                })
                .or_insert(PresenceState {
                    first_observed_at: now,
                    last_observed_at: now,
                    consecutive_sightings: 1,
                    consecutive_misses: 0,
                });
            let first_observed_at = presence.first_observed_at;

            if self.published.contains_key(&id) {
                let title = self.debounce_title(id, &candidate.title);
                if let Some(record) = self.published.get_mut(&id) {
                    record.identity_tier = candidate.identity_tier;
                    record.owner_app_name.clone_from(&candidate.owner_app_name);
                    record.display_id = candidate.display_id;
                    record.minimized = candidate.minimized;
                    record.is_main = candidate.is_main;
                    record.frame = candidate.frame;
                    record.handle = candidate.handle;
                    if let Some(title) = title {
                        record.title = title;
                    }
                    output.published.push(record.clone());
                }
            } else if now.duration_since(first_observed_at) >= self.settings.appear_grace {
                let record = WindowRecord::from_candidate(LocalId::new(), candidate.clone());
                info!(
                    event = "core.stability.window_published",
                    window = %id,
                    app = %record.owner_app_name,
                    tier = %record.identity_tier
                );
                self.title_candidates.remove(&id);
                self.published.insert(id, record.clone());
                output.added.push(id);
                output.published.push(record);
            }
        }

        let absent: Vec<ExternalWindowId> = self
            .presence
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();

        for id in absent {
            let Some(record) = self.published.get(&id) else {
                // Never published: any miss restarts the appear clock.
                self.presence.remove(&id);
                continue;
            };

            let retain_minimized =
                record.minimized && !evidence.confirms_gone(&id, record.identity_tier);

            let Some(presence) = self.presence.get_mut(&id) else {
                continue;
            };
            presence.consecutive_misses += 1;
            presence.consecutive_sightings = 0;

            if retain_minimized {
                presence.last_observed_at = now;
                output.published.push(record.clone());
                continue;
            }

            if now.duration_since(presence.last_observed_at) > self.settings.vanish_grace {
                info!(
                    event = "core.stability.window_removed",
                    window = %id,
                    app = %record.owner_app_name,
                    misses = presence.consecutive_misses
                );
                self.presence.remove(&id);
                self.published.remove(&id);
                self.title_candidates.remove(&id);
                output.removed.push(id);
            } else {
                output.published.push(record.clone());
            }
        }

        output
    }

    /// Returns the title to publish when a change is confirmed.
    fn debounce_title(&mut self, id: ExternalWindowId, observed: &str) -> Option<String> {
        let current = self.published.get(&id).map(|r| r.title.as_str());
        if current == Some(observed) {
            self.title_candidates.remove(&id);
            return None;
        }

        let candidate = self
            .title_candidates
            .entry(id)
            .or_insert_with(|| TitleCandidate {
                title: observed.to_string(),
                sightings: 0,
            });
        if candidate.title != observed {
            candidate.title = observed.to_string();
            candidate.sightings = 0;
        }
        candidate.sightings += 1;

        if candidate.sightings >= self.settings.title_confirm_cycles {
            self.title_candidates.remove(&id);
            return Some(observed.to_string());
        }
        None
    }
}

use std::collections::HashSet;

use serde::Serialize;

use crate::window::{CandidateWindow, DisplayInfo, ExternalWindowId, OwnerId};

/// Whether the window capability is usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapabilityStatus {
    Ready,
    Degraded { reason: String },
}

impl CapabilityStatus {
    pub fn degraded(reason: impl Into<String>) -> Self {
        CapabilityStatus::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CapabilityStatus::Ready)
    }
}

/// Counters for one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub owners: usize,
    pub windows_seen: usize,
    pub unreadable: usize,
    pub rejected: usize,
    pub unresolved: usize,
    pub offscreen: usize,
    pub duplicates: usize,
    pub system_list_fetched: bool,
}

/// Result of one full enumeration pass, handed to the coordinator whole.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub candidates: Vec<CandidateWindow>,
    /// Every running owner, eligible or not.
    pub live_owners: HashSet<OwnerId>,
    /// Identities seen in the system-wide list, when it was fetched.
    pub confirmed_live: Option<HashSet<ExternalWindowId>>,
    pub displays: Vec<DisplayInfo>,
    pub capability: CapabilityStatus,
    pub stats: ScanStats,
}

impl ScanOutcome {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            candidates: Vec::new(),
            live_owners: HashSet::new(),
            confirmed_live: None,
            displays: Vec::new(),
            capability: CapabilityStatus::degraded(reason),
            stats: ScanStats::default(),
        }
    }
}

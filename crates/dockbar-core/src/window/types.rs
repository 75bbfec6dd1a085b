use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::geometry::Rect;

/// Display identifier as reported by the platform.
pub type DisplayId = u32;

/// Identifies a running application by process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OwnerId(pub i32);

impl OwnerId {
    pub fn pid(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cross-scan identity of an external window: owning process plus the
/// platform's window number. Unique within a live session only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExternalWindowId {
    pub pid: i32,
    pub number: u64,
}

impl ExternalWindowId {
    pub fn new(owner: OwnerId, number: u64) -> Self {
        Self {
            pid: owner.0,
            number,
        }
    }

    pub fn owner(&self) -> OwnerId {
        OwnerId(self.pid)
    }
}

impl fmt::Display for ExternalWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.number)
    }
}

/// How an [`ExternalWindowId`] was obtained, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityTier {
    /// Window number read directly from the handle.
    Native,
    /// Matched against the batched system-wide window list.
    WindowList,
    /// Derived from the process-local handle. May change when the owning
    /// app recreates its window internally.
    Opaque,
}

impl IdentityTier {
    pub fn is_degraded(&self) -> bool {
        matches!(self, IdentityTier::Opaque)
    }
}

impl fmt::Display for IdentityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentityTier::Native => "native",
            IdentityTier::WindowList => "window_list",
            IdentityTier::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Opaque reference to a live window, issued by the window service and
/// used for attribute reads/writes. Only meaningful to the service that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// UI-stable identifier, generated once per published window and reused for
/// as long as its [`ExternalWindowId`] stays published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LocalId(Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A window that passed eligibility filtering and identity resolution in one
/// scan pass. Not yet subject to hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateWindow {
    pub external_id: ExternalWindowId,
    pub identity_tier: IdentityTier,
    pub owner_app_name: String,
    pub title: String,
    pub display_id: DisplayId,
    pub minimized: bool,
    pub is_main: bool,
    pub frame: Rect,
    #[serde(skip)]
    pub handle: WindowHandle,
}

/// A published window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRecord {
    pub local_id: LocalId,
    pub external_id: ExternalWindowId,
    pub identity_tier: IdentityTier,
    pub owner_app_name: String,
    pub title: String,
    pub display_id: DisplayId,
    pub minimized: bool,
    pub is_main: bool,
    pub frame: Rect,
    #[serde(skip)]
    pub handle: WindowHandle,
}

impl WindowRecord {
    pub fn from_candidate(local_id: LocalId, candidate: CandidateWindow) -> Self {
        Self {
            local_id,
            external_id: candidate.external_id,
            identity_tier: candidate.identity_tier,
            owner_app_name: candidate.owner_app_name,
            title: candidate.title,
            display_id: candidate.display_id,
            minimized: candidate.minimized,
            is_main: candidate.is_main,
            frame: candidate.frame,
            handle: candidate.handle,
        }
    }
}

/// A display as reported by the window service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub bounds: Rect,
    pub is_primary: bool,
}

/// A display together with the height of the band reserved for the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplaySurface {
    pub id: DisplayId,
    pub bounds: Rect,
    pub reserved_band_height: f64,
}

impl DisplaySurface {
    /// The rectangle along the bottom edge of the display owned by the bar.
    pub fn reserved_band(&self) -> Rect {
        let height = self.reserved_band_height.min(self.bounds.height).max(0.0);
        Rect::new(
            self.bounds.x,
            self.bounds.max_y() - height,
            self.bounds.width,
            height,
        )
    }
}

/// An immutable, ordered view of the published windows.
///
/// A new snapshot is built for every published change; readers hold an
/// `Arc<ScanSnapshot>` and never observe a partially updated list.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ScanSnapshot {
    pub records: Vec<WindowRecord>,
    pub order: Vec<ExternalWindowId>,
    pub generation: u64,
    pub sequence: u64,
}

impl ScanSnapshot {
    pub fn empty(generation: u64, sequence: u64) -> Self {
        Self {
            records: Vec::new(),
            order: Vec::new(),
            generation,
            sequence,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, local_id: &LocalId) -> Option<&WindowRecord> {
        self.records.iter().find(|r| &r.local_id == local_id)
    }

    pub fn find_external(&self, id: &ExternalWindowId) -> Option<&WindowRecord> {
        self.records.iter().find(|r| &r.external_id == id)
    }
}

use crate::window::{ExternalWindowId, IdentityTier, OwnerId, Rect, WindowHandle};

/// What a strategy knows about the window it is asked to resolve.
#[derive(Debug, Clone, Copy)]
pub struct HandleFacts<'a> {
    pub owner: OwnerId,
    pub handle: WindowHandle,
    pub title: &'a str,
    pub frame: Rect,
}

/// Typed outcome of one resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        id: ExternalWindowId,
        tier: IdentityTier,
    },
    NotApplicable,
}

impl Resolution {
    pub fn resolved(id: ExternalWindowId, tier: IdentityTier) -> Self {
        Resolution::Resolved { id, tier }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

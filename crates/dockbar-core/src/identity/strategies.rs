//! Identity resolution strategies, strongest first.

use crate::window::{ExternalWindowId, IdentityTier};

use super::context::ResolveContext;
use super::types::{HandleFacts, Resolution};

/// Set on window numbers derived from a handle so they cannot collide with
/// real platform window numbers of the same process.
pub const OPAQUE_NUMBER_FLAG: u64 = 1 << 63;

/// Frame tolerance, in points, when matching against the system list.
pub const DEFAULT_FRAME_EPSILON: f64 = 4.0;

/// One tier of the identity fallback table.
pub trait ResolveStrategy: Send + Sync {
    fn tier(&self) -> IdentityTier;

    fn resolve(&self, ctx: &ResolveContext<'_>, facts: &HandleFacts<'_>) -> Resolution;
}

/// Reads the platform window number directly off the handle.
#[derive(Debug, Default)]
pub struct NativeNumberStrategy;

impl ResolveStrategy for NativeNumberStrategy {
    fn tier(&self) -> IdentityTier {
        IdentityTier::Native
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, facts: &HandleFacts<'_>) -> Resolution {
        match ctx.service().native_window_number(facts.handle) {
            Some(number) => Resolution::resolved(
                ExternalWindowId::new(facts.owner, number),
                IdentityTier::Native,
            ),
            None => Resolution::NotApplicable,
        }
    }
}

/// Matches the window against the batched system-wide window list: first by
/// owner and approximate frame, then by owner and exact title.
#[derive(Debug)]
pub struct WindowListMatchStrategy {
    epsilon: f64,
}

impl WindowListMatchStrategy {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Default for WindowListMatchStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_EPSILON)
    }
}

impl ResolveStrategy for WindowListMatchStrategy {
    fn tier(&self) -> IdentityTier {
        IdentityTier::WindowList
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, facts: &HandleFacts<'_>) -> Resolution {
        let Some(entries) = ctx.system_list() else {
            return Resolution::NotApplicable;
        };

        let unclaimed = || {
            entries.iter().filter(|e| {
                e.owner == facts.owner
                    && !ctx.is_claimed(&ExternalWindowId::new(e.owner, e.number))
            })
        };

        let by_frame = unclaimed().find(|e| e.frame.approx_eq(&facts.frame, self.epsilon));
        let matched = by_frame.or_else(|| {
            if facts.title.is_empty() {
                return None;
            }
            unclaimed().find(|e| e.title.as_deref() == Some(facts.title))
        });

        match matched {
            Some(entry) => Resolution::resolved(
                ExternalWindowId::new(entry.owner, entry.number),
                IdentityTier::WindowList,
            ),
            None => Resolution::NotApplicable,
        }
    }
}

/// Derives an identity from the handle itself. Always applies.
#[derive(Debug, Default)]
pub struct OpaqueHandleStrategy;

impl ResolveStrategy for OpaqueHandleStrategy {
    fn tier(&self) -> IdentityTier {
        IdentityTier::Opaque
    }

    fn resolve(&self, _ctx: &ResolveContext<'_>, facts: &HandleFacts<'_>) -> Resolution {
        Resolution::resolved(
            ExternalWindowId::new(facts.owner, facts.handle.raw() | OPAQUE_NUMBER_FLAG),
            IdentityTier::Opaque,
        )
    }
}

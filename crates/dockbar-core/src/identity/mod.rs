//! Cross-scan identity resolution.
//!
//! Resolution walks an ordered table of strategies and takes the first one
//! that applies. The tier that produced the id travels with it so degraded
//! identities stay visible to diagnostics.

pub mod context;
pub mod strategies;
pub mod types;

pub use context::ResolveContext;
pub use strategies::{
    NativeNumberStrategy, OPAQUE_NUMBER_FLAG, OpaqueHandleStrategy, ResolveStrategy,
    WindowListMatchStrategy,
};
pub use types::{HandleFacts, Resolution};

use tracing::debug;

pub struct IdentityResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl IdentityResolver {
    /// Native number, then system-list match, then opaque handle.
    pub fn standard() -> Self {
        Self::with_strategies(vec![
            Box::new(NativeNumberStrategy),
            Box::new(WindowListMatchStrategy::default()),
            Box::new(OpaqueHandleStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve one window. An id already handed out in this pass is never
    /// returned twice.
    pub fn resolve(&self, ctx: &ResolveContext<'_>, facts: &HandleFacts<'_>) -> Resolution {
        for strategy in &self.strategies {
            if let Resolution::Resolved { id, tier } = strategy.resolve(ctx, facts) {
                if ctx.is_claimed(&id) {
                    debug!(
                        event = "core.identity.claimed_skipped",
                        window = %id,
                        tier = %strategy.tier()
                    );
                    continue;
                }
                ctx.claim(id);
                if tier.is_degraded() {
                    debug!(
                        event = "core.identity.opaque_fallback",
                        pid = facts.owner.pid(),
                        title = facts.title
                    );
                }
                return Resolution::Resolved { id, tier };
            }
        }
        Resolution::NotApplicable
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::standard()
    }
}

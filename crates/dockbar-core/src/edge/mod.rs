//! Edge Enforcer: keeps foreign windows out of the reserved band.

pub mod enforcer;
pub mod types;

pub use enforcer::EdgeEnforcer;
pub use types::{Correction, EdgeDecision, EdgeSettings, EdgeTickReport};

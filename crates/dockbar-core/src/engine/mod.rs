//! The reconciliation engine: one coordinating task that merges timer ticks
//! and OS notifications into scan passes and publishes ordered snapshots.

mod coordinator;
pub mod errors;
pub mod handle;
pub mod reconciler;
pub mod types;

pub use errors::EngineError;
pub use handle::EngineHandle;
pub use reconciler::{PassResult, Reconciler};
pub use types::{BandHeights, EngineCommand, EngineNotice, EngineOptions};

pub use crate::scan::CapabilityStatus;

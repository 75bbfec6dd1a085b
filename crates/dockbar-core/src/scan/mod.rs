//! Scan Engine: one enumeration pass producing candidate windows.

pub mod display;
pub mod engine;
pub mod filter;
pub mod gate;
pub mod types;

pub use display::{assign_display, is_visible, primary_display};
pub use engine::ScanEngine;
pub use filter::{EligibilityFilter, Rejection, SYSTEM_OWNER_NAMES};
pub use gate::{ScanGate, ScanPermit};
pub use types::{CapabilityStatus, ScanOutcome, ScanStats};

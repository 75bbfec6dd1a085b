//! dockbar-core: window-state reconciliation engine for a per-display taskbar
//!
//! Turns the racy, permission-gated view of other applications' windows that
//! the OS offers into a stable, ordered, per-display list of windows, and
//! carries out user actions (minimize, restore, focus, close) on them.
//!
//! # Main Entry Points
//!
//! - [`engine`] - Start the coordinator and observe published snapshots
//! - [`scan`] - One raw scan pass (no hysteresis)
//! - [`actions`] - Fallback chains for window actions
//! - [`config`] - Configuration management
//! - [`platform`] - The platform [`WindowService`] backend

pub mod actions;
pub mod config;
pub mod edge;
pub mod engine;
pub mod errors;
pub mod events;
pub mod identity;
pub mod logging;
pub mod order;
pub mod pending;
pub mod platform;
pub mod process;
pub mod scan;
pub mod stability;
pub mod view;
pub mod window;

// Re-export commonly used types at crate root for convenience
pub use config::{DockbarConfig, EngineTimings};
pub use engine::{
    BandHeights, CapabilityStatus, EngineError, EngineHandle, EngineNotice, EngineOptions,
};
pub use errors::{ConfigError, DockbarError};
pub use scan::{ScanEngine, ScanOutcome};
pub use window::{
    CandidateWindow, DisplayId, ExternalWindowId, IdentityTier, LocalId, ScanSnapshot,
    WindowRecord, WindowService, WindowServiceError,
};

// Re-export logging initialization
pub use logging::init_logging;

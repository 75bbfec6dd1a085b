//! Window data model and the platform window-service contract.

pub mod errors;
pub mod geometry;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use errors::WindowServiceError;
pub use geometry::{Point, Rect};
pub use service::{
    ControlKind, EventSink, OwnerInfo, Subscription, SystemWindowEntry, WindowAttributeValue,
    WindowAttributes, WindowEvent, WindowEventKind, WindowService,
};
pub use types::{
    CandidateWindow, DisplayId, DisplayInfo, DisplaySurface, ExternalWindowId, IdentityTier,
    LocalId, OwnerId, ScanSnapshot, WindowHandle, WindowRecord,
};

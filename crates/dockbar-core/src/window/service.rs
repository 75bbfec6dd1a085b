//! The contract between the reconciliation engine and the platform window layer.

use tokio::sync::mpsc;

use super::errors::WindowServiceError;
use super::geometry::{Point, Rect};
use super::types::{DisplayInfo, OwnerId, WindowHandle};

/// A running application that may own windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerInfo {
    pub id: OwnerId,
    pub name: String,
}

/// Attributes of one window, read in a single call.
///
/// `role` and `subrole` are `None` when the owning application does not
/// answer for them.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAttributes {
    pub title: String,
    pub role: Option<String>,
    pub subrole: Option<String>,
    pub frame: Rect,
    pub minimized: bool,
    pub is_main: bool,
}

/// One row of the batched system-wide window list.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemWindowEntry {
    pub owner: OwnerId,
    pub number: u64,
    pub frame: Rect,
    pub title: Option<String>,
}

/// A writable window attribute together with its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowAttributeValue {
    Minimized(bool),
    Main(bool),
    Position(Point),
}

impl WindowAttributeValue {
    pub fn name(&self) -> &'static str {
        match self {
            WindowAttributeValue::Minimized(_) => "minimized",
            WindowAttributeValue::Main(_) => "main",
            WindowAttributeValue::Position(_) => "position",
        }
    }
}

/// Title-bar controls the engine may press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Minimize,
    Close,
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Minimize => "minimize",
            ControlKind::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    Created,
    Destroyed,
    FocusChanged,
    TitleChanged,
}

impl WindowEventKind {
    pub const ALL: [WindowEventKind; 4] = [
        WindowEventKind::Created,
        WindowEventKind::Destroyed,
        WindowEventKind::FocusChanged,
        WindowEventKind::TitleChanged,
    ];
}

/// An asynchronous notification raised by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvent {
    pub owner: OwnerId,
    pub kind: WindowEventKind,
}

/// Where the service delivers notifications. Senders are cheap to clone and
/// usable from any thread.
pub type EventSink = mpsc::UnboundedSender<WindowEvent>;

/// A live notification subscription. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Platform window capability.
///
/// Every call is synchronous and expected to return quickly. The engine calls
/// enumeration methods from a blocking worker and action methods from its
/// coordinator.
pub trait WindowService: Send + Sync {
    /// Whether the process currently holds the accessibility permission.
    fn is_trusted(&self) -> bool;

    /// Ask the platform to prompt for the permission. Returns the trust state
    /// after the request.
    fn request_trust(&self) -> bool {
        self.is_trusted()
    }

    /// Process id of the host process, whose own windows are never listed.
    fn host_pid(&self) -> i32 {
        std::process::id() as i32
    }

    fn list_running_owners(&self) -> Result<Vec<OwnerInfo>, WindowServiceError>;

    fn list_top_level_windows(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<WindowHandle>, WindowServiceError>;

    fn read_attributes(&self, handle: WindowHandle)
    -> Result<WindowAttributes, WindowServiceError>;

    /// The platform window number carried directly on the handle, if any.
    fn native_window_number(&self, handle: WindowHandle) -> Option<u64>;

    fn write_attribute(
        &self,
        handle: WindowHandle,
        value: WindowAttributeValue,
    ) -> Result<(), WindowServiceError>;

    fn invoke_control(
        &self,
        handle: WindowHandle,
        control: ControlKind,
    ) -> Result<(), WindowServiceError>;

    /// Minimize the window of `owner` titled `title` through a scripted
    /// path outside the accessibility API. Fails rather than guessing when
    /// the title cannot address the window.
    fn scripted_minimize(&self, owner: OwnerId, title: &str) -> Result<(), WindowServiceError>;

    /// Ask the owning application to bring itself forward.
    fn activate_owner(&self, owner: OwnerId) -> Result<(), WindowServiceError>;

    /// Terminate the owning process. `expected_name` guards against the pid
    /// having been reused by an unrelated process.
    fn terminate_owner(&self, owner: OwnerId, expected_name: &str)
    -> Result<(), WindowServiceError>;

    fn subscribe(
        &self,
        owner: OwnerId,
        kinds: &[WindowEventKind],
        sink: EventSink,
    ) -> Result<Subscription, WindowServiceError>;

    /// One batched fetch of every on-screen window known to the system.
    fn system_wide_window_list(&self) -> Result<Vec<SystemWindowEntry>, WindowServiceError>;

    fn displays(&self) -> Result<Vec<DisplayInfo>, WindowServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_subscription_cancels_on_drop() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let sub = Subscription::new(move || flag.store(true, Ordering::SeqCst));
        assert!(!cancelled.load(Ordering::SeqCst));
        drop(sub);
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_subscription_cancel_runs_once() {
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = count.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

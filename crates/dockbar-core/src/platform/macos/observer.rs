//! AXObserver subscriptions. Each subscription owns a thread running a
//! CFRunLoop that delivers the observer's callbacks.

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use accessibility_sys::{
    AXObserverAddNotification, AXObserverCreate, AXObserverGetRunLoopSource, AXObserverRef,
    AXObserverRemoveNotification, AXUIElementRef, kAXErrorSuccess,
};
use core_foundation::base::{CFRelease, CFTypeRef, TCFType};
use core_foundation::runloop::{CFRunLoop, CFRunLoopSource, kCFRunLoopDefaultMode};
use core_foundation::string::{CFString, CFStringRef};
use tracing::debug;

use super::ax::AxElement;
use crate::window::{
    EventSink, OwnerId, Subscription, WindowEvent, WindowEventKind, WindowServiceError,
};

/// How often the observer thread checks for cancellation.
const RUN_LOOP_SLICE: Duration = Duration::from_millis(250);

// Window destruction is only reported on the window element itself; app-level
// registration catches the application going away, and the periodic scan
// catches closed windows.
fn notification_name(kind: WindowEventKind) -> &'static str {
    match kind {
        WindowEventKind::Created => "AXWindowCreated",
        WindowEventKind::Destroyed => "AXUIElementDestroyed",
        WindowEventKind::FocusChanged => "AXFocusedWindowChanged",
        WindowEventKind::TitleChanged => "AXTitleChanged",
    }
}

fn kind_for_notification(name: &str) -> Option<WindowEventKind> {
    WindowEventKind::ALL
        .into_iter()
        .find(|kind| notification_name(*kind) == name)
}

struct ObserverContext {
    owner: OwnerId,
    sink: EventSink,
}

unsafe extern "C" fn observer_callback(
    _observer: AXObserverRef,
    _element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() || notification.is_null() {
        return;
    }
    // SAFETY: refcon is the ObserverContext leaked for this observer's
    // lifetime; notification is borrowed for the duration of the callback.
    let context = unsafe { &*(refcon as *const ObserverContext) };
    let name = unsafe { CFString::wrap_under_get_rule(notification) }.to_string();
    if let Some(kind) = kind_for_notification(&name) {
        let _ = context.sink.send(WindowEvent {
            owner: context.owner,
            kind,
        });
    }
}

pub(super) fn subscribe(
    owner: OwnerId,
    kinds: &[WindowEventKind],
    sink: EventSink,
) -> Result<Subscription, WindowServiceError> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let kinds = kinds.to_vec();
    let flag = cancelled.clone();

    thread::Builder::new()
        .name(format!("dockbar-ax-observer-{}", owner.pid()))
        .spawn(move || run_observer(owner, &kinds, sink, &flag, ready_tx))
        .map_err(|e| WindowServiceError::SubscriptionFailed {
            pid: owner.pid(),
            reason: e.to_string(),
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(Subscription::new(move || {
            cancelled.store(true, Ordering::Release);
        })),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(WindowServiceError::SubscriptionFailed {
            pid: owner.pid(),
            reason: "observer thread exited before starting".to_string(),
        }),
    }
}

fn run_observer(
    owner: OwnerId,
    kinds: &[WindowEventKind],
    sink: EventSink,
    cancelled: &AtomicBool,
    ready: std_mpsc::Sender<Result<(), WindowServiceError>>,
) {
    let fail = |reason: String| WindowServiceError::SubscriptionFailed {
        pid: owner.pid(),
        reason,
    };

    let Some(app) = AxElement::application(owner.pid()) else {
        let _ = ready.send(Err(fail("no application element".to_string())));
        return;
    };

    let mut observer: AXObserverRef = ptr::null_mut();
    // SAFETY: AXObserverCreate writes a +1 observer on success.
    let result = unsafe { AXObserverCreate(owner.pid(), observer_callback, &mut observer) };
    if result != kAXErrorSuccess || observer.is_null() {
        let _ = ready.send(Err(fail(format!("AXObserverCreate failed: {}", result))));
        return;
    }

    let refcon = Box::into_raw(Box::new(ObserverContext { owner, sink })) as *mut c_void;

    let mut registered: Vec<CFString> = Vec::new();
    for kind in kinds {
        let name = CFString::new(notification_name(*kind));
        // SAFETY: observer, app and refcon stay valid until teardown below.
        let result = unsafe {
            AXObserverAddNotification(observer, app.as_raw(), name.as_concrete_TypeRef(), refcon)
        };
        if result == kAXErrorSuccess {
            registered.push(name);
        }
    }

    if registered.is_empty() {
        // SAFETY: nothing registered; reclaim the context and the observer.
        unsafe {
            drop(Box::from_raw(refcon as *mut ObserverContext));
            CFRelease(observer as CFTypeRef);
        }
        let _ = ready.send(Err(fail("no notification could be registered".to_string())));
        return;
    }

    // SAFETY: the run loop source is owned by the observer (Get Rule).
    let source =
        unsafe { CFRunLoopSource::wrap_under_get_rule(AXObserverGetRunLoopSource(observer)) };
    let run_loop = CFRunLoop::get_current();
    let mode = unsafe { kCFRunLoopDefaultMode };
    run_loop.add_source(&source, mode);
    let _ = ready.send(Ok(()));

    debug!(
        event = "core.platform.observer_started",
        pid = owner.pid(),
        notifications = registered.len()
    );

    // SAFETY: refcon outlives the loop; only read here for the sink.
    let context = unsafe { &*(refcon as *const ObserverContext) };
    while !cancelled.load(Ordering::Acquire) && !context.sink.is_closed() {
        CFRunLoop::run_in_mode(mode, RUN_LOOP_SLICE, true);
    }

    run_loop.remove_source(&source, mode);
    for name in &registered {
        // SAFETY: same observer/element pair the notification was added on.
        unsafe {
            AXObserverRemoveNotification(observer, app.as_raw(), name.as_concrete_TypeRef());
        }
    }
    drop(source);
    // SAFETY: no callback can run once the source is removed and the loop
    // has returned.
    unsafe {
        CFRelease(observer as CFTypeRef);
        drop(Box::from_raw(refcon as *mut ObserverContext));
    }

    debug!(event = "core.platform.observer_stopped", pid = owner.pid());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_names_round_trip() {
        for kind in WindowEventKind::ALL {
            assert_eq!(kind_for_notification(notification_name(kind)), Some(kind));
        }
        assert_eq!(kind_for_notification("AXMoved"), None);
    }
}

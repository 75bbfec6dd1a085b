//! Scriptable in-memory [`WindowService`] used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::errors::WindowServiceError;
use super::geometry::Rect;
use super::service::{
    ControlKind, EventSink, OwnerInfo, Subscription, SystemWindowEntry, WindowAttributeValue,
    WindowAttributes, WindowEvent, WindowEventKind, WindowService,
};
use super::types::{DisplayInfo, OwnerId, WindowHandle};

pub(crate) const HOST_PID: i32 = 1;

#[derive(Debug, Clone)]
pub(crate) struct FakeWindow {
    pub owner: OwnerId,
    pub handle: WindowHandle,
    pub native_number: Option<u64>,
    pub attrs: WindowAttributes,
    /// Attribute reads fail when false.
    pub readable: bool,
    /// Whether the window shows up in per-owner enumeration.
    pub listed: bool,
}

#[derive(Default)]
struct FakeState {
    trusted: bool,
    owners: Vec<OwnerInfo>,
    windows: Vec<FakeWindow>,
    system_list: Vec<SystemWindowEntry>,
    displays: Vec<DisplayInfo>,
    failing_writes: Vec<&'static str>,
    failing_controls: Vec<ControlKind>,
    script_fails: bool,
    activate_fails: bool,
    enumeration_fails: bool,
    system_list_fails: bool,
    subscribers: HashMap<u64, (OwnerId, EventSink)>,
    next_subscription: u64,
    writes: Vec<(WindowHandle, WindowAttributeValue)>,
    controls: Vec<(WindowHandle, ControlKind)>,
    scripts: Vec<OwnerId>,
    activations: Vec<OwnerId>,
    terminations: Vec<OwnerId>,
}

pub(crate) struct FakeWindowService {
    state: Arc<Mutex<FakeState>>,
    next_handle: AtomicUsize,
    system_list_fetches: AtomicUsize,
    scans_in_flight: AtomicUsize,
    max_scans_in_flight: AtomicUsize,
    scan_calls: AtomicUsize,
    scan_delay: Mutex<Option<Duration>>,
}

impl FakeWindowService {
    /// A trusted service with one 1920x1080 primary display (id 1).
    pub fn new() -> Self {
        let state = FakeState {
            trusted: true,
            displays: vec![DisplayInfo {
                id: 1,
                bounds: Rect::new(0.0, 0.0, 1920.0, 1080.0),
                is_primary: true,
            }],
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            next_handle: AtomicUsize::new(1000),
            system_list_fetches: AtomicUsize::new(0),
            scans_in_flight: AtomicUsize::new(0),
            max_scans_in_flight: AtomicUsize::new(0),
            scan_calls: AtomicUsize::new(0),
            scan_delay: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_owner(&self, pid: i32, name: &str) -> OwnerId {
        let id = OwnerId(pid);
        self.state().owners.push(OwnerInfo {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn remove_owner(&self, owner: OwnerId) {
        let mut state = self.state();
        state.owners.retain(|o| o.id != owner);
        state.windows.retain(|w| w.owner != owner);
    }

    /// Adds a standard, readable, listed window with a native window number.
    pub fn add_window(
        &self,
        owner: OwnerId,
        number: u64,
        title: &str,
        frame: Rect,
    ) -> WindowHandle {
        let handle = WindowHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) as u64);
        self.state().windows.push(FakeWindow {
            owner,
            handle,
            native_number: Some(number),
            attrs: WindowAttributes {
                title: title.to_string(),
                role: Some("AXWindow".to_string()),
                subrole: Some("AXStandardWindow".to_string()),
                frame,
                minimized: false,
                is_main: false,
            },
            readable: true,
            listed: true,
        });
        handle
    }

    pub fn update_window(&self, handle: WindowHandle, update: impl FnOnce(&mut FakeWindow)) {
        let mut state = self.state();
        if let Some(window) = state.windows.iter_mut().find(|w| w.handle == handle) {
            update(window);
        }
    }

    pub fn window(&self, handle: WindowHandle) -> Option<FakeWindow> {
        self.state()
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .cloned()
    }

    pub fn remove_window(&self, handle: WindowHandle) {
        self.state().windows.retain(|w| w.handle != handle);
    }

    pub fn set_trusted(&self, trusted: bool) {
        self.state().trusted = trusted;
    }

    pub fn set_system_list(&self, entries: Vec<SystemWindowEntry>) {
        self.state().system_list = entries;
    }

    pub fn set_displays(&self, displays: Vec<DisplayInfo>) {
        self.state().displays = displays;
    }

    pub fn fail_writes_of(&self, attribute: &'static str) {
        self.state().failing_writes.push(attribute);
    }

    pub fn fail_control(&self, control: ControlKind) {
        self.state().failing_controls.push(control);
    }

    pub fn fail_scripts(&self) {
        self.state().script_fails = true;
    }

    pub fn fail_activation(&self) {
        self.state().activate_fails = true;
    }

    pub fn set_enumeration_fails(&self, fails: bool) {
        self.state().enumeration_fails = fails;
    }

    pub fn set_system_list_fails(&self, fails: bool) {
        self.state().system_list_fails = fails;
    }

    /// Makes every owner enumeration block for `delay`, to hold scans in flight.
    pub fn set_scan_delay(&self, delay: Duration) {
        *self.scan_delay.lock().unwrap() = Some(delay);
    }

    pub fn writes(&self) -> Vec<(WindowHandle, WindowAttributeValue)> {
        self.state().writes.clone()
    }

    pub fn controls(&self) -> Vec<(WindowHandle, ControlKind)> {
        self.state().controls.clone()
    }

    pub fn scripts(&self) -> Vec<OwnerId> {
        self.state().scripts.clone()
    }

    pub fn activations(&self) -> Vec<OwnerId> {
        self.state().activations.clone()
    }

    pub fn terminations(&self) -> Vec<OwnerId> {
        self.state().terminations.clone()
    }

    pub fn system_list_fetches(&self) -> usize {
        self.system_list_fetches.load(Ordering::SeqCst)
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_scans(&self) -> usize {
        self.max_scans_in_flight.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Delivers a notification to every subscriber of `owner`.
    pub fn emit(&self, owner: OwnerId, kind: WindowEventKind) {
        let state = self.state();
        for (subscribed_owner, sink) in state.subscribers.values() {
            if *subscribed_owner == owner {
                let _ = sink.send(WindowEvent { owner, kind });
            }
        }
    }
}

impl WindowService for FakeWindowService {
    fn is_trusted(&self) -> bool {
        self.state().trusted
    }

    fn host_pid(&self) -> i32 {
        HOST_PID
    }

    fn list_running_owners(&self) -> Result<Vec<OwnerInfo>, WindowServiceError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.scans_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_scans_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.scan_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let result = {
            let state = self.state();
            if state.enumeration_fails {
                Err(WindowServiceError::EnumerationFailed {
                    reason: "injected".to_string(),
                })
            } else {
                Ok(state.owners.clone())
            }
        };
        self.scans_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn list_top_level_windows(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<WindowHandle>, WindowServiceError> {
        let state = self.state();
        if !state.owners.iter().any(|o| o.id == owner) {
            return Err(WindowServiceError::OwnerUnavailable { pid: owner.0 });
        }
        Ok(state
            .windows
            .iter()
            .filter(|w| w.owner == owner && w.listed)
            .map(|w| w.handle)
            .collect())
    }

    fn read_attributes(
        &self,
        handle: WindowHandle,
    ) -> Result<WindowAttributes, WindowServiceError> {
        let state = self.state();
        let window = state
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or(WindowServiceError::HandleStale { handle: handle.0 })?;
        if !window.readable {
            return Err(WindowServiceError::AttributeRead {
                attribute: "title".to_string(),
                reason: "injected".to_string(),
            });
        }
        Ok(window.attrs.clone())
    }

    fn native_window_number(&self, handle: WindowHandle) -> Option<u64> {
        self.state()
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .and_then(|w| w.native_number)
    }

    fn write_attribute(
        &self,
        handle: WindowHandle,
        value: WindowAttributeValue,
    ) -> Result<(), WindowServiceError> {
        let mut state = self.state();
        state.writes.push((handle, value));
        if state.failing_writes.contains(&value.name()) {
            return Err(WindowServiceError::AttributeWrite {
                attribute: value.name().to_string(),
                reason: "injected".to_string(),
            });
        }
        let window = state
            .windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or(WindowServiceError::HandleStale { handle: handle.0 })?;
        match value {
            WindowAttributeValue::Minimized(m) => window.attrs.minimized = m,
            WindowAttributeValue::Main(m) => window.attrs.is_main = m,
            WindowAttributeValue::Position(p) => {
                window.attrs.frame = window.attrs.frame.with_origin(p)
            }
        }
        Ok(())
    }

    fn invoke_control(
        &self,
        handle: WindowHandle,
        control: ControlKind,
    ) -> Result<(), WindowServiceError> {
        let mut state = self.state();
        state.controls.push((handle, control));
        if state.failing_controls.contains(&control) {
            return Err(WindowServiceError::ControlUnavailable {
                control: control.name().to_string(),
            });
        }
        match control {
            ControlKind::Minimize => {
                if let Some(window) = state.windows.iter_mut().find(|w| w.handle == handle) {
                    window.attrs.minimized = true;
                }
            }
            ControlKind::Close => state.windows.retain(|w| w.handle != handle),
        }
        Ok(())
    }

    fn scripted_minimize(&self, owner: OwnerId, title: &str) -> Result<(), WindowServiceError> {
        let mut state = self.state();
        state.scripts.push(owner);
        if state.script_fails {
            return Err(WindowServiceError::ScriptFailed {
                reason: "injected".to_string(),
            });
        }
        if let Some(window) = state
            .windows
            .iter_mut()
            .find(|w| w.owner == owner && w.attrs.title == title)
        {
            window.attrs.minimized = true;
            return Ok(());
        }
        Err(WindowServiceError::ScriptFailed {
            reason: format!("no window titled '{}'", title),
        })
    }

    fn activate_owner(&self, owner: OwnerId) -> Result<(), WindowServiceError> {
        let mut state = self.state();
        state.activations.push(owner);
        if state.activate_fails {
            return Err(WindowServiceError::ScriptFailed {
                reason: "injected".to_string(),
            });
        }
        Ok(())
    }

    fn terminate_owner(
        &self,
        owner: OwnerId,
        _expected_name: &str,
    ) -> Result<(), WindowServiceError> {
        let mut state = self.state();
        state.terminations.push(owner);
        state.owners.retain(|o| o.id != owner);
        state.windows.retain(|w| w.owner != owner);
        Ok(())
    }

    fn subscribe(
        &self,
        owner: OwnerId,
        _kinds: &[WindowEventKind],
        sink: EventSink,
    ) -> Result<Subscription, WindowServiceError> {
        let id = {
            let mut state = self.state();
            let id = state.next_subscription;
            state.next_subscription += 1;
            state.subscribers.insert(id, (owner, sink));
            id
        };
        let shared = self.state.clone();
        Ok(Subscription::new(move || {
            if let Ok(mut state) = shared.lock() {
                state.subscribers.remove(&id);
            }
        }))
    }

    fn system_wide_window_list(&self) -> Result<Vec<SystemWindowEntry>, WindowServiceError> {
        self.system_list_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.system_list_fails {
            return Err(WindowServiceError::EnumerationFailed {
                reason: "injected".to_string(),
            });
        }
        Ok(state.system_list.clone())
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, WindowServiceError> {
        Ok(self.state().displays.clone())
    }
}

//! [`WindowService`] on top of the macOS Accessibility API.
//!
//! Per-owner enumeration and attribute access go through AXUIElement;
//! the batched window list and display geometry come from CoreGraphics via
//! `xcap`; scripted fallbacks run through `osascript`.

mod apps;
mod ax;
mod observer;
mod script;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use core_graphics::geometry::CGPoint;
use tracing::{debug, warn};

use self::ax::{AxElement, is_gone, read_error, write_error};
use crate::process::{self, ProcessError};
use crate::window::{
    ControlKind, DisplayInfo, EventSink, OwnerId, OwnerInfo, Rect, Subscription,
    SystemWindowEntry, WindowAttributeValue, WindowAttributes, WindowEventKind, WindowHandle,
    WindowService, WindowServiceError,
};

struct RegisteredWindow {
    owner: OwnerId,
    element: AxElement,
}

/// Maps opaque [`WindowHandle`]s to retained AX elements. The same UI
/// element always gets the same handle while it stays registered.
#[derive(Default)]
struct HandleRegistry {
    next: u64,
    windows: HashMap<u64, RegisteredWindow>,
}

impl HandleRegistry {
    fn intern(&mut self, owner: OwnerId, element: AxElement) -> WindowHandle {
        if let Some((raw, _)) = self
            .windows
            .iter()
            .find(|(_, w)| w.owner == owner && w.element.same_element(&element))
        {
            return WindowHandle(*raw);
        }
        self.next += 1;
        self.windows
            .insert(self.next, RegisteredWindow { owner, element });
        WindowHandle(self.next)
    }

    /// Forget handles of `owner` that were not seen in its latest listing.
    fn retain_listed(&mut self, owner: OwnerId, listed: &HashSet<u64>) {
        self.windows
            .retain(|raw, w| w.owner != owner || listed.contains(raw));
    }

    fn retain_owners(&mut self, live: &HashSet<OwnerId>) {
        self.windows.retain(|_, w| live.contains(&w.owner));
    }
}

pub struct AxWindowService {
    registry: Mutex<HandleRegistry>,
}

impl AxWindowService {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HandleRegistry::default()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HandleRegistry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn element(&self, handle: WindowHandle) -> Result<AxElement, WindowServiceError> {
        self.registry()
            .windows
            .get(&handle.raw())
            .map(|w| w.element.clone())
            .ok_or(WindowServiceError::HandleStale {
                handle: handle.raw(),
            })
    }

    fn application(owner: OwnerId) -> Result<AxElement, WindowServiceError> {
        AxElement::application(owner.pid())
            .ok_or(WindowServiceError::OwnerUnavailable { pid: owner.pid() })
    }

    fn frame_of(element: &AxElement) -> Result<Rect, WindowServiceError> {
        let origin = element
            .point(ax::ATTR_POSITION)
            .map_err(|code| read_error(ax::ATTR_POSITION, code))?;
        let size = element
            .size(ax::ATTR_SIZE)
            .map_err(|code| read_error(ax::ATTR_SIZE, code))?;
        Ok(Rect::new(origin.x, origin.y, size.width, size.height))
    }
}

impl Default for AxWindowService {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowService for AxWindowService {
    fn is_trusted(&self) -> bool {
        ax::is_process_trusted()
    }

    fn request_trust(&self) -> bool {
        ax::request_process_trust()
    }

    fn list_running_owners(&self) -> Result<Vec<OwnerInfo>, WindowServiceError> {
        if !self.is_trusted() {
            return Err(WindowServiceError::CapabilityUnavailable);
        }
        let owners = apps::running_applications();
        let live: HashSet<OwnerId> = owners.iter().map(|o| o.id).collect();
        self.registry().retain_owners(&live);
        Ok(owners)
    }

    fn list_top_level_windows(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<WindowHandle>, WindowServiceError> {
        let app = Self::application(owner)?;
        let elements = match app.children(ax::ATTR_WINDOWS) {
            Ok(elements) => elements,
            Err(code) if is_gone(code) => {
                return Err(WindowServiceError::OwnerUnavailable { pid: owner.pid() });
            }
            Err(code) => return Err(read_error(ax::ATTR_WINDOWS, code)),
        };

        let mut registry = self.registry();
        let handles: Vec<WindowHandle> = elements
            .into_iter()
            .map(|element| registry.intern(owner, element))
            .collect();
        let listed: HashSet<u64> = handles.iter().map(|h| h.raw()).collect();
        registry.retain_listed(owner, &listed);
        Ok(handles)
    }

    fn read_attributes(
        &self,
        handle: WindowHandle,
    ) -> Result<WindowAttributes, WindowServiceError> {
        let element = self.element(handle)?;
        let stale = |code| {
            if is_gone(code) {
                WindowServiceError::HandleStale {
                    handle: handle.raw(),
                }
            } else {
                read_error(ax::ATTR_TITLE, code)
            }
        };

        let title = element.string(ax::ATTR_TITLE).map_err(stale)?;
        let frame = Self::frame_of(&element)?;
        // Role information is optional; an unanswered query is not a rejection.
        let role = element.string(ax::ATTR_ROLE).ok().flatten();
        let subrole = element.string(ax::ATTR_SUBROLE).ok().flatten();
        let minimized = element
            .boolean(ax::ATTR_MINIMIZED)
            .ok()
            .flatten()
            .unwrap_or(false);
        let is_main = element
            .boolean(ax::ATTR_MAIN)
            .ok()
            .flatten()
            .unwrap_or(false);

        Ok(WindowAttributes {
            title: title.unwrap_or_default(),
            role,
            subrole,
            frame,
            minimized,
            is_main,
        })
    }

    fn native_window_number(&self, handle: WindowHandle) -> Option<u64> {
        self.element(handle)
            .ok()?
            .window_number()
            .map(u64::from)
    }

    fn write_attribute(
        &self,
        handle: WindowHandle,
        value: WindowAttributeValue,
    ) -> Result<(), WindowServiceError> {
        let element = self.element(handle)?;
        let (attribute, result) = match value {
            WindowAttributeValue::Minimized(minimized) => (
                ax::ATTR_MINIMIZED,
                element.set_bool(ax::ATTR_MINIMIZED, minimized),
            ),
            WindowAttributeValue::Main(main) => {
                (ax::ATTR_MAIN, element.set_bool(ax::ATTR_MAIN, main))
            }
            WindowAttributeValue::Position(point) => (
                ax::ATTR_POSITION,
                element.set_point(ax::ATTR_POSITION, CGPoint::new(point.x, point.y)),
            ),
        };
        result.map_err(|code| write_error(attribute, code))
    }

    fn invoke_control(
        &self,
        handle: WindowHandle,
        control: ControlKind,
    ) -> Result<(), WindowServiceError> {
        let element = self.element(handle)?;
        let attribute = match control {
            ControlKind::Minimize => ax::ATTR_MINIMIZE_BUTTON,
            ControlKind::Close => ax::ATTR_CLOSE_BUTTON,
        };
        let button = element
            .child(attribute)
            .map_err(|_| WindowServiceError::ControlUnavailable {
                control: control.name().to_string(),
            })?;
        button
            .perform(ax::ACTION_PRESS)
            .map_err(|code| WindowServiceError::ControlFailed {
                control: control.name().to_string(),
                reason: format!("AXError {}", code),
            })
    }

    fn scripted_minimize(&self, owner: OwnerId, title: &str) -> Result<(), WindowServiceError> {
        let script = script::minimize_script(owner.pid(), title).ok_or_else(|| {
            WindowServiceError::ScriptFailed {
                reason: "window has no title to address".to_string(),
            }
        })?;
        script::run(&script, owner.pid())
    }

    fn activate_owner(&self, owner: OwnerId) -> Result<(), WindowServiceError> {
        script::run(&script::activate_script(owner.pid()), owner.pid())
    }

    fn terminate_owner(
        &self,
        owner: OwnerId,
        expected_name: &str,
    ) -> Result<(), WindowServiceError> {
        process::terminate_process(owner.pid(), expected_name).map_err(|e| match e {
            ProcessError::NotFound { .. } => {
                WindowServiceError::OwnerUnavailable { pid: owner.pid() }
            }
            other => WindowServiceError::ProcessTermination {
                pid: owner.pid(),
                message: other.to_string(),
            },
        })
    }

    fn subscribe(
        &self,
        owner: OwnerId,
        kinds: &[WindowEventKind],
        sink: EventSink,
    ) -> Result<Subscription, WindowServiceError> {
        observer::subscribe(owner, kinds, sink)
    }

    fn system_wide_window_list(&self) -> Result<Vec<SystemWindowEntry>, WindowServiceError> {
        let windows = xcap::Window::all().map_err(|e| WindowServiceError::EnumerationFailed {
            reason: e.to_string(),
        })?;

        let mut skipped = 0usize;
        let entries: Vec<SystemWindowEntry> = windows
            .into_iter()
            .filter_map(|w| {
                let entry = (|| {
                    let pid = i32::try_from(w.pid().ok()?).ok()?;
                    Some(SystemWindowEntry {
                        owner: OwnerId(pid),
                        number: u64::from(w.id().ok()?),
                        frame: Rect::new(
                            f64::from(w.x().ok()?),
                            f64::from(w.y().ok()?),
                            f64::from(w.width().ok()?),
                            f64::from(w.height().ok()?),
                        ),
                        title: w.title().ok().filter(|t| !t.is_empty()),
                    })
                })();
                if entry.is_none() {
                    skipped += 1;
                }
                entry
            })
            .collect();

        debug!(
            event = "core.platform.window_list_completed",
            count = entries.len(),
            skipped = skipped
        );
        Ok(entries)
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, WindowServiceError> {
        let monitors = xcap::Monitor::all().map_err(|e| WindowServiceError::EnumerationFailed {
            reason: e.to_string(),
        })?;

        let displays: Vec<DisplayInfo> = monitors
            .into_iter()
            .filter_map(|m| {
                let display = (|| {
                    Some(DisplayInfo {
                        id: m.id().ok()?,
                        bounds: Rect::new(
                            f64::from(m.x().ok()?),
                            f64::from(m.y().ok()?),
                            f64::from(m.width().ok()?),
                            f64::from(m.height().ok()?),
                        ),
                        is_primary: m.is_primary().unwrap_or(false),
                    })
                })();
                if display.is_none() {
                    warn!(event = "core.platform.display_skipped");
                }
                display
            })
            .collect();
        Ok(displays)
    }
}

//! Thin ownership wrapper over `AXUIElementRef` plus typed attribute access.

use std::ffi::c_void;
use std::ptr;

use accessibility_sys::{
    AXError, AXUIElementCopyAttributeValue, AXUIElementCreateApplication,
    AXUIElementPerformAction, AXUIElementRef, AXUIElementSetAttributeValue,
    AXUIElementSetMessagingTimeout, AXValueCreate, AXValueGetValue, AXValueRef,
    kAXErrorAPIDisabled, kAXErrorCannotComplete, kAXErrorInvalidUIElement, kAXErrorNoValue,
    kAXErrorSuccess, kAXValueTypeCGPoint, kAXValueTypeCGSize,
};
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFEqual, CFRelease, CFRetain, CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::CFString;
use core_graphics::geometry::{CGPoint, CGSize};

use crate::window::WindowServiceError;

/// Timeout for AX messaging (seconds). A hung application must not stall a
/// whole scan.
const AX_MESSAGING_TIMEOUT: f32 = 0.25;

pub(super) const ATTR_WINDOWS: &str = "AXWindows";
pub(super) const ATTR_TITLE: &str = "AXTitle";
pub(super) const ATTR_ROLE: &str = "AXRole";
pub(super) const ATTR_SUBROLE: &str = "AXSubrole";
pub(super) const ATTR_POSITION: &str = "AXPosition";
pub(super) const ATTR_SIZE: &str = "AXSize";
pub(super) const ATTR_MINIMIZED: &str = "AXMinimized";
pub(super) const ATTR_MAIN: &str = "AXMain";
pub(super) const ATTR_MINIMIZE_BUTTON: &str = "AXMinimizeButton";
pub(super) const ATTR_CLOSE_BUTTON: &str = "AXCloseButton";
pub(super) const ACTION_PRESS: &str = "AXPress";

// SAFETY: FFI declarations from the macOS ApplicationServices framework.
// `_AXUIElementGetWindow` is private but stable since 10.6; it fails with an
// AXError rather than crashing when the element is not a window.
#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    fn _AXUIElementGetWindow(element: AXUIElementRef, window_id: *mut u32) -> AXError;
}

pub(super) fn is_process_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

/// Shows the system permission prompt if the process is not yet trusted.
pub(super) fn request_process_trust() -> bool {
    let key = CFString::new("AXTrustedCheckOptionPrompt");
    let value = CFBoolean::true_value();
    let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);
    unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
}

/// Map an AX failure onto the service error taxonomy.
pub(super) fn read_error(attribute: &str, code: AXError) -> WindowServiceError {
    match code {
        kAXErrorAPIDisabled => WindowServiceError::CapabilityUnavailable,
        _ => WindowServiceError::AttributeRead {
            attribute: attribute.to_string(),
            reason: format!("AXError {}", code),
        },
    }
}

pub(super) fn write_error(attribute: &str, code: AXError) -> WindowServiceError {
    match code {
        kAXErrorAPIDisabled => WindowServiceError::CapabilityUnavailable,
        _ => WindowServiceError::AttributeWrite {
            attribute: attribute.to_string(),
            reason: format!("AXError {}", code),
        },
    }
}

pub(super) fn is_gone(code: AXError) -> bool {
    code == kAXErrorInvalidUIElement || code == kAXErrorCannotComplete
}

/// An owned (+1 retained) accessibility element.
pub(super) struct AxElement(AXUIElementRef);

// SAFETY: AXUIElementRef is an immutable CF object; the AX API may be called
// from any thread.
unsafe impl Send for AxElement {}
unsafe impl Sync for AxElement {}

impl AxElement {
    /// The application element for `pid`.
    pub fn application(pid: i32) -> Option<Self> {
        // SAFETY: AXUIElementCreateApplication returns a +1 retained element.
        let raw = unsafe { AXUIElementCreateApplication(pid) };
        if raw.is_null() {
            return None;
        }
        // SAFETY: raw is a valid element we own.
        unsafe {
            AXUIElementSetMessagingTimeout(raw, AX_MESSAGING_TIMEOUT);
        }
        Some(Self(raw))
    }

    /// Take a +1 reference to an element borrowed from a CF container.
    ///
    /// # Safety
    /// `raw` must be a valid `AXUIElementRef`.
    unsafe fn retain(raw: AXUIElementRef) -> Self {
        unsafe {
            CFRetain(raw as CFTypeRef);
        }
        Self(raw)
    }

    pub fn as_raw(&self) -> AXUIElementRef {
        self.0
    }

    /// Whether both wrappers refer to the same UI element.
    pub fn same_element(&self, other: &AxElement) -> bool {
        // SAFETY: both refs are valid for the lifetime of the wrappers.
        unsafe { CFEqual(self.0 as CFTypeRef, other.0 as CFTypeRef) != 0 }
    }

    fn copy(&self, attribute: &str) -> Result<CFType, AXError> {
        let cf_attr = CFString::new(attribute);
        let mut value: CFTypeRef = ptr::null();
        // SAFETY: Copy Rule, value is +1 retained on success.
        let result = unsafe {
            AXUIElementCopyAttributeValue(self.0, cf_attr.as_concrete_TypeRef(), &mut value)
        };
        if result != kAXErrorSuccess {
            return Err(result);
        }
        if value.is_null() {
            return Err(kAXErrorNoValue);
        }
        // SAFETY: value is +1 retained; wrap_under_create_rule takes ownership.
        Ok(unsafe { CFType::wrap_under_create_rule(value) })
    }

    pub fn string(&self, attribute: &str) -> Result<Option<String>, AXError> {
        match self.copy(attribute) {
            Ok(value) => Ok(value.downcast::<CFString>().map(|s| s.to_string())),
            Err(code) if code == kAXErrorNoValue => Ok(None),
            Err(code) => Err(code),
        }
    }

    pub fn boolean(&self, attribute: &str) -> Result<Option<bool>, AXError> {
        match self.copy(attribute) {
            Ok(value) => Ok(value.downcast::<CFBoolean>().map(bool::from)),
            Err(code) if code == kAXErrorNoValue => Ok(None),
            Err(code) => Err(code),
        }
    }

    pub fn child(&self, attribute: &str) -> Result<AxElement, AXError> {
        let value = self.copy(attribute)?;
        // SAFETY: element-valued attributes hold AXUIElementRefs; retain ours
        // before the CFType drops its reference.
        Ok(unsafe { AxElement::retain(value.as_CFTypeRef() as AXUIElementRef) })
    }

    pub fn children(&self, attribute: &str) -> Result<Vec<AxElement>, AXError> {
        let value = match self.copy(attribute) {
            Ok(value) => value,
            Err(code) if code == kAXErrorNoValue => return Ok(Vec::new()),
            Err(code) => return Err(code),
        };
        // SAFETY: array-valued attributes hold a CFArray of AXUIElementRefs.
        // get_rule balances the retain held by `value`.
        let array: CFArray<CFType> =
            unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
        Ok(array
            .iter()
            .map(|item| unsafe { AxElement::retain(item.as_CFTypeRef() as AXUIElementRef) })
            .collect())
    }

    pub fn point(&self, attribute: &str) -> Result<CGPoint, AXError> {
        let value = self.copy(attribute)?;
        let mut point = CGPoint::new(0.0, 0.0);
        // SAFETY: AXPosition holds an AXValue of type CGPoint.
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef() as AXValueRef,
                kAXValueTypeCGPoint,
                &mut point as *mut CGPoint as *mut c_void,
            )
        };
        if ok { Ok(point) } else { Err(kAXErrorNoValue) }
    }

    pub fn size(&self, attribute: &str) -> Result<CGSize, AXError> {
        let value = self.copy(attribute)?;
        let mut size = CGSize::new(0.0, 0.0);
        // SAFETY: AXSize holds an AXValue of type CGSize.
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef() as AXValueRef,
                kAXValueTypeCGSize,
                &mut size as *mut CGSize as *mut c_void,
            )
        };
        if ok { Ok(size) } else { Err(kAXErrorNoValue) }
    }

    pub fn set_bool(&self, attribute: &str, value: bool) -> Result<(), AXError> {
        let cf_attr = CFString::new(attribute);
        let cf_value = if value {
            CFBoolean::true_value()
        } else {
            CFBoolean::false_value()
        };
        // SAFETY: setting a boolean attribute on a valid element.
        let result = unsafe {
            AXUIElementSetAttributeValue(
                self.0,
                cf_attr.as_concrete_TypeRef(),
                cf_value.as_CFTypeRef(),
            )
        };
        if result == kAXErrorSuccess { Ok(()) } else { Err(result) }
    }

    pub fn set_point(&self, attribute: &str, point: CGPoint) -> Result<(), AXError> {
        let cf_attr = CFString::new(attribute);
        // SAFETY: AXValueCreate copies the point and returns a +1 AXValue.
        let raw = unsafe {
            AXValueCreate(kAXValueTypeCGPoint, &point as *const CGPoint as *const c_void)
        };
        if raw.is_null() {
            return Err(kAXErrorCannotComplete);
        }
        // SAFETY: raw is a valid +1 CF object; the wrapper releases it.
        let value = unsafe { CFType::wrap_under_create_rule(raw as CFTypeRef) };
        let result = unsafe {
            AXUIElementSetAttributeValue(
                self.0,
                cf_attr.as_concrete_TypeRef(),
                value.as_CFTypeRef(),
            )
        };
        if result == kAXErrorSuccess { Ok(()) } else { Err(result) }
    }

    pub fn perform(&self, action: &str) -> Result<(), AXError> {
        let cf_action = CFString::new(action);
        // SAFETY: performing an action on a valid element.
        let result = unsafe { AXUIElementPerformAction(self.0, cf_action.as_concrete_TypeRef()) };
        if result == kAXErrorSuccess { Ok(()) } else { Err(result) }
    }

    /// The CoreGraphics window number backing this element, if any.
    pub fn window_number(&self) -> Option<u32> {
        let mut number: u32 = 0;
        // SAFETY: out-param write only; fails harmlessly on non-window elements.
        let result = unsafe { _AXUIElementGetWindow(self.0, &mut number) };
        (result == kAXErrorSuccess && number != 0).then_some(number)
    }
}

impl Clone for AxElement {
    fn clone(&self) -> Self {
        // SAFETY: self.0 is valid while self is alive.
        unsafe { AxElement::retain(self.0) }
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        // SAFETY: we own exactly one reference.
        unsafe { CFRelease(self.0 as CFTypeRef) };
    }
}

//! Window eligibility rules applied before identity resolution.

use crate::window::{OwnerInfo, WindowAttributes};

/// Processes whose windows are never user-facing.
pub const SYSTEM_OWNER_NAMES: &[&str] = &["Dock", "loginwindow", "Window Server"];

pub const WINDOW_ROLE: &str = "AXWindow";

/// Subroles marking sheets, dialogs, popovers, floating and system surfaces.
pub const EXCLUDED_SUBROLES: &[&str] = &[
    "AXSheet",
    "AXDialog",
    "AXSystemDialog",
    "AXPopover",
    "AXFloatingWindow",
    "AXSystemFloatingWindow",
    "AXUnknown",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyTitle,
    HostProcess,
    SystemOwner,
    NotWindowRole,
    ExcludedSubrole,
}

/// Missing or empty values are treated as plausibly valid so windows of apps
/// with incomplete accessibility support are still listed.
fn role_rejection(role: Option<&str>, subrole: Option<&str>) -> Option<Rejection> {
    if let Some(role) = role
        && !role.is_empty()
        && role != WINDOW_ROLE
    {
        return Some(Rejection::NotWindowRole);
    }
    if let Some(subrole) = subrole
        && EXCLUDED_SUBROLES.contains(&subrole)
    {
        return Some(Rejection::ExcludedSubrole);
    }
    None
}

#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    host_pid: i32,
    excluded_owners: Vec<String>,
}

impl EligibilityFilter {
    /// `extra_excluded` names are added to [`SYSTEM_OWNER_NAMES`].
    pub fn new(host_pid: i32, extra_excluded: &[String]) -> Self {
        let mut excluded_owners: Vec<String> =
            SYSTEM_OWNER_NAMES.iter().map(|s| s.to_string()).collect();
        for name in extra_excluded {
            if !excluded_owners.contains(name) {
                excluded_owners.push(name.clone());
            }
        }
        Self {
            host_pid,
            excluded_owners,
        }
    }

    pub fn owner_allowed(&self, owner: &OwnerInfo) -> Result<(), Rejection> {
        if owner.id.pid() == self.host_pid {
            return Err(Rejection::HostProcess);
        }
        if self.excluded_owners.iter().any(|n| n == &owner.name) {
            return Err(Rejection::SystemOwner);
        }
        Ok(())
    }

    pub fn window_allowed(&self, attrs: &WindowAttributes) -> Result<(), Rejection> {
        if attrs.title.trim().is_empty() {
            return Err(Rejection::EmptyTitle);
        }
        match role_rejection(attrs.role.as_deref(), attrs.subrole.as_deref()) {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }
}

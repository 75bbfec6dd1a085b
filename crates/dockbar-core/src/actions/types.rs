use serde::Serialize;
use std::fmt;

use crate::window::{ExternalWindowId, OwnerId, WindowHandle, WindowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAction {
    Minimize,
    Restore,
    Focus,
    Close,
}

impl fmt::Display for WindowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowAction::Minimize => "minimize",
            WindowAction::Restore => "restore",
            WindowAction::Focus => "focus",
            WindowAction::Close => "close",
        };
        f.write_str(name)
    }
}

/// One step of a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTier {
    /// Direct attribute write on the window.
    AttributeWrite,
    /// Pressing a title-bar control.
    Control,
    /// Scripted keyboard/menu equivalent routed through the owning app.
    Scripted,
    /// Asking the owning app to come forward.
    Activation,
    /// Terminating the owning process.
    Terminate,
}

impl fmt::Display for ActionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionTier::AttributeWrite => "attribute_write",
            ActionTier::Control => "control",
            ActionTier::Scripted => "scripted",
            ActionTier::Activation => "activation",
            ActionTier::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// Per-action state machine: `Idle -> Attempting(tier) -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Idle,
    Attempting(ActionTier),
    Done { success: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The chain ended on a successful tier.
    Succeeded { tier: ActionTier },
    /// A best-effort sequence where some steps succeeded. Not rolled back.
    PartiallySucceeded { completed: Vec<ActionTier> },
    /// The graceful path failed and the owning process was terminated.
    Terminated,
    /// Every tier failed.
    Exhausted,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ActionOutcome::Exhausted)
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, ActionOutcome::Terminated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub tier: ActionTier,
    pub code: &'static str,
    pub message: String,
}

/// What happened when an action ran, tier by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: WindowAction,
    pub window: ExternalWindowId,
    pub outcome: ActionOutcome,
    /// Always `Done` once the dispatcher hands the report back.
    pub state: ActionState,
    pub attempts: Vec<ActionTier>,
    pub failures: Vec<AttemptFailure>,
}

impl ActionReport {
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        self.failures.last()
    }
}

/// Everything the dispatcher needs to act on one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTarget {
    pub id: ExternalWindowId,
    pub handle: WindowHandle,
    pub owner: OwnerId,
    pub owner_app_name: String,
    /// Addresses the window on the scripted tier.
    pub title: String,
}

impl From<&WindowRecord> for ActionTarget {
    fn from(record: &WindowRecord) -> Self {
        Self {
            id: record.external_id,
            handle: record.handle,
            owner: record.external_id.owner(),
            owner_app_name: record.owner_app_name.clone(),
            title: record.title.clone(),
        }
    }
}

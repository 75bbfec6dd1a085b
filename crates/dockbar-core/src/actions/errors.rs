use super::types::{ActionReport, WindowAction};
use crate::errors::DockbarError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    #[error("No published window with id '{local_id}'")]
    WindowNotFound { local_id: String },

    #[error("Could not {action} window {window}: {reason}")]
    Exhausted {
        action: WindowAction,
        window: String,
        reason: String,
    },
}

impl ActionError {
    /// The failure notice for an exhausted report, if it was one.
    pub fn from_report(report: &ActionReport) -> Option<Self> {
        if report.outcome.is_success() {
            return None;
        }
        let reason = report
            .last_failure()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "no tier applied".to_string());
        Some(ActionError::Exhausted {
            action: report.action,
            window: report.window.to_string(),
            reason,
        })
    }
}

impl DockbarError for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            ActionError::WindowNotFound { .. } => "ACTION_WINDOW_NOT_FOUND",
            ActionError::Exhausted { .. } => "ACTION_EXHAUSTED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ActionError::WindowNotFound { .. })
    }
}

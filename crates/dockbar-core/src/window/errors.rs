use crate::errors::DockbarError;

#[derive(Debug, thiserror::Error)]
pub enum WindowServiceError {
    #[error(
        "Accessibility permission required: enable in System Settings > Privacy & Security > Accessibility"
    )]
    CapabilityUnavailable,

    #[error("Application with pid {pid} is not available")]
    OwnerUnavailable { pid: i32 },

    #[error("Failed to read '{attribute}': {reason}")]
    AttributeRead { attribute: String, reason: String },

    #[error("Failed to write '{attribute}': {reason}")]
    AttributeWrite { attribute: String, reason: String },

    #[error("Window has no {control} control")]
    ControlUnavailable { control: String },

    #[error("Pressing the {control} control failed: {reason}")]
    ControlFailed { control: String, reason: String },

    #[error("Window handle {handle} is no longer valid")]
    HandleStale { handle: u64 },

    #[error("Window enumeration failed: {reason}")]
    EnumerationFailed { reason: String },

    #[error("Scripted fallback failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Failed to subscribe to notifications for pid {pid}: {reason}")]
    SubscriptionFailed { pid: i32, reason: String },

    #[error("Failed to terminate pid {pid}: {message}")]
    ProcessTermination { pid: i32, message: String },

    #[error("Window service is not supported on this platform")]
    Unsupported,
}

impl DockbarError for WindowServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            WindowServiceError::CapabilityUnavailable => "WINDOW_CAPABILITY_UNAVAILABLE",
            WindowServiceError::OwnerUnavailable { .. } => "WINDOW_OWNER_UNAVAILABLE",
            WindowServiceError::AttributeRead { .. } => "WINDOW_ATTRIBUTE_READ_FAILED",
            WindowServiceError::AttributeWrite { .. } => "WINDOW_ATTRIBUTE_WRITE_FAILED",
            WindowServiceError::ControlUnavailable { .. } => "WINDOW_CONTROL_UNAVAILABLE",
            WindowServiceError::ControlFailed { .. } => "WINDOW_CONTROL_FAILED",
            WindowServiceError::HandleStale { .. } => "WINDOW_HANDLE_STALE",
            WindowServiceError::EnumerationFailed { .. } => "WINDOW_ENUMERATION_FAILED",
            WindowServiceError::ScriptFailed { .. } => "WINDOW_SCRIPT_FAILED",
            WindowServiceError::SubscriptionFailed { .. } => "WINDOW_SUBSCRIPTION_FAILED",
            WindowServiceError::ProcessTermination { .. } => "WINDOW_PROCESS_TERMINATION_FAILED",
            WindowServiceError::Unsupported => "WINDOW_SERVICE_UNSUPPORTED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            WindowServiceError::CapabilityUnavailable | WindowServiceError::Unsupported
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error() {
        let error = WindowServiceError::CapabilityUnavailable;
        assert!(error.to_string().contains("Accessibility permission"));
        assert_eq!(error.error_code(), "WINDOW_CAPABILITY_UNAVAILABLE");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_attribute_write_error() {
        let error = WindowServiceError::AttributeWrite {
            attribute: "AXMinimized".to_string(),
            reason: "kAXErrorCannotComplete".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to write 'AXMinimized': kAXErrorCannotComplete"
        );
        assert_eq!(error.error_code(), "WINDOW_ATTRIBUTE_WRITE_FAILED");
        assert!(!error.is_user_error());
    }
}

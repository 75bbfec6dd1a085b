use crate::errors::DockbarError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Process '{pid}' not found")]
    NotFound { pid: u32 },

    #[error("Invalid PID: {pid}")]
    InvalidPid { pid: i32 },

    #[error("Failed to terminate process '{pid}': {message}")]
    TerminateFailed { pid: u32, message: String },

    #[error("PID '{pid}' has been reused (expected: {expected}, actual: {actual})")]
    PidReused {
        pid: u32,
        expected: String,
        actual: String,
    },
}

impl DockbarError for ProcessError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessError::NotFound { .. } => "PROCESS_NOT_FOUND",
            ProcessError::InvalidPid { .. } => "PROCESS_INVALID_PID",
            ProcessError::TerminateFailed { .. } => "PROCESS_TERMINATE_FAILED",
            ProcessError::PidReused { .. } => "PROCESS_PID_REUSED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ProcessError::NotFound { .. } | ProcessError::InvalidPid { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_codes() {
        let reused = ProcessError::PidReused {
            pid: 42,
            expected: "Safari".to_string(),
            actual: "bash".to_string(),
        };
        assert_eq!(reused.error_code(), "PROCESS_PID_REUSED");
        assert!(!reused.is_user_error());
        assert!(ProcessError::NotFound { pid: 1 }.is_user_error());
        assert_eq!(
            ProcessError::InvalidPid { pid: -1 }.to_string(),
            "Invalid PID: -1"
        );
    }
}

use crate::errors::DockbarError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine has stopped")]
    Stopped,

    #[error("Engine task failed: {message}")]
    TaskFailed { message: String },
}

impl DockbarError for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            EngineError::Stopped => "ENGINE_STOPPED",
            EngineError::TaskFailed { .. } => "ENGINE_TASK_FAILED",
        }
    }
}

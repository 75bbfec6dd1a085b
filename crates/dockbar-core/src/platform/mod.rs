//! Platform backends for [`WindowService`](crate::window::WindowService).

#[cfg(target_os = "macos")]
pub mod macos;

use std::sync::Arc;

use crate::window::{WindowService, WindowServiceError};

/// The window service for the platform this binary was built for.
#[cfg(target_os = "macos")]
pub fn default_service() -> Result<Arc<dyn WindowService>, WindowServiceError> {
    Ok(Arc::new(macos::AxWindowService::new()))
}

#[cfg(not(target_os = "macos"))]
pub fn default_service() -> Result<Arc<dyn WindowService>, WindowServiceError> {
    Err(WindowServiceError::Unsupported)
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;
    use crate::errors::DockbarError;

    #[test]
    fn test_default_service_unsupported() {
        let err = default_service().err().unwrap();
        assert!(matches!(err, WindowServiceError::Unsupported));
        assert!(err.is_user_error());
    }
}

//! # Configuration System
//!
//! Hierarchical TOML configuration for dockbar.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.dockbar/config.toml`
//! 3. **Explicit config** - the file named by `DOCKBAR_CONFIG`
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use dockbar_core::config::DockbarConfig;
//!
//! fn example() -> Result<(), dockbar_core::errors::ConfigError> {
//!     let config = DockbarConfig::load_hierarchy()?;
//!     let timings = config.timings();
//!     println!("scanning every {:?}", timings.scan_interval);
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{
    ActionsConfig, DisplayOverride, DockbarConfig, EdgeGuardConfig, EngineTimings, FilterConfig,
    TaskbarConfig, TimingConfig,
};
pub use validation::validate_config;

impl DockbarConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}

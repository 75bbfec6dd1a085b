//! Configuration validation.

use crate::config::types::DockbarConfig;
use crate::errors::ConfigError;

/// Validate a merged configuration.
///
/// Every millisecond timing must be greater than zero, title confirmation
/// needs at least one sighting, and band heights must be finite and
/// positive.
pub fn validate_config(config: &DockbarConfig) -> Result<(), ConfigError> {
    let timing = &config.timing;
    let millis = [
        ("scan_interval_ms", timing.scan_interval_ms),
        ("appear_grace_ms", timing.appear_grace_ms),
        ("vanish_grace_ms", timing.vanish_grace_ms),
        ("pending_grace_ms", timing.pending_grace_ms),
        ("edge_stability_ms", timing.edge_stability_ms),
        ("edge_rate_limit_ms", timing.edge_rate_limit_ms),
        ("event_debounce_ms", timing.event_debounce_ms),
    ];
    for (name, value) in millis {
        if value == Some(0) {
            return Err(ConfigError::ZeroTiming { key: name });
        }
    }

    if timing.title_confirm_cycles == Some(0) {
        return Err(ConfigError::ZeroTitleCycles);
    }

    if let Some(height) = config.taskbar.bar_height {
        validate_bar_height("taskbar.bar_height", height)?;
    }
    for (key, display) in &config.taskbar.displays {
        if key.parse::<u32>().is_err() {
            return Err(ConfigError::InvalidDisplayKey { key: key.clone() });
        }
        if let Some(height) = display.bar_height {
            validate_bar_height(&format!("taskbar.displays.{}.bar_height", key), height)?;
        }
    }

    Ok(())
}

fn validate_bar_height(name: &str, height: f64) -> Result<(), ConfigError> {
    if !height.is_finite() || height <= 0.0 {
        return Err(ConfigError::InvalidBarHeight {
            key: name.to_string(),
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DockbarConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_timing_rejected() {
        let mut config = DockbarConfig::default();
        config.timing.vanish_grace_ms = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("vanish_grace_ms"));
    }

    #[test]
    fn test_zero_title_cycles_rejected() {
        let mut config = DockbarConfig::default();
        config.timing.title_confirm_cycles = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ZeroTitleCycles)
        ));
    }

    #[test]
    fn test_non_positive_bar_height_rejected() {
        let mut config = DockbarConfig::default();
        config.taskbar.bar_height = Some(-4.0);
        assert!(validate_config(&config).is_err());
        config.taskbar.bar_height = Some(0.0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_non_numeric_display_key_rejected() {
        let config: DockbarConfig = toml::from_str(
            r#"
[taskbar.displays.main]
bar_height = 40
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("main"));
    }
}

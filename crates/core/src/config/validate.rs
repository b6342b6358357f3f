use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Lookup timeout is not 0
/// - Source priority is non-empty and lists each source once
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.lookup.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "lookup.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.lookup.priority.is_empty() {
        return Err(ConfigError::ValidationError(
            "lookup.priority must name at least one source".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for kind in &config.lookup.priority {
        if !seen.insert(kind) {
            return Err(ConfigError::ValidationError(format!(
                "lookup.priority lists '{}' more than once",
                kind.as_str()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.lookup.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_priority_fails() {
        let mut config = Config::default();
        config.lookup.priority.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_source_fails() {
        let mut config = Config::default();
        config.lookup.priority = vec![SourceKind::GoogleBooks, SourceKind::GoogleBooks];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("google_books"));
    }
}

//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BgpoolConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BgpoolConfig, ConfigError> {
    let config: BgpoolConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BgpoolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [pool]
            sleep_time_ms = 250
            static_worker_count = 3

            [host]
            max_workers = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.pool.sleep_time_ms, 250);
        assert_eq!(config.pool.static_worker_count, 3);
        assert_eq!(config.host.max_workers, 4);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let err = parse_config("[pool]\nstatic_worker_count = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert!(err.to_string().contains("static_worker_count"));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[pool\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/bgpool.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("bgpool-loader-{}.toml", std::process::id()));
        fs::write(&path, "[pool]\nsleep_time_ms = 42\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.pool.sleep_time_ms, 42);

        fs::remove_file(&path).unwrap_or_default();
    }
}

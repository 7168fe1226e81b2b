//! Where workers re-read their settings from on a reload signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::PoolSettings;
use crate::config::validation::validate_pool;

/// A source of process-wide pool settings.
pub trait SettingsSource: Send + Sync {
    /// Read the current settings. Implementations validate before returning.
    fn load(&self) -> Result<PoolSettings, ConfigError>;
}

/// Settings read from a TOML file on every load.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SettingsSource for FileSettings {
    fn load(&self) -> Result<PoolSettings, ConfigError> {
        Ok(load_config(&self.path)?.pool)
    }
}

/// Settings published by the host into a shared cell.
///
/// Workers only observe a publish when they reload; the cell never pushes.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<ArcSwap<PoolSettings>>,
}

impl SharedSettings {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Validate and publish new settings.
    pub fn publish(&self, settings: PoolSettings) -> Result<(), ConfigError> {
        validate_pool(&settings).map_err(ConfigError::Validation)?;
        self.inner.store(Arc::new(settings));
        Ok(())
    }

    /// The most recently published settings.
    pub fn current(&self) -> PoolSettings {
        **self.inner.load()
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(PoolSettings::default())
    }
}

impl SettingsSource for SharedSettings {
    fn load(&self) -> Result<PoolSettings, ConfigError> {
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_publish_is_visible() {
        let shared = SharedSettings::default();
        let reader: Arc<dyn SettingsSource> = Arc::new(shared.clone());

        shared
            .publish(PoolSettings { sleep_time_ms: 5, static_worker_count: 1 })
            .unwrap();
        assert_eq!(reader.load().unwrap().sleep_time_ms, 5);
    }

    #[test]
    fn test_shared_rejects_invalid() {
        let shared = SharedSettings::default();
        let err = shared
            .publish(PoolSettings { sleep_time_ms: 0, static_worker_count: 1 })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(shared.current(), PoolSettings::default());
    }

    #[test]
    fn test_file_settings_rereads() {
        let path = std::env::temp_dir().join(format!("bgpool-source-{}.toml", std::process::id()));
        std::fs::write(&path, "[pool]\nsleep_time_ms = 100\n").unwrap();
        let source = FileSettings::new(&path);
        assert_eq!(source.load().unwrap().sleep_time_ms, 100);

        std::fs::write(&path, "[pool]\nsleep_time_ms = 200\n").unwrap();
        assert_eq!(source.load().unwrap().sleep_time_ms, 200);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}

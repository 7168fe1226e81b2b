//! Config file watcher for live pool tuning.
//!
//! Only `[pool]` reaches running workers. A file change that leaves the pool
//! settings as they were is not forwarded, so an editor saving twice does not
//! trigger two reload rounds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{BgpoolConfig, PoolSettings};

/// Watches the config file and forwards changed, validated pool settings.
pub struct ConfigWatcher {
    reloader: PoolReloader,
    update_tx: mpsc::UnboundedSender<PoolSettings>,
}

impl ConfigWatcher {
    /// `running` is the configuration the host was booted with.
    pub fn new(path: &Path, running: &BgpoolConfig) -> (Self, mpsc::UnboundedReceiver<PoolSettings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                reloader: PoolReloader::new(path, running),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { mut reloader, update_tx } = self;
        let path = reloader.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(pool) = reloader.reload() {
                        let _ = update_tx.send(pool);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

struct PoolReloader {
    path: PathBuf,
    running: BgpoolConfig,
    last: PoolSettings,
}

impl PoolReloader {
    fn new(path: &Path, running: &BgpoolConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            running: running.clone(),
            last: running.pool,
        }
    }

    /// Re-read the file; `Some` only when the pool settings changed.
    fn reload(&mut self) -> Option<PoolSettings> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config. Keeping current pool settings.");
                return None;
            }
        };

        for field in self.running.restart_only_changes(&config) {
            tracing::warn!(field, "Changed setting needs a host restart to take effect");
        }

        if config.pool == self.last {
            tracing::debug!("Config file changed, pool settings unchanged");
            return None;
        }
        tracing::info!(sleep_time_ms = config.pool.sleep_time_ms, "Pool settings changed");
        self.last = config.pool;
        Some(config.pool)
    }
}

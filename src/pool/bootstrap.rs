//! Static pool registration at host attach time.

use crate::config::validation::validate_pool;
use crate::config::{ConfigError, PoolSettings};
use crate::host::HostProcessManager;
use crate::worker::WorkerConfig;

/// Result of a bootstrap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The host was past its preload phase; nothing was registered.
    Skipped,
    /// `registered` of `requested` static workers were accepted by the host.
    Registered { requested: u32, registered: u32 },
}

/// Register `static_worker_count` workers named `worker_1..=worker_N`.
///
/// Registration is fire-and-forget: a worker the host refuses is logged and
/// the remaining ones are still registered.
pub fn bootstrap_static_pool<H: HostProcessManager>(
    host: &H,
    settings: &PoolSettings,
) -> Result<BootstrapOutcome, ConfigError> {
    if !host.preload_in_progress() {
        tracing::warn!("Host is not preloading, static workers are not registered");
        return Ok(BootstrapOutcome::Skipped);
    }

    validate_pool(settings).map_err(ConfigError::Validation)?;

    let requested = settings.static_worker_count;
    let mut registered = 0;
    for index in 1..=requested {
        // The index range is validated above, so building cannot fail.
        let config = match WorkerConfig::static_worker(index as i64, settings) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(index, error = %e, "Invalid static worker config");
                continue;
            }
        };
        let name = config.name().clone();
        match host.register_static(config) {
            Ok(()) => registered += 1,
            Err(e) => tracing::warn!(name = %name, error = %e, "Static worker not registered"),
        }
    }

    tracing::info!(requested, registered, "Static worker pool registered");
    Ok(BootstrapOutcome::Registered {
        requested,
        registered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HandleStatus, HostError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingHost {
        preload: bool,
        limit: usize,
        statics: Mutex<Vec<WorkerConfig>>,
    }

    impl RecordingHost {
        fn new(preload: bool, limit: usize) -> Self {
            Self {
                preload,
                limit,
                statics: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HostProcessManager for RecordingHost {
        type Handle = ();

        fn preload_in_progress(&self) -> bool {
            self.preload
        }

        fn register_static(&self, config: WorkerConfig) -> Result<(), HostError> {
            let mut statics = self.statics.lock().unwrap();
            if statics.len() >= self.limit {
                return Err(HostError::NoFreeSlots { capacity: self.limit });
            }
            statics.push(config);
            Ok(())
        }

        fn register_dynamic(&self, _config: WorkerConfig) -> Result<(), HostError> {
            unreachable!("bootstrap never registers dynamic workers")
        }

        async fn wait_for_startup(&self, _handle: ()) -> HandleStatus {
            unreachable!("bootstrap never waits")
        }
    }

    #[test]
    fn test_registers_every_valid_count() {
        for count in 1..=50u32 {
            let host = RecordingHost::new(true, usize::MAX);
            let settings = PoolSettings { sleep_time_ms: 10, static_worker_count: count };

            let outcome = bootstrap_static_pool(&host, &settings).unwrap();
            assert_eq!(outcome, BootstrapOutcome::Registered { requested: count, registered: count });

            let statics = host.statics.lock().unwrap();
            let indexes: Vec<u32> = statics.iter().map(|c| c.index()).collect();
            assert_eq!(indexes, (1..=count).collect::<Vec<_>>());

            let mut names: Vec<String> = statics.iter().map(|c| c.name().to_string()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), count as usize);
        }
    }

    #[test]
    fn test_skipped_outside_preload() {
        let host = RecordingHost::new(false, usize::MAX);
        let outcome = bootstrap_static_pool(&host, &PoolSettings::default()).unwrap();
        assert_eq!(outcome, BootstrapOutcome::Skipped);
        assert!(host.statics.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_count() {
        let host = RecordingHost::new(true, usize::MAX);
        for count in [0, 51] {
            let settings = PoolSettings { sleep_time_ms: 10, static_worker_count: count };
            assert!(matches!(
                bootstrap_static_pool(&host, &settings),
                Err(ConfigError::Validation(_))
            ));
        }
        assert!(host.statics.lock().unwrap().is_empty());
    }

    #[test]
    fn test_refused_registrations_do_not_stop_the_rest() {
        let host = RecordingHost::new(true, 3);
        let settings = PoolSettings { sleep_time_ms: 10, static_worker_count: 5 };
        let outcome = bootstrap_static_pool(&host, &settings).unwrap();
        assert_eq!(outcome, BootstrapOutcome::Registered { requested: 5, registered: 3 });
    }
}

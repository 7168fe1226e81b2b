//! The per-worker control loop.
//!
//! # States
//! ```text
//! Initializing → Idle → Cycling → Idle → … → Terminating → Stopped
//! ```
//!
//! # Protocol
//! - Before the loop: connect, then run one `Initialize` cycle
//! - Each iteration blocks on one composite wait (timeout, latch, host death)
//! - Host death exits immediately; it is never treated as a timeout or reload
//! - Reload is applied before the terminate check, terminate before the cycle
//! - A cycle always runs to completion; termination is honored between cycles

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;

use crate::config::SettingsSource;
use crate::lifecycle::liveness::HostLiveness;
use crate::lifecycle::signals::SignalState;
use crate::observability::metrics;
use crate::worker::activity::ActivityReporter;
use crate::worker::config::WorkerConfig;
use crate::worker::cycle::{CycleExecutor, CyclePhase, ScopeGuard, ScopeProvider};

/// How a worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerExit {
    /// Stopped in response to a terminate request.
    Terminated,
    /// The host went away while the worker was waiting.
    HostDied,
    /// The worker could not establish its connection.
    StartupFailed,
}

impl WorkerExit {
    /// Process exit status a supervisor would observe.
    pub fn code(self) -> i32 {
        match self {
            WorkerExit::Terminated => 0,
            WorkerExit::HostDied | WorkerExit::StartupFailed => 1,
        }
    }

    pub fn is_clean(self) -> bool {
        self.code() == 0
    }
}

/// Everything a worker owns besides its config.
pub struct WorkerContext {
    pub signals: Arc<SignalState>,
    pub liveness: HostLiveness,
    pub settings: Arc<dyn SettingsSource>,
    pub executor: Box<dyn CycleExecutor>,
    pub scopes: Box<dyn ScopeProvider>,
    pub activity: ActivityReporter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Timeout,
    Latch,
    HostDied,
}

/// A single worker: its config, its cached settings and its collaborators.
pub struct Worker {
    config: WorkerConfig,
    sleep_interval: Duration,
    signals: Arc<SignalState>,
    liveness: HostLiveness,
    settings: Arc<dyn SettingsSource>,
    executor: Box<dyn CycleExecutor>,
    scopes: Box<dyn ScopeProvider>,
    activity: ActivityReporter,
}

impl Worker {
    pub fn new(config: WorkerConfig, ctx: WorkerContext) -> Self {
        let sleep_interval = config.sleep_interval();
        ctx.activity.interval(sleep_interval);
        Self {
            config,
            sleep_interval,
            signals: ctx.signals,
            liveness: ctx.liveness,
            settings: ctx.settings,
            executor: ctx.executor,
            scopes: ctx.scopes,
            activity: ctx.activity,
        }
    }

    /// Run until terminated or until the host dies.
    pub async fn run(self) -> WorkerExit {
        let span = tracing::info_span!(
            "worker",
            name = %self.config.name(),
            index = self.config.index()
        );
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> WorkerExit {
        tracing::info!(sleep_ms = self.sleep_interval.as_millis() as u64, "Worker starting");

        if !self.liveness.is_alive() {
            tracing::error!("Host is gone before startup, exiting");
            self.activity.stopped();
            return WorkerExit::HostDied;
        }

        if let Err(e) = self.scopes.connect() {
            tracing::error!(error = %e, "Worker could not connect, exiting");
            self.activity.stopped();
            return WorkerExit::StartupFailed;
        }

        self.cycle(CyclePhase::Initialize).await;

        loop {
            if self.wait().await == Wake::HostDied {
                tracing::error!("Host is gone, exiting immediately");
                self.activity.stopped();
                return WorkerExit::HostDied;
            }

            if self.signals.take_reload() {
                self.reload();
            }

            if self.signals.terminate_requested() {
                tracing::info!("Terminate requested, stopping");
                break;
            }

            self.cycle(CyclePhase::Steady).await;
        }

        self.activity.stopped();
        WorkerExit::Terminated
    }

    /// The composite wait. Host death takes precedence over everything else.
    async fn wait(&mut self) -> Wake {
        let wake = tokio::select! {
            biased;
            _ = self.liveness.died() => Wake::HostDied,
            _ = self.signals.latch().wait() => Wake::Latch,
            _ = tokio::time::sleep(self.sleep_interval) => Wake::Timeout,
        };
        self.signals.latch().reset();
        tracing::trace!(?wake, "Woke up");
        wake
    }

    fn reload(&mut self) {
        match self.settings.load() {
            Ok(settings) => {
                let interval = settings.sleep_interval();
                if interval != self.sleep_interval {
                    tracing::info!(
                        old_ms = self.sleep_interval.as_millis() as u64,
                        new_ms = interval.as_millis() as u64,
                        "Sleep interval changed"
                    );
                }
                self.sleep_interval = interval;
                self.activity.reloaded(interval);
                metrics::record_reload(self.config.name().as_str());
            }
            Err(e) => {
                tracing::error!("Failed to reload settings: {}. Keeping current configuration.", e);
            }
        }
    }

    async fn cycle(&mut self, phase: CyclePhase) {
        let start = Instant::now();
        self.activity.running(phase.description());

        let ok = match self.scopes.open() {
            Ok(scope) => {
                let mut guard = ScopeGuard::new(scope);
                let result = self.executor.run_once(phase, guard.scope()).await;
                match result {
                    Ok(()) => match guard.commit() {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::error!(?phase, error = %e, "Cycle commit failed");
                            false
                        }
                    },
                    Err(e) => {
                        guard.rollback();
                        tracing::error!(?phase, error = %e, "Cycle failed, rolled back");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::error!(?phase, error = %e, "Could not open cycle scope");
                false
            }
        };

        self.activity.cycle_finished(ok);
        metrics::record_cycle(self.config.name().as_str(), ok, start);
        self.activity.idle();
    }
}

//! In-process host.
//!
//! # Responsibilities
//! - Hold static registrations until `start()`
//! - Spawn each worker as its own task with its own signal state and liveness
//! - Track worker slots against the configured capacity
//! - Forward reload/terminate to every live worker
//!
//! # Design Decisions
//! - Worker tasks keep only a weak reference to the host, so dropping the
//!   last `LocalHost` cuts the lifeline and reads as host death
//! - Worker ids are host-local and start at 1

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

use crate::config::{BgpoolConfig, ConfigError, PoolSettings, SharedSettings};
use crate::host::{HandleStatus, HostError, HostProcessManager, MaintenanceFactory, Pid, WorkerFactory};
use crate::lifecycle::liveness::HostLifeline;
use crate::lifecycle::signals::SignalState;
use crate::observability::metrics;
use crate::worker::{ActivityReporter, Worker, WorkerActivity, WorkerConfig, WorkerContext, WorkerExit, WorkerName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Preload,
    Running,
    Stopped,
}

struct WorkerSlot {
    config: WorkerConfig,
    signals: Arc<SignalState>,
    activity: watch::Receiver<WorkerActivity>,
}

struct HostState {
    phase: Phase,
    pending: Vec<WorkerConfig>,
    workers: HashMap<Pid, WorkerSlot>,
    exited: Vec<ExitRecord>,
}

struct Inner {
    capacity: usize,
    settings: SharedSettings,
    factory: Arc<dyn WorkerFactory>,
    lifeline: HostLifeline,
    next_pid: AtomicU32,
    running_tx: watch::Sender<usize>,
    state: Mutex<HostState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().expect("host state mutex poisoned")
    }

    fn free_slots(&self, state: &HostState) -> usize {
        self.capacity
            .saturating_sub(state.pending.len() + state.workers.len())
    }
}

/// A point-in-time view of one live worker.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    pub pid: Pid,
    pub index: u32,
    pub name: WorkerName,
    pub activity: WorkerActivity,
}

/// How a worker left the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitRecord {
    pub pid: Pid,
    pub name: WorkerName,
    pub exit: WorkerExit,
}

/// Handle to a dynamically registered worker.
#[derive(Debug)]
pub struct LocalHandle {
    pid: Pid,
    status: watch::Receiver<HandleStatus>,
}

impl LocalHandle {
    /// The id reserved for the worker at registration.
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// A host that runs its workers as tasks on the current Tokio runtime.
#[derive(Clone)]
pub struct LocalHost {
    inner: Arc<Inner>,
}

impl LocalHost {
    /// Create a host in its preload phase.
    pub fn new(config: &BgpoolConfig, factory: Arc<dyn WorkerFactory>) -> Self {
        let (running_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                capacity: config.host.max_workers,
                settings: SharedSettings::new(config.pool),
                factory,
                lifeline: HostLifeline::new(),
                next_pid: AtomicU32::new(1),
                running_tx,
                state: Mutex::new(HostState {
                    phase: Phase::Preload,
                    pending: Vec::new(),
                    workers: HashMap::new(),
                    exited: Vec::new(),
                }),
            }),
        }
    }

    /// A host whose workers run the placeholder maintenance work.
    pub fn with_maintenance(config: &BgpoolConfig) -> Self {
        Self::new(config, Arc::new(MaintenanceFactory))
    }

    /// The settings cell workers reload from.
    pub fn settings(&self) -> SharedSettings {
        self.inner.settings.clone()
    }

    /// Reach the normal-operation milestone: start every pending static worker.
    ///
    /// Returns the number of workers started.
    pub fn start(&self) -> usize {
        let mut state = self.inner.lock();
        if state.phase != Phase::Preload {
            tracing::warn!("Host already started");
            return 0;
        }
        state.phase = Phase::Running;

        let pending = std::mem::take(&mut state.pending);
        let count = pending.len();
        for config in pending {
            if let Err(e) = spawn_worker(&self.inner, &mut state, config) {
                tracing::error!(error = %e, "Failed to start static worker");
            }
        }
        drop(state);

        tracing::info!(workers = count, "Host started");
        count
    }

    /// Publish new settings and ask every worker to reload.
    ///
    /// `static_worker_count` cannot change after attach; a different value is ignored.
    pub fn apply_settings(&self, mut settings: PoolSettings) -> Result<usize, ConfigError> {
        let current = self.inner.settings.current();
        if settings.static_worker_count != current.static_worker_count {
            tracing::warn!(
                current = current.static_worker_count,
                requested = settings.static_worker_count,
                "static_worker_count cannot be changed without restarting the host"
            );
            settings.static_worker_count = current.static_worker_count;
        }
        self.inner.settings.publish(settings)?;
        Ok(self.reload_all())
    }

    /// Raise the reload flag of every live worker. Returns how many were signalled.
    pub fn reload_all(&self) -> usize {
        let state = self.inner.lock();
        for slot in state.workers.values() {
            slot.signals.request_reload();
        }
        state.workers.len()
    }

    /// Raise the terminate flag of every live worker. Returns how many were signalled.
    pub fn terminate_all(&self) -> usize {
        let state = self.inner.lock();
        for slot in state.workers.values() {
            slot.signals.request_terminate();
        }
        tracing::info!(workers = state.workers.len(), "Terminating workers");
        state.workers.len()
    }

    /// Wait until no worker is running, then return the exits recorded so far.
    pub async fn join_all(&self) -> Vec<ExitRecord> {
        let mut running = self.inner.running_tx.subscribe();
        let _ = running.wait_for(|n| *n == 0).await;
        std::mem::take(&mut self.inner.lock().exited)
    }

    /// Simulate the host dying: every worker observes it in its next wait.
    pub fn kill(&self) {
        let mut state = self.inner.lock();
        state.phase = Phase::Stopped;
        state.pending.clear();
        drop(state);
        self.inner.lifeline.kill();
        tracing::warn!("Host killed");
    }

    pub fn running_count(&self) -> usize {
        self.inner.lock().workers.len()
    }

    /// Snapshot of every live worker, ordered by pid.
    pub fn workers(&self) -> Vec<WorkerSnapshot> {
        let state = self.inner.lock();
        let mut snapshots: Vec<_> = state
            .workers
            .iter()
            .map(|(pid, slot)| WorkerSnapshot {
                pid: *pid,
                index: slot.config.index(),
                name: slot.config.name().clone(),
                activity: slot.activity.borrow().clone(),
            })
            .collect();
        snapshots.sort_by_key(|s| s.pid);
        snapshots
    }

    /// Signal state of a live worker.
    pub fn signals(&self, pid: Pid) -> Option<Arc<SignalState>> {
        self.inner.lock().workers.get(&pid).map(|slot| slot.signals.clone())
    }
}

#[async_trait]
impl HostProcessManager for LocalHost {
    type Handle = LocalHandle;

    fn preload_in_progress(&self) -> bool {
        self.inner.lock().phase == Phase::Preload
    }

    fn register_static(&self, config: WorkerConfig) -> Result<(), HostError> {
        let mut state = self.inner.lock();
        if state.phase != Phase::Preload {
            return Err(HostError::RegistrationClosed);
        }
        if self.inner.free_slots(&state) == 0 {
            return Err(HostError::NoFreeSlots {
                capacity: self.inner.capacity,
            });
        }
        tracing::debug!(name = %config.name(), "Static worker registered");
        state.pending.push(config);
        Ok(())
    }

    fn register_dynamic(&self, config: WorkerConfig) -> Result<LocalHandle, HostError> {
        let mut state = self.inner.lock();
        match state.phase {
            Phase::Preload => return Err(HostError::NotStarted),
            Phase::Stopped => return Err(HostError::HostStopped),
            Phase::Running => {}
        }
        if self.inner.free_slots(&state) == 0 {
            return Err(HostError::NoFreeSlots {
                capacity: self.inner.capacity,
            });
        }
        spawn_worker(&self.inner, &mut state, config)
    }

    async fn wait_for_startup(&self, handle: LocalHandle) -> HandleStatus {
        let LocalHandle { mut status, .. } = handle;
        let mut liveness = self.inner.lifeline.liveness();

        loop {
            let current = *status.borrow_and_update();
            if current != HandleStatus::NotYetStarted {
                return current;
            }
            tokio::select! {
                biased;
                _ = liveness.died() => return HandleStatus::HostDied,
                changed = status.changed() => {
                    if changed.is_err() {
                        // The worker task is gone without ever reporting a start.
                        return match *status.borrow() {
                            HandleStatus::NotYetStarted => HandleStatus::Stopped,
                            other => other,
                        };
                    }
                }
            }
        }
    }
}

/// Reserve a slot for `config` and spawn its task. Caller holds the state lock.
fn spawn_worker(
    inner: &Arc<Inner>,
    state: &mut HostState,
    config: WorkerConfig,
) -> Result<LocalHandle, HostError> {
    let raw = inner.next_pid.fetch_add(1, Ordering::Relaxed);
    let pid = Pid::new(raw).ok_or_else(|| HostError::Setup("worker id space exhausted".into()))?;

    let signals = Arc::new(SignalState::new());
    let (reporter, activity) = ActivityReporter::new();
    let (status_tx, status_rx) = watch::channel(HandleStatus::NotYetStarted);

    state.workers.insert(
        pid,
        WorkerSlot {
            config: config.clone(),
            signals: signals.clone(),
            activity,
        },
    );
    let running = state.workers.len();
    inner.running_tx.send_replace(running);
    metrics::record_workers_running(running);

    let liveness = inner.lifeline.liveness();
    let settings = inner.settings.clone();
    let factory = inner.factory.clone();
    let host = Arc::downgrade(inner);

    tokio::spawn(async move {
        if !liveness.is_alive() {
            tracing::warn!(pid = %pid, name = %config.name(), "Host died before worker start");
            reporter.stopped();
            status_tx.send_replace(HandleStatus::HostDied);
            deregister(&host, pid, WorkerExit::HostDied);
            return;
        }

        let parts = match factory.build(&config) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!(name = %config.name(), error = %e, "Worker setup failed");
                reporter.stopped();
                status_tx.send_replace(HandleStatus::Stopped);
                deregister(&host, pid, WorkerExit::StartupFailed);
                return;
            }
        };

        status_tx.send_replace(HandleStatus::Started(pid));
        tracing::info!(pid = %pid, name = %config.name(), "Worker started");

        let worker = Worker::new(
            config,
            WorkerContext {
                signals,
                liveness,
                settings: Arc::new(settings),
                executor: parts.executor,
                scopes: parts.scopes,
                activity: reporter,
            },
        );
        let exit = worker.run().await;

        status_tx.send_replace(HandleStatus::Stopped);
        deregister(&host, pid, exit);
    });

    Ok(LocalHandle {
        pid,
        status: status_rx,
    })
}

fn deregister(host: &Weak<Inner>, pid: Pid, exit: WorkerExit) {
    let Some(inner) = host.upgrade() else {
        return;
    };
    let mut state = inner.lock();
    if let Some(slot) = state.workers.remove(&pid) {
        tracing::info!(pid = %pid, name = %slot.config.name(), ?exit, code = exit.code(), "Worker exited");
        state.exited.push(ExitRecord {
            pid,
            name: slot.config.name().clone(),
            exit,
        });
    }
    let running = state.workers.len();
    drop(state);
    inner.running_tx.send_replace(running);
    metrics::record_workers_running(running);
}

//! Worker activity reporting.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

/// What a worker is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ActivityState {
    Starting,
    Running(&'static str),
    Idle,
    Stopped,
}

/// Activity and counters published by a worker after each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerActivity {
    pub state: ActivityState,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub reloads: u64,
    /// Sleep interval the next wait will use.
    pub sleep_interval_ms: u64,
}

impl Default for WorkerActivity {
    fn default() -> Self {
        Self {
            state: ActivityState::Starting,
            cycles_completed: 0,
            cycles_failed: 0,
            reloads: 0,
            sleep_interval_ms: 0,
        }
    }
}

/// Publishing side, owned by the worker.
#[derive(Debug)]
pub struct ActivityReporter {
    tx: watch::Sender<WorkerActivity>,
}

impl ActivityReporter {
    /// Create a reporter and the receiver observers read from.
    pub fn new() -> (Self, watch::Receiver<WorkerActivity>) {
        let (tx, rx) = watch::channel(WorkerActivity::default());
        (Self { tx }, rx)
    }

    pub fn interval(&self, sleep_interval: Duration) {
        self.tx
            .send_modify(|a| a.sleep_interval_ms = sleep_interval.as_millis() as u64);
    }

    pub fn running(&self, what: &'static str) {
        self.tx.send_modify(|a| a.state = ActivityState::Running(what));
    }

    pub fn idle(&self) {
        self.tx.send_modify(|a| a.state = ActivityState::Idle);
    }

    pub fn stopped(&self) {
        self.tx.send_modify(|a| a.state = ActivityState::Stopped);
    }

    pub fn cycle_finished(&self, ok: bool) {
        self.tx.send_modify(|a| {
            if ok {
                a.cycles_completed += 1;
            } else {
                a.cycles_failed += 1;
            }
        });
    }

    pub fn reloaded(&self, sleep_interval: Duration) {
        self.tx.send_modify(|a| {
            a.reloads += 1;
            a.sleep_interval_ms = sleep_interval.as_millis() as u64;
        });
    }

    /// Current published value.
    pub fn snapshot(&self) -> WorkerActivity {
        self.tx.borrow().clone()
    }
}

//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bgpool::config::BgpoolConfig;
use bgpool::host::{HandleStatus, HostError, HostProcessManager, WorkerFactory, WorkerParts};
use bgpool::worker::{
    CycleExecutor, CyclePhase, ExecutorError, ScopeError, ScopeProvider, TransactionScope, WorkerConfig,
};

/// A config with a short interval so loops turn over quickly.
pub fn fast_config(static_workers: u32, max_workers: usize) -> BgpoolConfig {
    let mut config = BgpoolConfig::default();
    config.pool.sleep_time_ms = 10;
    config.pool.static_worker_count = static_workers;
    config.host.max_workers = max_workers;
    config
}

/// Poll `check` until it holds or the deadline passes.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Everything observable that recording collaborators did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(String),
    Ran(String, CyclePhase),
    Committed(String),
    RolledBack(String),
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn for_worker(&self, name: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| match e {
                Event::Connected(n) | Event::Ran(n, _) | Event::Committed(n) | Event::RolledBack(n) => n == name,
            })
            .collect()
    }
}

pub struct RecordingScope {
    worker: String,
    log: EventLog,
}

impl TransactionScope for RecordingScope {
    fn commit(self: Box<Self>) -> Result<(), ScopeError> {
        self.log.push(Event::Committed(self.worker.clone()));
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        self.log.push(Event::RolledBack(self.worker.clone()));
    }
}

pub struct RecordingScopes {
    worker: String,
    log: EventLog,
    fail_connect: bool,
}

impl ScopeProvider for RecordingScopes {
    fn connect(&mut self) -> Result<(), ScopeError> {
        if self.fail_connect {
            return Err(ScopeError::Connect("database is shutting down".into()));
        }
        self.log.push(Event::Connected(self.worker.clone()));
        Ok(())
    }

    fn open(&mut self) -> Result<Box<dyn TransactionScope>, ScopeError> {
        Ok(Box::new(RecordingScope {
            worker: self.worker.clone(),
            log: self.log.clone(),
        }))
    }
}

pub struct RecordingExecutor {
    worker: String,
    log: EventLog,
    fail_steady: Arc<AtomicBool>,
}

#[async_trait]
impl CycleExecutor for RecordingExecutor {
    async fn run_once(
        &mut self,
        phase: CyclePhase,
        _scope: &mut dyn TransactionScope,
    ) -> Result<(), ExecutorError> {
        self.log.push(Event::Ran(self.worker.clone(), phase));
        if phase == CyclePhase::Steady && self.fail_steady.load(Ordering::SeqCst) {
            return Err(ExecutorError::new("injected failure"));
        }
        Ok(())
    }
}

/// Builds recording collaborators that all write into one log.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub log: EventLog,
    pub fail_steady: Arc<AtomicBool>,
    pub fail_connect: bool,
}

impl WorkerFactory for RecordingFactory {
    fn build(&self, config: &WorkerConfig) -> Result<WorkerParts, HostError> {
        let worker = config.name().to_string();
        Ok(WorkerParts {
            executor: Box::new(RecordingExecutor {
                worker: worker.clone(),
                log: self.log.clone(),
                fail_steady: self.fail_steady.clone(),
            }),
            scopes: Box::new(RecordingScopes {
                worker,
                log: self.log.clone(),
                fail_connect: self.fail_connect,
            }),
        })
    }
}

/// What the scripted host does with the next dynamic registration.
#[derive(Debug, Clone)]
pub enum Script {
    Refuse(HostError),
    Answer(HandleStatus),
}

/// A host whose answers are scripted per registration.
pub struct ScriptedHost {
    pub preload: bool,
    script: Mutex<VecDeque<Script>>,
    pub registered: Mutex<Vec<WorkerConfig>>,
    pub waits: Mutex<usize>,
}

impl ScriptedHost {
    pub fn new(script: impl IntoIterator<Item = Script>) -> Self {
        Self {
            preload: false,
            script: Mutex::new(script.into_iter().collect()),
            registered: Mutex::new(Vec::new()),
            waits: Mutex::new(0),
        }
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.registered
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }
}

#[async_trait]
impl HostProcessManager for ScriptedHost {
    type Handle = HandleStatus;

    fn preload_in_progress(&self) -> bool {
        self.preload
    }

    fn register_static(&self, config: WorkerConfig) -> Result<(), HostError> {
        self.registered.lock().unwrap().push(config);
        Ok(())
    }

    fn register_dynamic(&self, config: WorkerConfig) -> Result<HandleStatus, HostError> {
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted answer left");
        match next {
            Script::Refuse(err) => Err(err),
            Script::Answer(status) => {
                self.registered.lock().unwrap().push(config);
                Ok(status)
            }
        }
    }

    async fn wait_for_startup(&self, handle: HandleStatus) -> HandleStatus {
        *self.waits.lock().unwrap() += 1;
        handle
    }
}

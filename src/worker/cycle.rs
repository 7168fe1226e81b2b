//! Cycle collaborators: transactional scopes and the task executor.
//!
//! # Responsibilities
//! - Define the contract the control loop drives each cycle
//! - Guarantee exactly one of commit/rollback per opened scope
//!
//! # Design Decisions
//! - Scopes are consumed by commit/rollback, so a second exit does not compile
//! - [`ScopeGuard`] rolls back on drop, covering early returns and cancelled cycles
//! - The executor is opaque; the loop only looks at Ok/Err

use async_trait::async_trait;
use thiserror::Error;

/// A failure of the scoped-transaction collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("could not open scope: {0}")]
    Open(String),

    #[error("commit failed: {0}")]
    Commit(String),
}

/// A failure reported by the task executor for one cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cycle failed: {message}")]
pub struct ExecutorError {
    message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which kind of cycle the executor is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// The one-off setup cycle before the first wait.
    Initialize,
    /// A regular cycle after a wake.
    Steady,
}

impl CyclePhase {
    /// Activity description reported while the cycle runs.
    pub fn description(self) -> &'static str {
        match self {
            CyclePhase::Initialize => "initializing",
            CyclePhase::Steady => "running maintenance cycle",
        }
    }
}

/// An open transactional scope.
pub trait TransactionScope: Send {
    fn commit(self: Box<Self>) -> Result<(), ScopeError>;

    fn rollback(self: Box<Self>);
}

/// Opens transactional scopes for one worker.
pub trait ScopeProvider: Send {
    /// Establish whatever connection the scopes need. Called once before the loop.
    fn connect(&mut self) -> Result<(), ScopeError>;

    fn open(&mut self) -> Result<Box<dyn TransactionScope>, ScopeError>;
}

/// The work performed inside each cycle.
#[async_trait]
pub trait CycleExecutor: Send {
    async fn run_once(
        &mut self,
        phase: CyclePhase,
        scope: &mut dyn TransactionScope,
    ) -> Result<(), ExecutorError>;
}

/// Holds an open scope and rolls it back unless it is explicitly finished.
pub struct ScopeGuard {
    scope: Option<Box<dyn TransactionScope>>,
}

impl ScopeGuard {
    pub fn new(scope: Box<dyn TransactionScope>) -> Self {
        Self { scope: Some(scope) }
    }

    /// Mutable access to the open scope.
    pub fn scope(&mut self) -> &mut (dyn TransactionScope + 'static) {
        match self.scope.as_deref_mut() {
            Some(scope) => scope,
            // Only `commit`, `rollback` and `drop` take the scope, and all consume the guard.
            None => unreachable!("scope guard used after it was finished"),
        }
    }

    pub fn commit(mut self) -> Result<(), ScopeError> {
        match self.scope.take() {
            Some(scope) => scope.commit(),
            None => Ok(()),
        }
    }

    pub fn rollback(mut self) {
        if let Some(scope) = self.scope.take() {
            scope.rollback();
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            tracing::debug!("Scope abandoned, rolling back");
            scope.rollback();
        }
    }
}

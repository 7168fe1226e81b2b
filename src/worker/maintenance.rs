//! Placeholder maintenance work.
//!
//! The binary runs these until real collaborators are wired in: the executor
//! does no work beyond logging, and scopes have nothing to commit.

use async_trait::async_trait;

use crate::worker::cycle::{CycleExecutor, CyclePhase, ExecutorError, ScopeError, ScopeProvider, TransactionScope};

/// Executor with an empty work body.
#[derive(Debug, Default)]
pub struct MaintenanceExecutor {
    cycles: u64,
}

impl MaintenanceExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[async_trait]
impl CycleExecutor for MaintenanceExecutor {
    async fn run_once(
        &mut self,
        phase: CyclePhase,
        _scope: &mut dyn TransactionScope,
    ) -> Result<(), ExecutorError> {
        self.cycles += 1;
        tracing::debug!(?phase, cycle = self.cycles, "Maintenance cycle");
        Ok(())
    }
}

/// Scope provider for workers without a data store.
#[derive(Debug, Default)]
pub struct NoopScopeProvider {
    connected: bool,
}

impl NoopScopeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

struct NoopScope;

impl TransactionScope for NoopScope {
    fn commit(self: Box<Self>) -> Result<(), ScopeError> {
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

impl ScopeProvider for NoopScopeProvider {
    fn connect(&mut self) -> Result<(), ScopeError> {
        self.connected = true;
        Ok(())
    }

    fn open(&mut self) -> Result<Box<dyn TransactionScope>, ScopeError> {
        if !self.connected {
            return Err(ScopeError::Open("not connected".into()));
        }
        Ok(Box::new(NoopScope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_connect() {
        let mut scopes = NoopScopeProvider::new();
        assert!(matches!(scopes.open(), Err(ScopeError::Open(_))));
        scopes.connect().unwrap();
        assert!(scopes.open().unwrap().commit().is_ok());
    }

    #[tokio::test]
    async fn test_executor_counts_cycles() {
        let mut scopes = NoopScopeProvider::new();
        scopes.connect().unwrap();
        let mut executor = MaintenanceExecutor::new();
        let mut scope = scopes.open().unwrap();

        executor.run_once(CyclePhase::Initialize, scope.as_mut()).await.unwrap();
        executor.run_once(CyclePhase::Steady, scope.as_mut()).await.unwrap();
        assert_eq!(executor.cycles(), 2);
    }
}

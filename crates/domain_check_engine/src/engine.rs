use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, RetryPolicy, RunPlan};
use crate::fetch::PageFetcher;
use crate::pool::WorkerPool;
use crate::progress::ProgressSink;
use crate::retry::{RetryController, RetryReport};
use crate::Row;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Entry point for callers that own a table of rows.
///
/// Configuration is validated before any row is touched; after that every
/// failure is recorded on its row and never surfaces as an error.
#[derive(Clone)]
pub struct CheckEngine {
    pool: WorkerPool,
}

impl CheckEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            pool: WorkerPool::new(fetcher),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.pool = self.pool.with_sink(sink);
        self
    }

    /// Single pass over the rows matching `selector`.
    pub async fn process_table<S>(
        &self,
        rows: &mut [Row],
        selector: S,
        concurrency: usize,
        timeout_ms: u64,
    ) -> Result<usize, ConfigError>
    where
        S: Fn(&Row) -> bool,
    {
        let plan = RunPlan::from_millis(concurrency, timeout_ms)?;
        Ok(self.pool.run(rows, selector, plan).await)
    }

    /// Initial pass plus escalating retry rounds.
    pub async fn process_with_retries(
        &self,
        rows: &mut [Row],
        policy: &RetryPolicy,
    ) -> Result<RetryReport, ConfigError> {
        let controller = RetryController::from_policy(self.pool.clone(), policy)?;
        Ok(controller.run(rows).await)
    }

    /// Blocking wrapper for synchronous callers; owns its own runtime.
    pub fn run_blocking(
        &self,
        rows: &mut [Row],
        policy: &RetryPolicy,
    ) -> Result<RetryReport, EngineError> {
        policy.validate()?;
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(runtime.block_on(self.process_with_retries(rows, policy))?)
    }
}

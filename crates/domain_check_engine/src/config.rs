use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

pub const CONCURRENCY_RANGE: RangeInclusive<usize> = 1..=20;
pub const MAX_RETRIES_RANGE: RangeInclusive<u32> = 0..=10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("concurrency must be within 1..=20, got {0}")]
    Concurrency(usize),
    #[error("timeout must be positive")]
    Timeout,
    #[error("max retries must be within 0..=10, got {0}")]
    MaxRetries(u32),
    #[error("timeout multiplier must be a finite number greater than 1, got {0}")]
    Multiplier(f64),
    #[error("timeout cap of {cap_ms} ms is below the base timeout of {base_ms} ms")]
    Cap { cap_ms: u64, base_ms: u64 },
}

/// Settings for one pool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    concurrency: usize,
    timeout: Duration,
}

impl RunPlan {
    pub fn new(concurrency: usize, timeout: Duration) -> Result<Self, ConfigError> {
        if !CONCURRENCY_RANGE.contains(&concurrency) {
            return Err(ConfigError::Concurrency(concurrency));
        }
        if timeout.is_zero() {
            return Err(ConfigError::Timeout);
        }
        Ok(Self {
            concurrency,
            timeout,
        })
    }

    pub fn from_millis(concurrency: usize, timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::new(concurrency, Duration::from_millis(timeout_ms))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Caller-supplied knobs for a multi-round run.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub concurrency: usize,
    pub base_timeout_ms: u64,
    pub multiplier: f64,
    pub max_retries: u32,
    pub max_timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            concurrency: 10,
            base_timeout_ms: 10_000,
            multiplier: 2.0,
            max_retries: 3,
            max_timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Check every knob; nothing is processed if this fails.
    pub fn validate(&self) -> Result<RunPlan, ConfigError> {
        let plan = RunPlan::from_millis(self.concurrency, self.base_timeout_ms)?;
        if !MAX_RETRIES_RANGE.contains(&self.max_retries) {
            return Err(ConfigError::MaxRetries(self.max_retries));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 1.0 {
            return Err(ConfigError::Multiplier(self.multiplier));
        }
        if let Some(cap_ms) = self.max_timeout_ms {
            if cap_ms < self.base_timeout_ms {
                return Err(ConfigError::Cap {
                    cap_ms,
                    base_ms: self.base_timeout_ms,
                });
            }
        }
        Ok(plan)
    }
}

use std::time::Duration;

use engine_logging::engine_info;

use crate::config::{ConfigError, RetryPolicy, RunPlan, MAX_RETRIES_RANGE};
use crate::pool::WorkerPool;
use crate::{is_failed, needs_check, EngineEvent, Row};

/// Per-round timeout policy. Round 0 is the initial pass.
pub trait TimeoutSchedule: Send + Sync {
    fn timeout_for_round(&self, round: u32) -> Duration;
}

/// `round(base * multiplier^round)`, optionally capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricSchedule {
    pub base: Duration,
    pub multiplier: f64,
    pub cap: Option<Duration>,
}

impl TimeoutSchedule for GeometricSchedule {
    fn timeout_for_round(&self, round: u32) -> Duration {
        let exponent = i32::try_from(round).unwrap_or(i32::MAX);
        let millis = (self.base.as_millis() as f64 * self.multiplier.powi(exponent)).round();
        let timeout = if millis >= u64::MAX as f64 {
            Duration::from_millis(u64::MAX)
        } else {
            Duration::from_millis(millis as u64)
        };
        match self.cap {
            Some(cap) => timeout.min(cap),
            None => timeout,
        }
    }
}

/// `base + step * round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearSchedule {
    pub base: Duration,
    pub step: Duration,
}

impl TimeoutSchedule for LinearSchedule {
    fn timeout_for_round(&self, round: u32) -> Duration {
        self.base.saturating_add(self.step.saturating_mul(round))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub timeout: Duration,
    pub attempted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub rounds: Vec<RoundSummary>,
}

impl RetryReport {
    pub fn total_attempts(&self) -> usize {
        self.rounds.iter().map(|round| round.attempted).sum()
    }
}

/// Drives the pool through an initial pass and up to `max_retries` retry
/// rounds over rows still marked `Fail`.
///
/// Every round's plan is validated on construction.
pub struct RetryController {
    pool: WorkerPool,
    plans: Vec<RunPlan>,
}

impl RetryController {
    pub fn from_policy(pool: WorkerPool, policy: &RetryPolicy) -> Result<Self, ConfigError> {
        let plan = policy.validate()?;
        let schedule = GeometricSchedule {
            base: plan.timeout(),
            multiplier: policy.multiplier,
            cap: policy.max_timeout_ms.map(Duration::from_millis),
        };
        Self::new(pool, &schedule, plan.concurrency(), policy.max_retries)
    }

    pub fn new<T: TimeoutSchedule>(
        pool: WorkerPool,
        schedule: &T,
        concurrency: usize,
        max_retries: u32,
    ) -> Result<Self, ConfigError> {
        if !MAX_RETRIES_RANGE.contains(&max_retries) {
            return Err(ConfigError::MaxRetries(max_retries));
        }
        let plans = (0..=max_retries)
            .map(|round| RunPlan::new(concurrency, schedule.timeout_for_round(round)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pool, plans })
    }

    pub async fn run(&self, rows: &mut [Row]) -> RetryReport {
        let mut report = RetryReport::default();

        for (round, plan) in (0u32..).zip(self.plans.iter().copied()) {
            let selected = if round == 0 {
                rows.iter().filter(|row| needs_check(row)).count()
            } else {
                rows.iter().filter(|row| is_failed(row)).count()
            };
            if selected == 0 {
                engine_info!("round {}: nothing left to check", round);
                break;
            }

            engine_info!(
                "round {}: checking {} rows with {} ms timeout",
                round,
                selected,
                plan.timeout().as_millis()
            );
            self.pool.sink().emit(EngineEvent::RoundStarted {
                round,
                timeout: plan.timeout(),
                selected,
            });

            let attempted = if round == 0 {
                self.pool.run(rows, needs_check, plan).await
            } else {
                self.pool.run(rows, is_failed, plan).await
            };
            report.rounds.push(RoundSummary {
                round,
                timeout: plan.timeout(),
                attempted,
            });
        }

        report
    }
}

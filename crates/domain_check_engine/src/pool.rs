use std::any::Any;
use std::collections::{BTreeSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::compare::compare_pair;
use crate::config::RunPlan;
use crate::fetch::PageFetcher;
use crate::progress::{NullSink, ProgressSink};
use crate::{EngineEvent, Row, RowIndex, Verdict};

const FAULT_NOTE_CHARS: usize = 120;

struct Job {
    index: RowIndex,
    email_url: String,
    company_url: String,
}

/// Runs the pair comparison over selected rows with a fixed in-flight limit.
///
/// Tasks only ever see owned copies of their two URLs. Verdicts come back to
/// this coordinator, which is the only writer of the row slice.
#[derive(Clone)]
pub struct WorkerPool {
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn ProgressSink>,
}

impl WorkerPool {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub(crate) fn sink(&self) -> &dyn ProgressSink {
        self.sink.as_ref()
    }

    /// Compare every row matching `selector`, at most `plan.concurrency()` at
    /// a time. Returns how many rows were attempted; each exactly once.
    pub async fn run<S>(&self, rows: &mut [Row], selector: S, plan: RunPlan) -> usize
    where
        S: Fn(&Row) -> bool,
    {
        let mut queue: VecDeque<Job> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| selector(row))
            .map(|(index, row)| Job {
                index,
                email_url: row.email_url.clone(),
                company_url: row.company_url.clone(),
            })
            .collect();
        let selected = queue.len();
        let mut outstanding: BTreeSet<RowIndex> = queue.iter().map(|job| job.index).collect();

        let mut in_flight = JoinSet::new();
        loop {
            while in_flight.len() < plan.concurrency() {
                let Some(job) = queue.pop_front() else {
                    break;
                };
                in_flight.spawn(run_job(self.fetcher.clone(), job, plan));
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((index, verdict)) => {
                    outstanding.remove(&index);
                    self.record(rows, index, verdict);
                }
                Err(err) => engine_warn!("comparison task lost: {}", err),
            }
        }

        // Only reachable if the runtime cancelled a task out from under us.
        for index in std::mem::take(&mut outstanding) {
            self.record(rows, index, Verdict::TaskFault("task aborted".to_string()));
        }

        engine_debug!("pool finished {} rows", selected);
        selected
    }

    fn record(&self, rows: &mut [Row], index: RowIndex, verdict: Verdict) {
        rows[index].apply(&verdict);
        self.sink.emit(EngineEvent::RowFinished { index, verdict });
    }
}

async fn run_job(fetcher: Arc<dyn PageFetcher>, job: Job, plan: RunPlan) -> (RowIndex, Verdict) {
    let Job {
        index,
        email_url,
        company_url,
    } = job;
    let comparison = async {
        compare_pair(fetcher.as_ref(), &email_url, &company_url, plan.timeout()).await
    };
    let verdict = match AssertUnwindSafe(comparison).catch_unwind().await {
        Ok(verdict) => verdict,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            engine_warn!("row {} comparison panicked: {}", index, message);
            Verdict::TaskFault(message)
        }
    };
    (index, verdict)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let raw = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string());
    let first_line = raw.lines().next().unwrap_or("panic");
    first_line.chars().take(FAULT_NOTE_CHARS).collect()
}

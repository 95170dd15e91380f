use std::sync::atomic::{AtomicUsize, Ordering};

use domain_check_engine::{EngineEvent, ProgressSink, Verdict};
use engine_logging::{engine_debug, engine_info};

/// Logs one line per round and a progress line every `every` rows.
pub struct LogProgress {
    every: usize,
    selected: AtomicUsize,
    done: AtomicUsize,
}

impl LogProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            selected: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(25)
    }
}

impl ProgressSink for LogProgress {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::RoundStarted {
                round,
                timeout,
                selected,
            } => {
                self.selected.store(selected, Ordering::Relaxed);
                self.done.store(0, Ordering::Relaxed);
                let label = if round == 0 { "initial pass" } else { "retry" };
                engine_info!(
                    "Round {} ({}): {} rows, {} ms per URL",
                    round,
                    label,
                    selected,
                    timeout.as_millis()
                );
            }
            EngineEvent::RowFinished { index, verdict } => {
                let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
                let selected = self.selected.load(Ordering::Relaxed);
                match &verdict {
                    Verdict::Pass => engine_debug!("row {} passed", index + 1),
                    other => engine_debug!("row {} failed: {}", index + 1, other),
                }
                if done % self.every == 0 || done == selected {
                    engine_info!("  {}/{} rows checked", done, selected);
                }
            }
        }
    }
}

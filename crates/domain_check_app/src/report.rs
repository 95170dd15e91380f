use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use domain_check_engine::{write_atomic, PersistError, RetryReport, Row};
use engine_logging::engine_info;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write summary: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    pub timeout_ms: u64,
    pub attempted: usize,
}

/// What a run did, for the log and the optional JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_utc: String,
    pub finished_utc: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub match_counts: BTreeMap<String, usize>,
    pub note_counts: BTreeMap<String, usize>,
    pub rounds: Vec<RoundRecord>,
}

impl RunSummary {
    pub fn new(
        started: DateTime<Utc>,
        input: &Path,
        output: &Path,
        rows: &[Row],
        report: &RetryReport,
    ) -> Self {
        let mut match_counts = BTreeMap::new();
        let mut note_counts = BTreeMap::new();
        for row in rows {
            let status = match row.email_match.as_str() {
                "" => "(unset)",
                other => other,
            };
            *match_counts.entry(status.to_string()).or_insert(0) += 1;
            if !row.retry_note.is_empty() {
                *note_counts.entry(row.retry_note.clone()).or_insert(0) += 1;
            }
        }

        Self {
            started_utc: started.to_rfc3339(),
            finished_utc: Utc::now().to_rfc3339(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            rows: rows.len(),
            match_counts,
            note_counts,
            rounds: report
                .rounds
                .iter()
                .map(|round| RoundRecord {
                    round: round.round,
                    timeout_ms: u64::try_from(round.timeout.as_millis()).unwrap_or(u64::MAX),
                    attempted: round.attempted,
                })
                .collect(),
        }
    }

    pub fn count(&self, status: &str) -> usize {
        self.match_counts.get(status).copied().unwrap_or(0)
    }

    pub fn log(&self) {
        engine_info!("Saved {} rows to {}", self.rows, self.output.display());
        for (status, count) in &self.match_counts {
            engine_info!("  EmailMatch {:<8} {}", status, count);
        }
        for (note, count) in &self.note_counts {
            engine_info!("  RetryNote  {:<28} {}", note, count);
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<PathBuf, ReportError> {
        let json = serde_json::to_vec_pretty(self)?;
        Ok(write_atomic(path, &json)?)
    }
}

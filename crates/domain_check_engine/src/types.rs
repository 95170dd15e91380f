use std::fmt;
use std::time::Duration;

/// Index of a row inside the table slice handed to the engine.
pub type RowIndex = usize;

/// Match state of a row; only the engine moves a row out of `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStatus {
    #[default]
    Unset,
    Pass,
    Fail,
}

impl MatchStatus {
    /// Parse a stored `EmailMatch` cell. Anything unrecognised counts as `Unset`.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("pass") {
            MatchStatus::Pass
        } else if value.eq_ignore_ascii_case("fail") {
            MatchStatus::Fail
        } else {
            MatchStatus::Unset
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Unset => "",
            MatchStatus::Pass => "Pass",
            MatchStatus::Fail => "Fail",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work: a pair of URLs plus the two fields the engine writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub email_url: String,
    pub company_url: String,
    pub email_match: MatchStatus,
    pub retry_note: String,
}

impl Row {
    pub fn new(email_url: impl Into<String>, company_url: impl Into<String>) -> Self {
        Self {
            email_url: email_url.into(),
            company_url: company_url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&mut self, verdict: &Verdict) {
        self.email_match = if verdict.passed() {
            MatchStatus::Pass
        } else {
            MatchStatus::Fail
        };
        self.retry_note = verdict.note();
    }
}

/// Selects rows that have never passed: `Unset` or `Fail`.
pub fn needs_check(row: &Row) -> bool {
    matches!(row.email_match, MatchStatus::Unset | MatchStatus::Fail)
}

/// Selects rows whose last attempt failed.
pub fn is_failed(row: &Row) -> bool {
    row.email_match == MatchStatus::Fail
}

/// A successfully rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub final_url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("no response within {} ms", limit.as_millis()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The render did not complete within the allotted time.
    Timeout,
    /// DNS, connect, TLS or non-2xx response.
    Navigation,
    Other,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "Timeout",
            FailureKind::Navigation => "NavigationError",
            FailureKind::Other => "Error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a single page fetch. Failures are values, never panics.
pub type FetchOutcome = Result<RenderedPage, FetchError>;

/// Outcome of comparing one row's two URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    MissingUrl,
    FetchErr { email: String, company: String },
    EmptyBody,
    StillDiff,
    /// The comparison task itself faulted; carries the fault message.
    TaskFault(String),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Short machine-readable diagnostic stored in `RetryNote`.
    pub fn note(&self) -> String {
        match self {
            Verdict::Pass => "Pass".to_string(),
            Verdict::MissingUrl => "FetchErr:MissingURL".to_string(),
            Verdict::FetchErr { email, company } => format!("FetchErr:{email}|{company}"),
            Verdict::EmptyBody => "EmptyBody".to_string(),
            Verdict::StillDiff => "StillDiff".to_string(),
            Verdict::TaskFault(message) => format!("TaskFault:{message}"),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.note())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RoundStarted {
        round: u32,
        timeout: Duration,
        selected: usize,
    },
    RowFinished {
        index: RowIndex,
        verdict: Verdict,
    },
}

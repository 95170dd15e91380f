//! Domain check engine: concurrent fetch, compare and retry over table rows.
mod address;
mod compare;
mod config;
mod decode;
mod engine;
mod fetch;
mod persist;
mod pool;
mod progress;
mod retry;
mod types;

#[cfg(feature = "chrome")]
mod chrome;

pub use address::{host_key, normalize_url};
pub use compare::compare_pair;
pub use config::{ConfigError, RetryPolicy, RunPlan, CONCURRENCY_RANGE, MAX_RETRIES_RANGE};
pub use decode::{decode_body, DecodedBody};
pub use engine::{CheckEngine, EngineError};
pub use fetch::{FetchSettings, PageFetcher, ReqwestFetcher};
pub use persist::{write_atomic, PersistError};
pub use pool::WorkerPool;
pub use progress::{NullSink, ProgressSink};
pub use retry::{
    GeometricSchedule, LinearSchedule, RetryController, RetryReport, RoundSummary,
    TimeoutSchedule,
};
pub use types::{
    is_failed, needs_check, EngineEvent, FailureKind, FetchError, FetchOutcome, MatchStatus,
    RenderedPage, Row, RowIndex, Verdict,
};

#[cfg(feature = "chrome")]
pub use chrome::{ChromeFetcher, ChromeSettings};

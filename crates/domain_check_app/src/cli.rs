use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::settings::Renderer;

#[derive(Debug, Parser, Clone, Default)]
#[command(
    name = "domain-check",
    version,
    about = "Check whether each row's Email Domain and Company Domain serve the same site",
    after_help = "If OUTPUT is omitted the input file is overwritten."
)]
pub struct Cli {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// RON settings file; command-line flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rows compared at the same time (1-20).
    #[arg(short, long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-URL timeout for the initial pass.
    #[arg(short, long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Timeout growth factor per retry round.
    #[arg(long, value_name = "X")]
    pub multiplier: Option<f64>,

    /// Retry rounds after the initial pass (0-10).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    #[arg(long, value_name = "MS")]
    pub max_timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    pub renderer: Option<Renderer>,

    /// Keep only the standard output columns.
    #[arg(long, default_value_t = false)]
    pub project: bool,

    /// Write a JSON run summary here.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

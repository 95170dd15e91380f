//! Command-line front end: reads a CSV table, runs the check engine over it
//! and writes the verdicts back.

pub mod cli;
pub mod progress;
pub mod report;
pub mod settings;
pub mod sheet;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::Utc;
use domain_check_engine::{CheckEngine, PageFetcher, ReqwestFetcher, RetryReport};
use engine_logging::{engine_info, engine_warn};

use crate::cli::Cli;
use crate::progress::LogProgress;
use crate::report::RunSummary;
use crate::settings::{Renderer, Settings};
use crate::sheet::Sheet;

/// Run one check over `cli.input` and save the result.
pub fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let started = Utc::now();
    let settings = Settings::resolve(cli)?;
    let policy = settings.retry_policy();
    policy.validate().context("invalid settings")?;

    let mut sheet =
        Sheet::load(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    let mut rows = sheet.rows();
    engine_info!("Loaded {} rows from {}", rows.len(), cli.input.display());

    let report = if rows.iter().any(domain_check_engine::needs_check) {
        let fetcher = build_fetcher(&settings)?;
        let engine = CheckEngine::new(fetcher).with_sink(Arc::new(LogProgress::default()));
        engine.run_blocking(&mut rows, &policy)?
    } else {
        engine_info!("Nothing to do: every row already passed");
        RetryReport::default()
    };

    sheet.apply_rows(&rows);
    let output = cli.output.as_deref().unwrap_or(cli.input.as_path());
    let written = sheet
        .save(output, cli.project)
        .with_context(|| format!("writing {}", output.display()))?;

    let summary = RunSummary::new(started, &cli.input, &written, &rows, &report);
    summary.log();
    if let Some(path) = &cli.report {
        write_report(&summary, path);
    }
    Ok(summary)
}

fn write_report(summary: &RunSummary, path: &Path) {
    match summary.write_json(path) {
        Ok(written) => engine_info!("Run summary written to {}", written.display()),
        Err(err) => engine_warn!("Could not write run summary to {}: {}", path.display(), err),
    }
}

fn build_fetcher(settings: &Settings) -> anyhow::Result<Arc<dyn PageFetcher>> {
    match settings.renderer {
        Renderer::Http => {
            let fetcher = ReqwestFetcher::new(settings.fetch_settings())
                .map_err(|err| anyhow!("failed to build HTTP client: {}", err.message))?;
            Ok(Arc::new(fetcher))
        }
        Renderer::Chrome => build_chrome_fetcher(),
    }
}

#[cfg(feature = "chrome")]
fn build_chrome_fetcher() -> anyhow::Result<Arc<dyn PageFetcher>> {
    use domain_check_engine::{ChromeFetcher, ChromeSettings};

    let fetcher = ChromeFetcher::launch(&ChromeSettings::default())
        .map_err(|err| anyhow!("failed to launch headless browser: {}", err.message))?;
    Ok(Arc::new(fetcher))
}

#[cfg(not(feature = "chrome"))]
fn build_chrome_fetcher() -> anyhow::Result<Arc<dyn PageFetcher>> {
    anyhow::bail!("the chrome renderer requires building with `--features chrome`")
}

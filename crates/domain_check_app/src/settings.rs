use std::fs;
use std::path::Path;

use domain_check_engine::{FetchSettings, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Renderer {
    /// Plain HTTP GET of the document.
    #[default]
    Http,
    /// Headless Chromium (requires the `chrome` feature).
    Chrome,
}

/// Every tunable of a run. Missing fields in a settings file take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub multiplier: f64,
    pub max_retries: u32,
    pub max_timeout_ms: Option<u64>,
    pub renderer: Renderer,
    pub user_agent: Option<String>,
    pub redirect_limit: usize,
    pub max_body_bytes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        let fetch = FetchSettings::default();
        Self {
            concurrency: policy.concurrency,
            timeout_ms: policy.base_timeout_ms,
            multiplier: policy.multiplier,
            max_retries: policy.max_retries,
            max_timeout_ms: policy.max_timeout_ms,
            renderer: Renderer::Http,
            user_agent: None,
            redirect_limit: fetch.redirect_limit,
            max_body_bytes: fetch.max_bytes,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Settings file (if any) overlaid with command-line flags.
    pub fn resolve(cli: &Cli) -> Result<Self, SettingsError> {
        let mut settings = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        Ok(settings)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(multiplier) = cli.multiplier {
            self.multiplier = multiplier;
        }
        if let Some(max_retries) = cli.max_retries {
            self.max_retries = max_retries;
        }
        if cli.max_timeout_ms.is_some() {
            self.max_timeout_ms = cli.max_timeout_ms;
        }
        if let Some(renderer) = cli.renderer {
            self.renderer = renderer;
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            concurrency: self.concurrency,
            base_timeout_ms: self.timeout_ms,
            multiplier: self.multiplier,
            max_retries: self.max_retries,
            max_timeout_ms: self.max_timeout_ms,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: defaults.connect_timeout,
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

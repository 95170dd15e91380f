//! Headless Chromium renderer, enabled with the `chrome` feature.
//!
//! One browser process is shared by every fetch; each fetch gets its own tab
//! so navigation state never crosses rows. `headless_chrome` is blocking, so
//! renders run on the blocking pool and the async side enforces the timeout.

use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use engine_logging::{engine_debug, engine_warn};
use headless_chrome::browser::tab::{RequestPausedDecision, Tab};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::{Browser, LaunchOptions};

use crate::fetch::PageFetcher;
use crate::{FailureKind, FetchError, FetchOutcome, RenderedPage};

const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-blink-features=AutomationControlled",
    "--blink-settings=imagesEnabled=false",
];

const BLOCKED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif", "woff", "woff2", "ttf",
    "otf", "eot", "css",
];

/// Extra time granted to the blocking render before the async side gives up.
const TAB_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ChromeSettings {
    pub sandbox: bool,
    pub idle_browser_timeout: Duration,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            sandbox: false,
            idle_browser_timeout: Duration::from_secs(15 * 60),
        }
    }
}

pub struct ChromeFetcher {
    browser: Arc<Browser>,
}

impl ChromeFetcher {
    pub fn launch(settings: &ChromeSettings) -> Result<Self, FetchError> {
        let args: Vec<&OsStr> = LAUNCH_ARGS.iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(settings.sandbox)
            .idle_browser_timeout(settings.idle_browser_timeout)
            .args(args)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))?;
        let browser = Browser::new(options)
            .map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))?;
        Ok(Self {
            browser: Arc::new(browser),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let browser = self.browser.clone();
        let target = url.to_string();
        let render = tokio::task::spawn_blocking(move || render_blocking(&browser, &target, timeout));

        match tokio::time::timeout(timeout + TAB_GRACE, render).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                engine_warn!("render task for {} failed: {}", url, join_err);
                Err(FetchError::new(FailureKind::Other, join_err.to_string()))
            }
            Err(_) => Err(FetchError::timeout(timeout)),
        }
    }
}

fn render_blocking(browser: &Browser, url: &str, timeout: Duration) -> FetchOutcome {
    let started = Instant::now();
    let tab = browser
        .new_tab()
        .map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))?;
    tab.set_default_timeout(timeout);

    let rendered = prepare_tab(&tab).and_then(|document_status| {
        tab.navigate_to(url)?.wait_until_navigated()?;
        let html = tab.get_content()?;
        let status = document_status.lock().ok().and_then(|slot| *slot);
        Ok((html, status))
    });
    let final_url = tab.get_url();

    if let Err(err) = tab.close(true) {
        engine_debug!("closing tab for {} failed: {}", url, err);
    }

    let (html, status) = rendered.map_err(|err| {
        if started.elapsed() >= timeout {
            FetchError::timeout(timeout)
        } else {
            FetchError::new(FailureKind::Navigation, err.to_string())
        }
    })?;
    check_document_status(status)?;
    Ok(RenderedPage {
        html: html.trim().to_string(),
        final_url,
        status,
    })
}

/// Blocks heavy assets and records the status of the first response, which
/// is the top-level document.
fn prepare_tab(tab: &Arc<Tab>) -> anyhow::Result<Arc<Mutex<Option<u16>>>> {
    tab.enable_fetch(None, None)?;
    tab.enable_request_interception(Arc::new(block_heavy_assets))?;

    let document_status = Arc::new(Mutex::new(None));
    let slot = document_status.clone();
    tab.register_response_handling(
        "document_status",
        Box::new(move |event_params, _fetch_body| {
            if let Ok(mut slot) = slot.lock() {
                if slot.is_none() {
                    *slot = u16::try_from(event_params.response.status).ok();
                }
            }
        }),
    )?;
    Ok(document_status)
}

fn block_heavy_assets(
    _transport: Arc<Transport>,
    _session_id: SessionId,
    event: RequestPausedEvent,
) -> RequestPausedDecision {
    if is_heavy_asset(&event.params.request.url) {
        RequestPausedDecision::Fail(FailRequest {
            request_id: event.params.request_id,
            error_reason: ErrorReason::BlockedByClient,
        })
    } else {
        RequestPausedDecision::Continue(None)
    }
}

fn is_heavy_asset(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    BLOCKED_EXTENSIONS
        .iter()
        .any(|blocked| extension.eq_ignore_ascii_case(blocked))
}

/// Non-2xx documents fail the same way the HTTP renderer reports them.
fn check_document_status(status: Option<u16>) -> Result<(), FetchError> {
    match status {
        Some(code) if !(200..300).contains(&code) => Err(FetchError::new(
            FailureKind::Navigation,
            format!("document returned HTTP {code}"),
        )
        .with_status(code)),
        _ => Ok(()),
    }
}

use std::time::Duration;

use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::decode::decode_body;
use crate::{FailureKind, FetchError, FetchOutcome, RenderedPage};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            redirect_limit: 10,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("domain-check/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Renders one page. Implementations must turn every failure into a
/// `FetchError` value and respect `timeout` for the whole call.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Plain HTTP fetcher. Subresources are never requested, so only the
/// document itself is transferred.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))?;
        Ok(Self { client, settings })
    }

    async fn fetch_inner(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::Navigation, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                FetchError::new(FailureKind::Navigation, status.to_string())
                    .with_status(status.as_u16()),
            );
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let max_bytes = self.settings.max_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large(max_bytes));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_body(&bytes, content_type.as_deref());
        engine_debug!(
            "fetched {} -> {} ({} bytes, {})",
            url,
            final_url,
            bytes.len(),
            decoded.encoding_label
        );

        Ok(RenderedPage {
            html: decoded.html.trim().to_string(),
            final_url,
            status: Some(status.as_u16()),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        // Outer bound for the whole call, body and decoding included.
        match tokio::time::timeout(timeout, self.fetch_inner(url, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::timeout(timeout)),
        }
    }
}

fn too_large(max_bytes: u64) -> FetchError {
    FetchError::new(
        FailureKind::Other,
        format!("response exceeds {max_bytes} bytes"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    let failure = FetchError::new(FailureKind::Navigation, err.to_string());
    match err.status() {
        Some(status) => failure.with_status(status.as_u16()),
        None => failure,
    }
}

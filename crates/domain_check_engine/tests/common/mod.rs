#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use domain_check_engine::{
    EngineEvent, FailureKind, FetchError, FetchOutcome, PageFetcher, ProgressSink, RenderedPage,
};

pub fn page(html: &str) -> FetchOutcome {
    Ok(RenderedPage {
        html: html.to_string(),
        final_url: String::new(),
        status: Some(200),
    })
}

pub fn timeout() -> FetchOutcome {
    Err(FetchError::new(FailureKind::Timeout, "scripted timeout"))
}

pub fn http_status(status: u16) -> FetchOutcome {
    Err(FetchError::new(FailureKind::Navigation, "scripted status").with_status(status))
}

/// Fake renderer: per-URL queues of outcomes (the last one repeats), call
/// recording, and an in-flight gauge for email-side fetches.
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    fallback: FetchOutcome,
    delay: Duration,
    panic_on: Option<String>,
    calls: Mutex<Vec<(String, Duration)>>,
    email_in_flight: AtomicUsize,
    max_email_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            fallback: page("<html>fallback</html>"),
            delay: Duration::ZERO,
            panic_on: None,
            calls: Mutex::new(Vec::new()),
            email_in_flight: AtomicUsize::new(0),
            max_email_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    pub fn script(self, url: &str, outcomes: Vec<FetchOutcome>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.into());
        self
    }

    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_email_in_flight(&self) -> usize {
        self.max_email_in_flight.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, url: &str) -> FetchOutcome {
        let mut script = self.script.lock().unwrap();
        match script.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| self.fallback.clone()),
            None => self.fallback.clone(),
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        self.calls.lock().unwrap().push((url.to_string(), timeout));
        if self.panic_on.as_deref() == Some(url) {
            panic!("scripted panic for {url}");
        }

        let email_side = url.contains("email");
        if email_side {
            let now = self.email_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_email_in_flight.fetch_max(now, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if email_side {
            self.email_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        self.next_outcome(url)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

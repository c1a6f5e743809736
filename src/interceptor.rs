use crate::classifier::is_backend_rest_url;
use crate::decoder::decode;
use crate::error::FetchError;
use crate::fetch::{Fetch, FetchRequest, FetchResponse};
use crate::introspect::introspect;
use crate::log_buffer::LogAggregator;
use crate::subscription::SubscriberSlot;
use crate::types::{truncate_chars, ApiLogEntry, LogEntry, RawCallRecord, RestLogEntry};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const ABORTED_MESSAGE: &str = "Request aborted before completion";

/// Turns settled calls into log entries and hands them on.
pub struct Recorder {
    backend_domain: String,
    max_body_chars: usize,
    aggregator: Arc<LogAggregator>,
    subscriber: Arc<SubscriberSlot>,
}

impl Recorder {
    pub fn new(
        backend_domain: impl Into<String>,
        max_body_chars: usize,
        aggregator: Arc<LogAggregator>,
        subscriber: Arc<SubscriberSlot>,
    ) -> Self {
        Self {
            backend_domain: backend_domain.into(),
            max_body_chars,
            aggregator,
            subscriber,
        }
    }

    /// Classifies `raw` and returns the entry it becomes, if any.
    pub fn classify(&self, raw: RawCallRecord) -> Option<LogEntry> {
        if !is_backend_rest_url(&raw.url, &self.backend_domain) {
            return Some(LogEntry::Api(ApiLogEntry::from(raw)));
        }

        let call = match decode(
            &raw.url,
            &raw.method,
            raw.request_body.as_deref(),
            &self.backend_domain,
        ) {
            Some(call) => call,
            None => {
                debug!("Skipping undecodable backend call {}", raw.url);
                return None;
            }
        };

        let details = introspect(raw.success, raw.response_body.as_deref());
        let error = if raw.success {
            None
        } else {
            details.error.or(raw.error)
        };

        Some(LogEntry::Rest(RestLogEntry {
            id: raw.id,
            timestamp: raw.started_at,
            duration: raw.duration_ms,
            operation: call.operation,
            table: call.table,
            row_count: details.row_count,
            success: raw.success,
            query: call.query_params,
            error,
            error_code: details.error_code,
        }))
    }

    /// Classifies, buffers and publishes one settled call.
    pub fn record(&self, raw: RawCallRecord) {
        if let Some(entry) = self.classify(raw) {
            self.aggregator.insert(entry.clone());
            self.subscriber.notify(&entry);
        }
    }

    /// `record`, with any panic contained and reported.
    fn record_fail_open(&self, raw: RawCallRecord) {
        let result = catch_unwind(AssertUnwindSafe(|| self.record(raw)));

        if let Err(panic_err) = result {
            let panic_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            warn!("Network inspector failed to record a call: {}", panic_msg);
        }
    }

    fn capture(&self, body: &[u8]) -> Option<String> {
        if body.is_empty() || self.max_body_chars == 0 {
            return None;
        }
        // A char is at most 4 bytes; never decode more than the bound needs.
        let window = &body[..body.len().min(self.max_body_chars.saturating_mul(4))];
        let text = String::from_utf8_lossy(window);
        Some(truncate_chars(&text, self.max_body_chars).to_string())
    }
}

/// A call that has started but not yet settled.
///
/// Dropping it unsettled (the caller abandoned the future) still records a
/// failed entry.
struct PendingCall {
    recorder: Arc<Recorder>,
    record: Option<RawCallRecord>,
    started: Instant,
}

impl PendingCall {
    fn start(recorder: Arc<Recorder>, request: &FetchRequest) -> Self {
        let request_body = request
            .body
            .as_ref()
            .and_then(|body| recorder.capture(body));

        let record = RawCallRecord {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now().timestamp_millis(),
            duration_ms: 0,
            method: request.method.clone(),
            url: request.url.clone(),
            status: None,
            success: false,
            request_body,
            response_body: None,
            error: Some(ABORTED_MESSAGE.to_string()),
        };

        Self {
            recorder,
            record: Some(record),
            started: Instant::now(),
        }
    }

    fn settle(mut self, result: &Result<FetchResponse, FetchError>) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        record.duration_ms = elapsed_ms(self.started);

        match result {
            Ok(response) => {
                record.status = Some(response.status);
                record.success = response.ok();
                record.response_body = self.recorder.capture(&response.body);
                record.error = if record.success {
                    None
                } else {
                    Some(format!("HTTP {}", response.status))
                };
            }
            Err(e) => {
                record.error = Some(e.to_string());
            }
        }

        self.recorder.record_fail_open(record);
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if let Some(mut record) = self.record.take() {
            record.duration_ms = elapsed_ms(self.started);
            self.recorder.record_fail_open(record);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Observes every call made through the wrapped primitive.
///
/// The inner result is returned exactly as produced.
pub struct InterceptingFetch {
    inner: Arc<dyn Fetch>,
    recorder: Arc<Recorder>,
}

impl InterceptingFetch {
    pub fn new(inner: Arc<dyn Fetch>, recorder: Arc<Recorder>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl Fetch for InterceptingFetch {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let pending = PendingCall::start(Arc::clone(&self.recorder), &request);
        let result = self.inner.fetch(request).await;
        pending.settle(&result);
        result
    }

    fn is_instrumented(&self) -> bool {
        true
    }
}

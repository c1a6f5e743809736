use crate::config::Config;
use crate::fetch::{Fetch, FetchHandle};
use crate::interceptor::{InterceptingFetch, Recorder};
use crate::log_buffer::{LogAggregator, LogStats};
use crate::subscription::{Subscriber, SubscriberSlot};
use crate::types::{ApiLogEntry, LogKind, RestLogEntry};
use log::info;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorStats {
    pub api: LogStats,
    pub rest: LogStats,
}

/// Network inspector service: owns the log buffers and the subscriber slot,
/// and installs itself around a `FetchHandle`.
///
/// Construct one at startup and pass it by reference to consumers.
pub struct Inspector {
    enabled: bool,
    aggregator: Arc<LogAggregator>,
    subscriber: Arc<SubscriberSlot>,
    recorder: Arc<Recorder>,
    installed: AtomicBool,
    original: Mutex<Option<Arc<dyn Fetch>>>,
}

impl Inspector {
    pub fn new(config: &Config) -> Self {
        let aggregator = Arc::new(LogAggregator::new(config.max_entries));
        let subscriber = Arc::new(SubscriberSlot::new());
        let recorder = Arc::new(Recorder::new(
            config.backend_domain.clone(),
            config.max_body_chars,
            Arc::clone(&aggregator),
            Arc::clone(&subscriber),
        ));

        Self {
            enabled: config.enabled(),
            aggregator,
            subscriber,
            recorder,
            installed: AtomicBool::new(false),
            original: Mutex::new(None),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Wraps `handle` so every call through it is logged. Idempotent.
    pub fn init(&self, handle: &FetchHandle) -> InstallOutcome {
        if !self.enabled {
            info!("Network inspector disabled, fetch left untouched");
            return InstallOutcome::Disabled;
        }

        if self.installed.swap(true, Ordering::SeqCst) {
            return InstallOutcome::AlreadyInstalled;
        }

        let recorder = Arc::clone(&self.recorder);
        let wrapped = handle.wrap_with(move |inner| -> Arc<dyn Fetch> {
            Arc::new(InterceptingFetch::new(inner, recorder))
        });

        match wrapped {
            Some(original) => {
                *self.original.lock().unwrap_or_else(|p| p.into_inner()) = Some(original);
                info!("Network inspector installed");
                InstallOutcome::Installed
            }
            None => {
                // Someone else's inspector already wraps this handle.
                self.installed.store(false, Ordering::SeqCst);
                InstallOutcome::AlreadyInstalled
            }
        }
    }

    /// Restores the original primitive and drops the subscriber.
    pub fn dispose(&self, handle: &FetchHandle) {
        self.subscriber.set(None);

        if !self.installed.swap(false, Ordering::SeqCst) {
            return;
        }

        let original = self.original.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(original) = original {
            handle.replace(original);
            info!("Network inspector removed");
        }
    }

    pub fn set_subscriber(&self, subscriber: Option<Subscriber>) {
        self.subscriber.set(subscriber);
    }

    pub fn api_logs(&self) -> Vec<ApiLogEntry> {
        self.aggregator.api_snapshot()
    }

    pub fn rest_logs(&self) -> Vec<RestLogEntry> {
        self.aggregator.rest_snapshot()
    }

    pub fn clear_api_logs(&self) {
        self.aggregator.clear(LogKind::Api);
    }

    pub fn clear_rest_logs(&self) {
        self.aggregator.clear(LogKind::Rest);
    }

    pub fn stats(&self) -> InspectorStats {
        InspectorStats {
            api: self.aggregator.stats(LogKind::Api),
            rest: self.aggregator.stats(LogKind::Rest),
        }
    }
}

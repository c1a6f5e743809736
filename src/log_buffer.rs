use crate::types::{ApiLogEntry, LogEntry, LogKind, RestLogEntry};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Fixed-capacity log, newest entry first.
pub struct LogBuffer<T> {
    entries: VecDeque<T>,
    max_size: usize,
}

impl<T: Clone> LogBuffer<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Prepends `entry`, evicting the oldest one once full.
    pub fn push(&mut self, entry: T) {
        if self.max_size == 0 {
            return;
        }
        if self.entries.len() >= self.max_size {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

/// Summary of one log kind as currently buffered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: usize,
    pub failed: usize,
    pub average_duration_ms: Option<f64>,
}

impl LogStats {
    fn collect(entries: impl Iterator<Item = (bool, u64)>) -> Self {
        let mut stats = LogStats::default();
        let mut duration_sum = 0u64;

        for (success, duration) in entries {
            stats.total += 1;
            if !success {
                stats.failed += 1;
            }
            duration_sum = duration_sum.saturating_add(duration);
        }

        if stats.total > 0 {
            stats.average_duration_ms = Some(duration_sum as f64 / stats.total as f64);
        }
        stats
    }
}

/// The two independent buffers behind the inspector.
pub struct LogAggregator {
    api: Mutex<LogBuffer<ApiLogEntry>>,
    rest: Mutex<LogBuffer<RestLogEntry>>,
}

impl LogAggregator {
    pub fn new(max_size: usize) -> Self {
        Self {
            api: Mutex::new(LogBuffer::new(max_size)),
            rest: Mutex::new(LogBuffer::new(max_size)),
        }
    }

    pub fn insert(&self, entry: LogEntry) {
        match entry {
            LogEntry::Api(entry) => lock(&self.api).push(entry),
            LogEntry::Rest(entry) => lock(&self.rest).push(entry),
        }
    }

    pub fn clear(&self, kind: LogKind) {
        match kind {
            LogKind::Api => lock(&self.api).clear(),
            LogKind::Rest => lock(&self.rest).clear(),
        }
    }

    pub fn len(&self, kind: LogKind) -> usize {
        match kind {
            LogKind::Api => lock(&self.api).len(),
            LogKind::Rest => lock(&self.rest).len(),
        }
    }

    pub fn api_snapshot(&self) -> Vec<ApiLogEntry> {
        lock(&self.api).snapshot()
    }

    pub fn rest_snapshot(&self) -> Vec<RestLogEntry> {
        lock(&self.rest).snapshot()
    }

    pub fn stats(&self, kind: LogKind) -> LogStats {
        match kind {
            LogKind::Api => {
                let buffer = lock(&self.api);
                LogStats::collect(buffer.iter().map(|e| (e.success, e.duration)))
            }
            LogKind::Rest => {
                let buffer = lock(&self.rest);
                LogStats::collect(buffer.iter().map(|e| (e.success, e.duration)))
            }
        }
    }
}

// Buffers hold plain data, so a poisoned lock is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic operation decoded from a backend REST call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Rpc,
    Auth,
    Realtime,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Rpc => "RPC",
            Operation::Auth => "AUTH",
            Operation::Realtime => "REALTIME",
        }
    }

    /// CRUD verb mapping for table endpoints. Unknown verbs read as SELECT.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" => Operation::Insert,
            "PATCH" => Operation::Update,
            "DELETE" => Operation::Delete,
            _ => Operation::Select,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything observed about one settled fetch call. Never stored.
#[derive(Debug, Clone)]
pub struct RawCallRecord {
    pub id: String,
    /// Epoch milliseconds at call start.
    pub started_at: i64,
    pub duration_ms: u64,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub success: bool,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub error: Option<String>,
}

/// A call that did not target the backend REST surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogEntry {
    pub id: String,
    pub timestamp: i64,
    pub duration: u64,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RawCallRecord> for ApiLogEntry {
    fn from(raw: RawCallRecord) -> Self {
        Self {
            id: raw.id,
            timestamp: raw.started_at,
            duration: raw.duration_ms,
            method: raw.method,
            url: raw.url,
            status: raw.status,
            success: raw.success,
            request_body: raw.request_body,
            response_body: raw.response_body,
            error: raw.error,
        }
    }
}

/// A call decoded against the backend REST convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestLogEntry {
    pub id: String,
    pub timestamp: i64,
    pub duration: u64,
    pub operation: Operation,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    Api,
    Rest,
}

/// A finished, classified entry as handed to buffers and subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LogEntry {
    Api(ApiLogEntry),
    Rest(RestLogEntry),
}

impl LogEntry {
    pub fn kind(&self) -> LogKind {
        match self {
            LogEntry::Api(_) => LogKind::Api,
            LogEntry::Rest(_) => LogKind::Rest,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LogEntry::Api(entry) => &entry.id,
            LogEntry::Rest(entry) => &entry.id,
        }
    }

    pub fn success(&self) -> bool {
        match self {
            LogEntry::Api(entry) => entry.success,
            LogEntry::Rest(entry) => entry.success,
        }
    }

    pub fn duration(&self) -> u64 {
        match self {
            LogEntry::Api(entry) => entry.duration,
            LogEntry::Rest(entry) => entry.duration,
        }
    }
}

/// Returns at most `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

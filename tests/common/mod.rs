//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use fetch_inspector::{Config, Fetch, FetchError, FetchRequest, FetchResponse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const DOMAIN: &str = "example-backend.co";
pub const BASE: &str = "https://proj.example-backend.co";

/// What the scripted primitive does for one URL.
#[derive(Clone)]
pub enum Reply {
    Respond { status: u16, body: String, delay: Duration },
    Fail(String),
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Respond {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(body: &str, delay: Duration) -> Self {
        Reply::Respond {
            status: 200,
            body: body.to_string(),
            delay,
        }
    }
}

/// In-memory fetch primitive answering from a script keyed by URL.
pub struct ScriptedFetch {
    replies: Mutex<HashMap<String, Reply>>,
    calls: AtomicUsize,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn script(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Reply::status(404, ""));

        match reply {
            Reply::Respond { status, body, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(FetchResponse {
                    status,
                    headers: vec![("content-range".to_string(), "0-0/*".to_string())],
                    body: body.into(),
                })
            }
            Reply::Fail(message) => Err(FetchError::Aborted(message)),
        }
    }
}

pub fn dev_config() -> Config {
    Config::development(DOMAIN)
}

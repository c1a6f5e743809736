use crate::error::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, RwLock};

/// An outgoing HTTP call as the application describes it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl FetchResponse {
    /// 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The request primitive every HTTP call goes through.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;

    /// Whether this primitive already reports to an inspector.
    fn is_instrumented(&self) -> bool {
        false
    }
}

/// Replaceable entry point that application code calls instead of a
/// concrete client.
pub struct FetchHandle {
    current: RwLock<Arc<dyn Fetch>>,
}

impl FetchHandle {
    pub fn new(inner: Arc<dyn Fetch>) -> Self {
        Self {
            current: RwLock::new(inner),
        }
    }

    pub fn current(&self) -> Arc<dyn Fetch> {
        let current = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&current)
    }

    pub fn is_instrumented(&self) -> bool {
        self.current().is_instrumented()
    }

    /// Swaps in `next`, returning the previously installed primitive.
    pub fn replace(&self, next: Arc<dyn Fetch>) -> Arc<dyn Fetch> {
        let mut current = self.current.write().unwrap_or_else(|p| p.into_inner());
        std::mem::replace(&mut *current, next)
    }

    /// Wraps the current primitive unless it is already instrumented.
    ///
    /// Returns the unwrapped original on success.
    pub fn wrap_with<F>(&self, wrap: F) -> Option<Arc<dyn Fetch>>
    where
        F: FnOnce(Arc<dyn Fetch>) -> Arc<dyn Fetch>,
    {
        let mut current = self.current.write().unwrap_or_else(|p| p.into_inner());
        if current.is_instrumented() {
            return None;
        }

        let original = Arc::clone(&current);
        *current = wrap(Arc::clone(&original));
        Some(original)
    }

    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let fetch = self.current();
        fetch.fetch(request).await
    }
}

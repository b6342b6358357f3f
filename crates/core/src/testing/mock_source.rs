//! Mock book source for testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::book::BookFragment;
use crate::source::{BookSource, SourceError};

/// Mock implementation of the BookSource trait.
///
/// Answers every lookup with the configured fragment, or `NotFound` when
/// none is set. Records each ISBN it is asked about.
///
/// # Example
///
/// ```rust,ignore
/// use bookshelf_core::testing::{fixtures, MockBookSource};
///
/// let source = MockBookSource::new("Google Books");
/// source.set_fragment(fixtures::fragment("Google Books", "Mort")).await;
///
/// let fragment = source.fetch("9780552131063").await?;
/// assert_eq!(source.invocation_count().await, 1);
/// ```
pub struct MockBookSource {
    name: String,
    /// Fragment returned for every lookup; `None` answers `NotFound`.
    fragment: Arc<RwLock<Option<BookFragment>>>,
    /// If set, the next lookup fails with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
    /// Simulated response latency.
    delay: Arc<RwLock<Option<Duration>>>,
    /// ISBNs looked up, in call order.
    invocations: Arc<RwLock<Vec<String>>>,
}

impl MockBookSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragment: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            invocations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a source that already answers with `fragment`.
    pub fn with_fragment(name: impl Into<String>, fragment: BookFragment) -> Self {
        let mut source = Self::new(name);
        source.fragment = Arc::new(RwLock::new(Some(fragment)));
        source
    }

    pub async fn set_fragment(&self, fragment: BookFragment) {
        *self.fragment.write().await = Some(fragment);
    }

    /// Answer `NotFound` from now on.
    pub async fn clear_fragment(&self) {
        *self.fragment.write().await = None;
    }

    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn invocations(&self) -> Vec<String> {
        self.invocations.read().await.clone()
    }

    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }
}

#[async_trait]
impl BookSource for MockBookSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        self.invocations.write().await.push(isbn.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.fragment
            .read()
            .await
            .clone()
            .ok_or_else(|| SourceError::NotFound(isbn.to_string()))
    }
}

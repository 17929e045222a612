//! Per-run classification memo
//!
//! Categories are assumed phrase-deterministic: repeated mentions of the
//! same normalized phrase must agree on category (and therefore URI) within
//! one pipeline run. This decorator pins the first classification outcome,
//! including the `otro` fallback after a provider failure, for the lifetime
//! of the run.
//!
//! Uses the moka crate for a thread-safe, async-compatible cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::warn;

use arca_core::{normalize_phrase, Category, InferenceProvider, Result, ScoredPhrase};

/// Memo statistics for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

/// Decorator memoizing `classify` per normalized phrase.
///
/// Date inference and keyword extraction pass through untouched; their
/// inputs are whole record texts and never repeat within a run.
pub struct MemoizedProvider<P> {
    inner: P,
    cache: Cache<String, String>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<P> MemoizedProvider<P> {
    /// Wrap a provider with a fresh memo
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Cache::new(100_000),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Hit/miss counters accumulated so far
    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<P: InferenceProvider> InferenceProvider for MemoizedProvider<P> {
    async fn infer_date_range(&self, text: &str) -> Result<String> {
        self.inner.infer_date_range(text).await
    }

    async fn extract_keywords(&self, text: &str, max_phrases: usize) -> Result<Vec<ScoredPhrase>> {
        self.inner.extract_keywords(text, max_phrases).await
    }

    async fn classify(&self, phrase: &str) -> Result<String> {
        let key = normalize_phrase(phrase);

        if let Some(token) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(token);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        // A failed call degrades to `otro`, and that outcome is pinned too:
        // the same phrase must not classify differently later in the run.
        let token = match self.inner.classify(phrase).await {
            Ok(token) => token,
            Err(e) => {
                warn!(phrase = %key, error = %e, "classification failed, falling back to otro");
                Category::Otro.as_str().to_string()
            }
        };

        self.cache.insert(key, token.clone()).await;
        Ok(token)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arca_core::ArcaError;

    struct CountingProvider {
        calls: Arc<AtomicU64>,
        fail: bool,
    }

    #[async_trait]
    impl InferenceProvider for CountingProvider {
        async fn infer_date_range(&self, _text: &str) -> Result<String> {
            Ok("1700-01-01,1799-12-31".to_string())
        }

        async fn extract_keywords(
            &self,
            _text: &str,
            _max_phrases: usize,
        ) -> Result<Vec<ScoredPhrase>> {
            Ok(Vec::new())
        }

        async fn classify(&self, _phrase: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                Err(ArcaError::LlmError("boom".to_string()))
            } else {
                Ok("lugar".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_repeated_phrases_hit_the_memo() {
        let calls = Arc::new(AtomicU64::new(0));
        let memo = MemoizedProvider::new(CountingProvider {
            calls: calls.clone(),
            fail: false,
        });

        assert_eq!(memo.classify("Cusco").await.unwrap(), "lugar");
        // Normalization folds case and spacing into the same key
        assert_eq!(memo.classify("  CUSCO ").await.unwrap(), "lugar");
        assert_eq!(memo.classify("cusco").await.unwrap(), "lugar");

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        let stats = memo.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_failure_pins_otro_for_the_run() {
        let calls = Arc::new(AtomicU64::new(0));
        let memo = MemoizedProvider::new(CountingProvider {
            calls: calls.clone(),
            fail: true,
        });

        assert_eq!(memo.classify("Cusco").await.unwrap(), "otro");
        assert_eq!(memo.classify("Cusco").await.unwrap(), "otro");
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}

//! No-op cache implementation.

use async_trait::async_trait;
use fundamentals_core::DocumentCache;
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `None` and `put` discards the document. Useful for
/// disabling caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentCache for NoopCache {
    async fn get(&self, _url: &str) -> Option<String> {
        trace!("NoopCache: get called, returning None");
        None
    }

    async fn put(&self, _url: &str, _content: &str) {
        trace!("NoopCache: put called, doing nothing");
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> usize {
        trace!("NoopCache: invalidate_stale called, returning 0");
        0
    }

    async fn clear(&self) {
        trace!("NoopCache: clear called, doing nothing");
    }
}

//! Cache trait for storing fetched documents.
//!
//! This module defines the [`DocumentCache`] trait. Entries are keyed by the
//! URL they were fetched from, so both primary documents and individual
//! statement report pages can be cached.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Trait for caching fetched documents.
///
/// Implementations must be internally synchronised; the fetcher shares one
/// cache across all concurrent fetches of a run.
#[async_trait]
pub trait DocumentCache: Send + Sync + Debug {
    /// Returns the cached body for `url`, or `None` if absent or expired.
    async fn get(&self, url: &str) -> Option<String>;

    /// Stores the body fetched from `url`.
    async fn put(&self, url: &str, content: &str);

    /// Removes entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> usize;

    /// Clears all cached documents.
    async fn clear(&self);
}

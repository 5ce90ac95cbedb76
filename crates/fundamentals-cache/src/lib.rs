#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for fetched filing documents.
//!
//! This crate provides implementations of the [`DocumentCache`] trait from
//! `fundamentals-core`:
//!
//! - [`InMemoryCache`] - URL-keyed in-memory cache with optional TTL
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use fundamentals_core::DocumentCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;

//! Transparent query-result caching for database connections.
//!
//! [`CachingConnection`] wraps any [`recall_core::Connection`] and serves
//! repeated read statements from an in-memory cache of materialized
//! results, keyed by statement text and bound parameters. Any statement
//! that might mutate data invalidates the whole cache, keeping cached
//! rows consistent with everything written through the same wrapper.
//!
//! The cache is bounded (LRU eviction) and time-expiring, with defaults
//! of 1000 entries and a 10 minute TTL.

mod classify;
mod connection;
mod key;
mod snapshot;
mod stats;
mod store;

pub use classify::{LexicalClassifier, StatementClassifier};
pub use connection::{CachedStatement, CachingConnection};
pub use key::StatementKey;
pub use snapshot::{ResultSnapshot, SnapshotCursor};
pub use stats::CacheStats;
pub use store::{CacheConfig, QueryCache};

//! Stale-while-revalidate response cache.
//!
//! Responses are keyed by endpoint string and kept in two tiers:
//! - a process-local map, fastest, gone when the process exits
//! - a durable key-value store (SQLite by default), scoped by a key prefix
//!
//! Views read through the cache on mount and revalidate in the background;
//! see `crate::query` for the consumer side.

mod entry;
mod layer;
mod store;

pub use entry::CacheEntry;
pub use layer::{ApiCache, DEFAULT_PREFIX};
pub use store::{DurableStore, NoopStore, SqliteStore};
#[cfg(test)]
pub use store::MemoryStore;

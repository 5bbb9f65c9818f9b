//! Two-tier read-through cache shared by every view.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::entry::CacheEntry;
use super::store::DurableStore;
use crate::api::ApiError;

/// Default key prefix for entries in the durable tier.
pub const DEFAULT_PREFIX: &str = "fieldops_cache:";

/// Read-through cache with a process-local tier and a durable tier.
///
/// Construct once at startup and hand clones to whatever needs it; clones
/// share both tiers. Entries never expire on their own, they are replaced by
/// newer fetches or removed through `invalidate`.
pub struct ApiCache {
  memory: Arc<Mutex<HashMap<String, CacheEntry>>>,
  durable: Arc<dyn DurableStore>,
  prefix: Arc<str>,
}

impl ApiCache {
  /// Create a cache over the given durable store.
  pub fn new(durable: impl DurableStore + 'static, prefix: &str) -> Self {
    Self {
      memory: Arc::new(Mutex::new(HashMap::new())),
      durable: Arc::new(durable),
      prefix: Arc::from(prefix),
    }
  }

  /// Create a cache sharing an already-shared durable store.
  pub fn with_shared_store(durable: Arc<dyn DurableStore>, prefix: &str) -> Self {
    Self {
      memory: Arc::new(Mutex::new(HashMap::new())),
      durable,
      prefix: Arc::from(prefix),
    }
  }

  fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // The map holds plain data, so a panic elsewhere cannot leave it torn
    self.memory.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn durable_key(&self, endpoint: &str) -> String {
    format!("{}{}", self.prefix, endpoint)
  }

  /// Resolve the best known entry for `endpoint`.
  ///
  /// Checks the process-local tier first, then the durable tier. A durable
  /// hit is promoted so the next lookup is served from memory.
  pub fn lookup(&self, endpoint: &str) -> Option<CacheEntry> {
    if let Some(entry) = self.memory().get(endpoint) {
      debug!(endpoint, "cache hit (memory)");
      return Some(entry.clone());
    }

    let raw = match self.durable.get_item(&self.durable_key(endpoint)) {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        debug!(endpoint, "cache miss");
        return None;
      }
      Err(e) => {
        warn!(endpoint, error = %e, "durable cache read failed");
        return None;
      }
    };

    match serde_json::from_str::<CacheEntry>(&raw) {
      Ok(entry) => {
        debug!(endpoint, "cache hit (durable), promoting");
        self.memory().insert(endpoint.to_string(), entry.clone());
        Some(entry)
      }
      Err(e) => {
        debug!(endpoint, error = %e, "ignoring unreadable durable entry");
        None
      }
    }
  }

  /// Record a fresh payload for `endpoint` in both tiers.
  ///
  /// A durable write failure (quota, disabled storage) is logged and
  /// otherwise ignored; the memory tier still holds the entry.
  pub fn store(&self, endpoint: &str, data: Value) {
    let entry = CacheEntry::now(data);

    match serde_json::to_string(&entry) {
      Ok(raw) => {
        if let Err(e) = self.durable.set_item(&self.durable_key(endpoint), &raw) {
          warn!(endpoint, error = %e, "durable cache write failed");
        }
      }
      Err(e) => warn!(endpoint, error = %e, "failed to encode cache entry"),
    }

    self.memory().insert(endpoint.to_string(), entry);
  }

  /// Whether either tier holds `endpoint`. Does not promote.
  pub fn contains(&self, endpoint: &str) -> bool {
    if self.memory().contains_key(endpoint) {
      return true;
    }
    matches!(
      self.durable.get_item(&self.durable_key(endpoint)),
      Ok(Some(_))
    )
  }

  /// Remove one endpoint, or everything under the prefix when `None`.
  ///
  /// Queries that already hold data keep showing it until their next fetch.
  pub fn invalidate(&self, endpoint: Option<&str>) {
    match endpoint {
      Some(endpoint) => {
        self.memory().remove(endpoint);
        if let Err(e) = self.durable.remove_item(&self.durable_key(endpoint)) {
          warn!(endpoint, error = %e, "durable cache remove failed");
        }
        debug!(endpoint, "invalidated");
      }
      None => {
        self.memory().clear();
        self.remove_durable_where(|_| true);
        debug!("invalidated all entries");
      }
    }
  }

  /// Remove every entry whose endpoint starts with `prefix`.
  pub fn invalidate_matching(&self, prefix: &str) {
    self.memory().retain(|endpoint, _| !endpoint.starts_with(prefix));
    self.remove_durable_where(|endpoint| endpoint.starts_with(prefix));
    debug!(prefix, "invalidated matching entries");
  }

  fn remove_durable_where(&self, predicate: impl Fn(&str) -> bool) {
    let keys = match self.durable.keys() {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "failed to enumerate durable cache");
        return;
      }
    };

    for key in keys {
      let Some(endpoint) = key.strip_prefix(&*self.prefix) else {
        continue;
      };
      if predicate(endpoint) {
        if let Err(e) = self.durable.remove_item(&key) {
          warn!(key, error = %e, "durable cache remove failed");
        }
      }
    }
  }

  /// Endpoints held in the durable tier with their capture times, oldest first.
  pub fn entries(&self) -> Vec<(String, DateTime<Utc>)> {
    let keys = match self.durable.keys() {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "failed to enumerate durable cache");
        return Vec::new();
      }
    };

    let mut entries: Vec<(String, DateTime<Utc>)> = keys
      .iter()
      .filter_map(|key| {
        let endpoint = key.strip_prefix(&*self.prefix)?;
        let raw = self.durable.get_item(key).ok()??;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        Some((endpoint.to_string(), entry.timestamp))
      })
      .collect();
    entries.sort_by_key(|(_, at)| *at);
    entries
  }

  /// Warm both tiers for an endpoint that is not cached yet.
  ///
  /// Existing entries are never overwritten and fetch errors are swallowed.
  pub async fn warm<F, Fut>(&self, endpoint: &str, fetcher: F)
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
  {
    if self.contains(endpoint) {
      return;
    }

    match fetcher().await {
      Ok(data) => {
        // Another fetch may have landed while this one was in flight
        if !self.contains(endpoint) {
          self.store(endpoint, data);
        }
      }
      Err(e) => debug!(endpoint, error = %e, "prefetch failed"),
    }
  }

  /// Fire-and-forget version of `warm`, run on the tokio runtime.
  pub fn prefetch<F, Fut>(&self, endpoint: impl Into<String>, fetcher: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    let cache = self.clone();
    let endpoint = endpoint.into();
    tokio::spawn(async move {
      cache.warm(&endpoint, fetcher).await;
    });
  }
}

impl Clone for ApiCache {
  fn clone(&self) -> Self {
    Self {
      memory: Arc::clone(&self.memory),
      durable: Arc::clone(&self.durable),
      prefix: Arc::clone(&self.prefix),
    }
  }
}

//! Cache-backed query handle for views.
//!
//! `ApiQuery<T>` gives a view the best value it already knows for an
//! endpoint the moment it is created, then revalidates over the network in
//! the background. Results arrive over a channel and are applied when the
//! view polls, typically on every tick of the event loop.
//!
//! # Example
//!
//! ```ignore
//! let mut query: ApiQuery<Vec<Job>> =
//!     ApiQuery::new(endpoints::jobs(None), cache.clone(), api.clone(), QueryOptions::default());
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! if query.is_loading() {
//!     render_spinner();
//! } else if let Some(jobs) = query.data() {
//!     render_jobs(jobs, query.error());
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ApiCall, ApiError};
use crate::cache::ApiCache;

/// Options accepted when mounting a query.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  /// When false the query never fetches and holds no data.
  pub enabled: bool,
  /// Age after which data is flagged stale. Advisory only.
  pub stale_after: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      enabled: true,
      stale_after: Duration::minutes(5),
    }
  }
}

impl QueryOptions {
  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn stale_after(mut self, stale_after: Duration) -> Self {
    self.stale_after = stale_after;
    self
  }
}

type FetchResult = Result<Value, ApiError>;

/// Stale-while-revalidate query bound to one endpoint at a time.
pub struct ApiQuery<T> {
  endpoint: String,
  options: QueryOptions,
  cache: ApiCache,
  api: Arc<dyn ApiCall>,
  data: Option<T>,
  loading: bool,
  error: Option<ApiError>,
  /// Capture time of the payload behind `data`
  fetched_at: Option<DateTime<Utc>>,
  /// Pending background fetch; replacing it discards the old result
  receiver: Option<mpsc::UnboundedReceiver<FetchResult>>,
}

impl<T: DeserializeOwned> ApiQuery<T> {
  /// Mount a query for `endpoint`.
  ///
  /// Cached data (either tier) is available immediately; a fetch is started
  /// in the background unless the query is disabled. Must be called from
  /// within a tokio runtime when enabled.
  pub fn new(
    endpoint: impl Into<String>,
    cache: ApiCache,
    api: Arc<dyn ApiCall>,
    options: QueryOptions,
  ) -> Self {
    let mut query = Self {
      endpoint: endpoint.into(),
      options,
      cache,
      api,
      data: None,
      loading: false,
      error: None,
      fetched_at: None,
      receiver: None,
    };
    query.mount();
    query
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  /// Most recent good value: fetched, or cached if no fetch has landed yet.
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  /// True only while fetching with nothing to show.
  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// Last fetch failure. Does not imply `data` is gone.
  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Whether a background fetch is still outstanding.
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// Data older than `stale_after`. It is still shown.
  pub fn is_stale(&self) -> bool {
    self
      .fetched_at
      .map(|at| Utc::now() - at > self.options.stale_after)
      .unwrap_or(false)
  }

  /// Point the query at another endpoint. No-op if unchanged.
  pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
    let endpoint = endpoint.into();
    if endpoint != self.endpoint {
      self.endpoint = endpoint;
      self.mount();
    }
  }

  /// Enable or disable fetching. No-op if unchanged.
  pub fn set_enabled(&mut self, enabled: bool) {
    if enabled != self.options.enabled {
      self.options.enabled = enabled;
      self.mount();
    }
  }

  /// Edit the shown data in place without touching the cache.
  ///
  /// Used for optimistic updates; the next fetch overwrites it.
  pub fn update(&mut self, f: impl FnOnce(&mut T)) {
    if let Some(data) = self.data.as_mut() {
      f(data);
    }
  }

  /// Start a background fetch, superseding any pending one.
  ///
  /// Unlike mounting, this ignores the enabled gate.
  pub fn revalidate(&mut self) {
    if self.data.is_none() {
      self.loading = true;
    }
    self.start_fetch();
  }

  /// Fetch now and return the fresh value.
  ///
  /// Ignores the enabled gate and supersedes any pending background fetch.
  /// On failure the error is returned and neither `data` nor `error` change;
  /// `loading` is cleared since no fetch remains in flight.
  pub async fn refetch(&mut self) -> Result<T, ApiError>
  where
    T: Clone,
  {
    self.receiver = None;
    let fetched = self
      .api
      .call(&self.endpoint)
      .await
      .and_then(|value| self.decode(&value).map(|data| (value, data)));
    let (value, data) = match fetched {
      Ok(fetched) => fetched,
      Err(e) => {
        // The superseded fetch is gone, so nothing is loading any more
        self.loading = false;
        return Err(e);
      }
    };
    self.cache.store(&self.endpoint, value);
    self.data = Some(data.clone());
    self.fetched_at = Some(Utc::now());
    self.error = None;
    self.loading = false;
    Ok(data)
  }

  /// Apply a finished background fetch, if any.
  ///
  /// Returns `true` if the state changed. Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        self.apply(result);
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Fetch task ended without sending (panicked)
        self.receiver = None;
        self.apply(Err(ApiError::Cancelled));
        true
      }
    }
  }

  /// Wait for the pending background fetch and apply it.
  ///
  /// Returns `false` when nothing was pending.
  pub async fn wait(&mut self) -> bool {
    let Some(receiver) = self.receiver.as_mut() else {
      return false;
    };
    let result = receiver.recv().await.unwrap_or(Err(ApiError::Cancelled));
    self.receiver = None;
    self.apply(result);
    true
  }

  /// Resolve cached state for the current endpoint and kick off a fetch.
  fn mount(&mut self) {
    // Whatever was in flight belongs to the previous mount
    self.receiver = None;
    self.error = None;

    if !self.options.enabled {
      self.data = None;
      self.fetched_at = None;
      self.loading = false;
      return;
    }

    let cached = self.cache.lookup(&self.endpoint).and_then(|entry| {
      match entry.decode::<T>() {
        Ok(data) => Some((data, entry.timestamp)),
        Err(e) => {
          debug!(endpoint = %self.endpoint, error = %e, "cached payload has unexpected shape");
          None
        }
      }
    });

    match cached {
      Some((data, at)) => {
        self.data = Some(data);
        self.fetched_at = Some(at);
        self.loading = false;
      }
      None => {
        self.data = None;
        self.fetched_at = None;
        self.loading = true;
      }
    }

    self.start_fetch();
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let future = self.api.call(&self.endpoint);
    tokio::spawn(async move {
      // Ignore send errors - the query may have been remounted or dropped
      let _ = tx.send(future.await);
    });
  }

  fn apply(&mut self, result: FetchResult) {
    self.loading = false;

    let value = match result {
      Ok(value) => value,
      Err(e) => {
        debug!(endpoint = %self.endpoint, error = %e, "fetch failed, keeping last data");
        self.error = Some(e);
        return;
      }
    };

    match self.decode(&value) {
      Ok(data) => {
        self.cache.store(&self.endpoint, value);
        self.data = Some(data);
        self.fetched_at = Some(Utc::now());
        self.error = None;
      }
      Err(e) => self.error = Some(e),
    }
  }

  fn decode(&self, value: &Value) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::Decode {
      endpoint: self.endpoint.clone(),
      message: e.to_string(),
    })
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ApiQuery<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiQuery")
      .field("endpoint", &self.endpoint)
      .field("data", &self.data)
      .field("loading", &self.loading)
      .field("error", &self.error)
      .field("fetched_at", &self.fetched_at)
      .finish_non_exhaustive()
  }
}

//! Scripted `ApiCall` for tests.

use super::{ApiCall, ApiError};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replies to each endpoint with queued responses, then repeats the last one.
#[derive(Default)]
pub struct MockApi {
  responses: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
  delays: Mutex<HashMap<String, Duration>>,
  calls: AtomicUsize,
}

impl MockApi {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a response for `endpoint`.
  pub fn reply(&self, endpoint: &str, response: Result<Value, ApiError>) -> &Self {
    self
      .responses
      .lock()
      .unwrap()
      .entry(endpoint.to_string())
      .or_default()
      .push_back(response);
    self
  }

  /// Delay every response for `endpoint`.
  pub fn delay(&self, endpoint: &str, delay: Duration) -> &Self {
    self
      .delays
      .lock()
      .unwrap()
      .insert(endpoint.to_string(), delay);
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn network_error(endpoint: &str) -> ApiError {
    ApiError::Network {
      endpoint: endpoint.to_string(),
      message: "connection refused".to_string(),
    }
  }
}

impl ApiCall for MockApi {
  fn call(&self, endpoint: &str) -> BoxFuture<'static, Result<Value, ApiError>> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let response = {
      let mut responses = self.responses.lock().unwrap();
      match responses.get_mut(endpoint) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
      }
    }
    .unwrap_or_else(|| Err(Self::network_error(endpoint)));
    let delay = self.delays.lock().unwrap().get(endpoint).copied();

    Box::pin(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      response
    })
  }
}

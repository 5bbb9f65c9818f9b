//! REST backend access.

pub mod client;
pub mod endpoints;
#[cfg(test)]
pub mod mock;
pub mod types;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub use client::ApiClient;

/// Failure of a request against the backend.
///
/// Cloneable so a query can keep the last error alongside its data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  #[error("request to {endpoint} failed: {message}")]
  Network { endpoint: String, message: String },
  #[error("{endpoint} returned {status}: {message}")]
  Status {
    endpoint: String,
    status: u16,
    message: String,
  },
  #[error("not authorized for {endpoint}; check FIELDOPS_API_TOKEN")]
  Unauthorized { endpoint: String },
  #[error("unexpected response from {endpoint}: {message}")]
  Decode { endpoint: String, message: String },
  #[error("invalid endpoint '{0}'")]
  InvalidEndpoint(String),
  #[error("request ended without a result")]
  Cancelled,
}

/// The authenticated GET used by queries and prefetching.
///
/// Status codes are classified by the implementor; callers only see
/// `Ok(payload)` or an `ApiError`.
pub trait ApiCall: Send + Sync {
  fn call(&self, endpoint: &str) -> BoxFuture<'static, Result<Value, ApiError>>;
}

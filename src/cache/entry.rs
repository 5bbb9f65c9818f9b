//! A single cached response.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Last-known payload for an endpoint plus the moment it was captured.
///
/// The durable tier stores this struct as JSON, so the field names are part
/// of the on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub data: Value,
  pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
  /// Capture `data` as of now.
  pub fn now(data: Value) -> Self {
    Self {
      data,
      timestamp: Utc::now(),
    }
  }

  /// Decode the payload into the caller's expected shape.
  pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
    T::deserialize(&self.data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_serialized_shape() {
    let entry = CacheEntry::now(json!([1, 2]));
    let encoded = serde_json::to_value(&entry).unwrap();
    assert_eq!(encoded["data"], json!([1, 2]));
    assert!(encoded["timestamp"].is_string());

    let back: CacheEntry = serde_json::from_value(encoded).unwrap();
    assert_eq!(back, entry);
  }

  #[test]
  fn test_decode_mismatch_is_error() {
    let entry = CacheEntry::now(json!("text"));
    assert!(entry.decode::<Vec<u32>>().is_err());
    assert_eq!(entry.decode::<String>().unwrap(), "text");
  }
}

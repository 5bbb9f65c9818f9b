use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Info,
  Error,
}

/// Short-lived message shown in the footer
#[derive(Debug, Clone)]
pub struct Toast {
  pub message: String,
  pub level: ToastLevel,
  shown_at: Instant,
}

impl Toast {
  pub fn info(message: impl Into<String>) -> Self {
    Self::new(message, ToastLevel::Info)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(message, ToastLevel::Error)
  }

  fn new(message: impl Into<String>, level: ToastLevel) -> Self {
    Self {
      message: message.into(),
      level,
      shown_at: Instant::now(),
    }
  }

  pub fn is_expired(&self) -> bool {
    self.shown_at.elapsed() >= TOAST_TTL
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fresh_toast_not_expired() {
    let toast = Toast::error("boom");
    assert_eq!(toast.level, ToastLevel::Error);
    assert!(!toast.is_expired());
  }

  #[test]
  fn test_old_toast_expires() {
    let mut toast = Toast::info("saved");
    toast.shown_at = Instant::now() - TOAST_TTL;
    assert!(toast.is_expired());
  }
}

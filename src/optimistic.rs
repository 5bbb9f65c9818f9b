//! Tentative state with a rollback snapshot.
//!
//! The UI shows a change before the backend confirms it; a failed request
//! restores whatever was shown before.

/// A value that may hold an unconfirmed change.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimistic<T> {
  value: T,
  snapshot: Option<T>,
}

impl<T: Clone> Optimistic<T> {
  pub fn new(value: T) -> Self {
    Self {
      value,
      snapshot: None,
    }
  }

  /// Current value, confirmed or not.
  pub fn value(&self) -> &T {
    &self.value
  }

  /// Whether a change is waiting on confirmation.
  pub fn is_pending(&self) -> bool {
    self.snapshot.is_some()
  }

  /// Show `value` tentatively.
  ///
  /// The snapshot taken by the first pending change is kept, so a rollback
  /// always returns to the last confirmed value.
  pub fn apply(&mut self, value: T) {
    if self.snapshot.is_none() {
      self.snapshot = Some(self.value.clone());
    }
    self.value = value;
  }

  /// The backend accepted the change.
  pub fn commit(&mut self) {
    self.snapshot = None;
  }

  /// The backend rejected the change; restore the snapshot.
  ///
  /// Returns the value that was discarded, if a change was pending.
  pub fn rollback(&mut self) -> Option<T> {
    let snapshot = self.snapshot.take()?;
    Some(std::mem::replace(&mut self.value, snapshot))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_commit_keeps_new_value() {
    let mut available = Optimistic::new(false);
    available.apply(true);
    assert!(available.is_pending());
    available.commit();
    assert!(!available.is_pending());
    assert!(*available.value());
  }

  #[test]
  fn test_rollback_restores_snapshot() {
    let mut available = Optimistic::new(false);
    available.apply(true);
    assert_eq!(available.rollback(), Some(true));
    assert!(!*available.value());
    assert!(!available.is_pending());
  }

  #[test]
  fn test_first_snapshot_wins() {
    let mut status = Optimistic::new("pending".to_string());
    status.apply("assigned".to_string());
    status.apply("accepted".to_string());
    status.rollback();
    assert_eq!(status.value(), "pending");
  }

  #[test]
  fn test_rollback_without_change_is_noop() {
    let mut value = Optimistic::new(3);
    assert_eq!(value.rollback(), None);
    assert_eq!(*value.value(), 3);
  }
}

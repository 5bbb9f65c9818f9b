use crate::api::types::{InvoiceStatus, JobStatus};
use crate::query::ApiQuery;
use ratatui::prelude::Color;
use serde::de::DeserializeOwned;

/// Truncate a string to at most `max_len` characters, adding "..." if cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn job_status_color(status: JobStatus) -> Color {
  match status {
    JobStatus::Completed => Color::Green,
    JobStatus::InProgress | JobStatus::Accepted => Color::Yellow,
    JobStatus::Assigned => Color::Cyan,
    JobStatus::Declined | JobStatus::Cancelled => Color::Red,
    JobStatus::Pending | JobStatus::Unknown => Color::White,
  }
}

pub fn invoice_status_color(status: InvoiceStatus) -> Color {
  match status {
    InvoiceStatus::Paid => Color::Green,
    InvoiceStatus::Submitted => Color::Yellow,
    InvoiceStatus::Overdue => Color::Red,
    InvoiceStatus::Draft | InvoiceStatus::Unknown => Color::White,
  }
}

/// Short marker for a block title: fetching, stale, or failed.
///
/// Empty when the data is fresh and the last fetch succeeded.
pub fn query_badge<T: DeserializeOwned>(query: &ApiQuery<T>) -> String {
  if query.is_fetching() && query.data().is_some() {
    " ⟳".to_string()
  } else if query.is_loading() {
    " loading...".to_string()
  } else if query.error().is_some() {
    " ⚠ offline".to_string()
  } else if query.is_stale() {
    " (stale)".to_string()
  } else {
    String::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_counts_chars() {
    assert_eq!(truncate("Müller Straße 12", 9), "Müller...");
  }

  #[test]
  fn test_job_status_colors() {
    assert_eq!(job_status_color(JobStatus::Completed), Color::Green);
    assert_eq!(job_status_color(JobStatus::InProgress), Color::Yellow);
    assert_eq!(job_status_color(JobStatus::Declined), Color::Red);
    assert_eq!(job_status_color(JobStatus::Pending), Color::White);
  }

  #[test]
  fn test_invoice_status_colors() {
    assert_eq!(invoice_status_color(InvoiceStatus::Paid), Color::Green);
    assert_eq!(invoice_status_color(InvoiceStatus::Overdue), Color::Red);
  }
}

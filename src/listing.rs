//! Client-side filtering and sorting of fetched lists.

use crate::api::types::{Agent, Expense, Invoice, Job};
use std::cmp::Ordering;

/// Items that can be searched and sorted in a list view.
pub trait Listable {
  /// Text matched against the search box.
  fn search_text(&self) -> String;

  /// Compare two items by the named sort column.
  fn compare(&self, other: &Self, column: &str) -> Ordering;
}

/// Current search and sort settings of a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
  pub needle: String,
  columns: &'static [&'static str],
  column: usize,
  pub descending: bool,
}

impl ListFilter {
  pub fn new(columns: &'static [&'static str]) -> Self {
    Self {
      needle: String::new(),
      columns,
      column: 0,
      descending: false,
    }
  }

  pub fn column(&self) -> &'static str {
    self.columns.get(self.column).copied().unwrap_or("")
  }

  /// Move to the next sort column; after the last one, flip direction.
  pub fn cycle_sort(&mut self) {
    if self.columns.is_empty() {
      return;
    }
    self.column += 1;
    if self.column >= self.columns.len() {
      self.column = 0;
      self.descending = !self.descending;
    }
  }

  pub fn label(&self) -> String {
    let arrow = if self.descending { "↓" } else { "↑" };
    format!("{} {}", self.column(), arrow)
  }

  /// Indices of matching items, ordered. The input is left as is.
  pub fn apply<T: Listable>(&self, items: &[T]) -> Vec<usize> {
    let needle = self.needle.trim().to_lowercase();
    let mut indices: Vec<usize> = items
      .iter()
      .enumerate()
      .filter(|(_, item)| needle.is_empty() || item.search_text().to_lowercase().contains(&needle))
      .map(|(i, _)| i)
      .collect();

    let column = self.column();
    indices.sort_by(|&a, &b| {
      let ordering = items[a].compare(&items[b], column);
      if self.descending {
        ordering.reverse()
      } else {
        ordering
      }
    });
    indices
  }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
  a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Listable for Job {
  fn search_text(&self) -> String {
    format!(
      "{} {} {} {} {}",
      self.title,
      self.location,
      self.client.as_deref().unwrap_or(""),
      self.agent_name.as_deref().unwrap_or(""),
      self.status
    )
  }

  fn compare(&self, other: &Self, column: &str) -> Ordering {
    match column {
      "title" => self.title.cmp(&other.title),
      "status" => self.status.as_param().cmp(other.status.as_param()),
      // Unscheduled jobs sort last
      _ => match (&self.scheduled_date, &other.scheduled_date) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
      },
    }
  }
}

impl Listable for Agent {
  fn search_text(&self) -> String {
    format!("{} {} {}", self.name, self.email, self.skills.join(" "))
  }

  fn compare(&self, other: &Self, column: &str) -> Ordering {
    match column {
      "available" => other.available.cmp(&self.available),
      "load" => self.active_jobs.cmp(&other.active_jobs),
      _ => self.name.cmp(&other.name),
    }
  }
}

impl Listable for Invoice {
  fn search_text(&self) -> String {
    format!("{} {} {} {}", self.number, self.issuer, self.kind, self.status)
  }

  fn compare(&self, other: &Self, column: &str) -> Ordering {
    match column {
      "total" => cmp_f64(self.total(), other.total()),
      "number" => self.number.cmp(&other.number),
      _ => self.issued_date.cmp(&other.issued_date),
    }
  }
}

impl Listable for Expense {
  fn search_text(&self) -> String {
    format!("{} {}", self.description, self.category)
  }

  fn compare(&self, other: &Self, column: &str) -> Ordering {
    match column {
      "amount" => cmp_f64(self.amount, other.amount),
      "category" => self.category.cmp(&other.category),
      _ => self.date.cmp(&other.date),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn expense(id: &str, description: &str, category: &str, amount: f64, date: &str) -> Expense {
    Expense {
      id: id.to_string(),
      description: description.to_string(),
      category: category.to_string(),
      amount,
      date: date.to_string(),
      job_id: None,
      agent_id: None,
    }
  }

  fn sample() -> Vec<Expense> {
    vec![
      expense("1", "Fuel", "travel", 40.0, "2026-03-02"),
      expense("2", "Hotel", "travel", 120.0, "2026-03-01"),
      expense("3", "Cable", "parts", 15.5, "2026-03-03"),
    ]
  }

  const COLUMNS: &[&str] = &["date", "amount"];

  #[test]
  fn test_default_sort_by_first_column() {
    let items = sample();
    let filter = ListFilter::new(COLUMNS);
    assert_eq!(filter.apply(&items), vec![1, 0, 2]);
  }

  #[test]
  fn test_needle_is_case_insensitive() {
    let items = sample();
    let mut filter = ListFilter::new(COLUMNS);
    filter.needle = "TRAVEL".to_string();
    assert_eq!(filter.apply(&items), vec![1, 0]);
  }

  #[test]
  fn test_cycle_sort_wraps_and_flips() {
    let items = sample();
    let mut filter = ListFilter::new(COLUMNS);

    filter.cycle_sort();
    assert_eq!(filter.column(), "amount");
    assert_eq!(filter.apply(&items), vec![2, 0, 1]);

    filter.cycle_sort();
    assert_eq!(filter.column(), "date");
    assert!(filter.descending);
    assert_eq!(filter.apply(&items), vec![2, 0, 1]);
    assert_eq!(filter.label(), "date ↓");
  }

  #[test]
  fn test_apply_does_not_reorder_input() {
    let items = sample();
    let filter = ListFilter::new(COLUMNS);
    filter.apply(&items);
    assert_eq!(items[0].id, "1");
  }

  #[test]
  fn test_unscheduled_jobs_sort_last() {
    use crate::api::types::JobStatus;
    let job = |id: &str, date: Option<&str>| Job {
      id: id.to_string(),
      title: format!("Job {}", id),
      client: None,
      location: String::new(),
      status: JobStatus::Pending,
      scheduled_date: date.map(String::from),
      agent_id: None,
      agent_name: None,
      description: None,
    };
    let jobs = vec![job("a", None), job("b", Some("2026-05-01")), job("c", Some("2026-04-01"))];
    let filter = ListFilter::new(&["date"]);
    assert_eq!(filter.apply(&jobs), vec![2, 1, 0]);
  }
}

//! Payloads exchanged with the dispatch backend.
//!
//! The backend owns these shapes; only the fields the dashboard shows are
//! modelled, and unknown enum values deserialize to `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  Pending,
  Assigned,
  Accepted,
  InProgress,
  Completed,
  Declined,
  Cancelled,
  #[serde(other)]
  Unknown,
}

impl JobStatus {
  /// Statuses offered by the jobs view filter, in cycle order.
  pub const FILTERS: [JobStatus; 5] = [
    JobStatus::Pending,
    JobStatus::Assigned,
    JobStatus::Accepted,
    JobStatus::InProgress,
    JobStatus::Completed,
  ];

  /// Query-string form, as the backend expects it.
  pub fn as_param(&self) -> &'static str {
    match self {
      JobStatus::Pending => "pending",
      JobStatus::Assigned => "assigned",
      JobStatus::Accepted => "accepted",
      JobStatus::InProgress => "in_progress",
      JobStatus::Completed => "completed",
      JobStatus::Declined => "declined",
      JobStatus::Cancelled => "cancelled",
      JobStatus::Unknown => "unknown",
    }
  }
}

impl fmt::Display for JobStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      JobStatus::Pending => "Pending",
      JobStatus::Assigned => "Assigned",
      JobStatus::Accepted => "Accepted",
      JobStatus::InProgress => "In Progress",
      JobStatus::Completed => "Completed",
      JobStatus::Declined => "Declined",
      JobStatus::Cancelled => "Cancelled",
      JobStatus::Unknown => "Unknown",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub client: Option<String>,
  #[serde(default)]
  pub location: String,
  pub status: JobStatus,
  /// ISO 8601 date
  #[serde(default)]
  pub scheduled_date: Option<String>,
  #[serde(default)]
  pub agent_id: Option<String>,
  #[serde(default)]
  pub agent_name: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

/// Body for `POST /jobs`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewJob {
  pub title: String,
  pub location: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub client: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheduled_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl NewJob {
  pub fn validate(&self) -> Result<(), FormError> {
    require("title", &self.title)?;
    require("location", &self.location)
  }
}

// ============================================================================
// Agents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub available: bool,
  #[serde(default)]
  pub skills: Vec<String>,
  #[serde(default)]
  pub active_jobs: u32,
}

// ============================================================================
// Invoices
// ============================================================================

/// Who submitted the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
  Agent,
  Supplier,
}

impl InvoiceKind {
  pub fn as_param(&self) -> &'static str {
    match self {
      InvoiceKind::Agent => "agent",
      InvoiceKind::Supplier => "supplier",
    }
  }
}

impl fmt::Display for InvoiceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InvoiceKind::Agent => f.write_str("Agent"),
      InvoiceKind::Supplier => f.write_str("Supplier"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
  Draft,
  Submitted,
  Paid,
  Overdue,
  #[serde(other)]
  Unknown,
}

impl fmt::Display for InvoiceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      InvoiceStatus::Draft => "Draft",
      InvoiceStatus::Submitted => "Submitted",
      InvoiceStatus::Paid => "Paid",
      InvoiceStatus::Overdue => "Overdue",
      InvoiceStatus::Unknown => "Unknown",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub description: String,
  pub quantity: f64,
  pub unit_price: f64,
}

impl LineItem {
  pub fn amount(&self) -> f64 {
    self.quantity * self.unit_price
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: String,
  pub number: String,
  pub kind: InvoiceKind,
  /// Agent or supplier name
  #[serde(default)]
  pub issuer: String,
  #[serde(default)]
  pub job_id: Option<String>,
  pub status: InvoiceStatus,
  #[serde(default)]
  pub issued_date: String,
  #[serde(default)]
  pub line_items: Vec<LineItem>,
  /// Fraction, e.g. 0.2 for 20%
  #[serde(default)]
  pub tax_rate: f64,
}

impl Invoice {
  pub fn subtotal(&self) -> f64 {
    self.line_items.iter().map(LineItem::amount).sum()
  }

  pub fn tax(&self) -> f64 {
    self.subtotal() * self.tax_rate
  }

  pub fn total(&self) -> f64 {
    self.subtotal() + self.tax()
  }
}

/// Body for `POST /invoices`
#[derive(Debug, Clone, Serialize)]
pub struct NewInvoice {
  pub kind: InvoiceKind,
  pub issuer: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_id: Option<String>,
  pub line_items: Vec<LineItem>,
  pub tax_rate: f64,
}

impl NewInvoice {
  pub fn validate(&self) -> Result<(), FormError> {
    require("issuer", &self.issuer)?;
    if self.line_items.is_empty() {
      return Err(FormError::MissingField("line_items"));
    }
    for item in &self.line_items {
      require("description", &item.description)?;
      if item.quantity <= 0.0 {
        return Err(FormError::Invalid("quantity", "must be positive"));
      }
    }
    Ok(())
  }

  pub fn total(&self) -> f64 {
    let subtotal: f64 = self.line_items.iter().map(LineItem::amount).sum();
    subtotal * (1.0 + self.tax_rate)
  }
}

// ============================================================================
// Expenses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
  pub id: String,
  pub description: String,
  #[serde(default)]
  pub category: String,
  pub amount: f64,
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub job_id: Option<String>,
  #[serde(default)]
  pub agent_id: Option<String>,
}

/// Body for `POST /expenses`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewExpense {
  pub description: String,
  pub category: String,
  pub amount: f64,
  pub date: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_id: Option<String>,
}

impl NewExpense {
  pub fn validate(&self) -> Result<(), FormError> {
    require("description", &self.description)?;
    require("category", &self.category)?;
    require("date", &self.date)?;
    if self.amount <= 0.0 {
      return Err(FormError::Invalid("amount", "must be positive"));
    }
    Ok(())
  }
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSummary {
  pub total_jobs: u32,
  pub completed_jobs: u32,
  pub active_agents: u32,
  pub available_agents: u32,
  pub outstanding_invoices: f64,
  pub expenses_this_month: f64,
}

impl AnalyticsSummary {
  /// Completed share of all jobs, 0.0 when there are none.
  pub fn completion_rate(&self) -> f64 {
    if self.total_jobs == 0 {
      0.0
    } else {
      f64::from(self.completed_jobs) / f64::from(self.total_jobs)
    }
  }
}

// ============================================================================
// Form checks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
  #[error("{0} is required")]
  MissingField(&'static str),
  #[error("{0} {1}")]
  Invalid(&'static str, &'static str),
}

fn require(field: &'static str, value: &str) -> Result<(), FormError> {
  if value.trim().is_empty() {
    Err(FormError::MissingField(field))
  } else {
    Ok(())
  }
}

/// Format an amount with two decimals and thousands separators.
pub fn format_money(amount: f64) -> String {
  let cents = (amount * 100.0).round() as i64;
  let sign = if cents < 0 { "-" } else { "" };
  let cents = cents.abs();
  let whole = (cents / 100).to_string();

  let mut grouped = String::new();
  for (i, c) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }

  format!("{}{}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn item(quantity: f64, unit_price: f64) -> LineItem {
    LineItem {
      description: "Labour".to_string(),
      quantity,
      unit_price,
    }
  }

  #[test]
  fn test_invoice_totals() {
    let invoice = Invoice {
      id: "inv1".to_string(),
      number: "INV-001".to_string(),
      kind: InvoiceKind::Agent,
      issuer: "Dana".to_string(),
      job_id: None,
      status: InvoiceStatus::Submitted,
      issued_date: "2026-01-02".to_string(),
      line_items: vec![item(2.0, 50.0), item(1.5, 20.0)],
      tax_rate: 0.1,
    };
    assert_eq!(invoice.subtotal(), 130.0);
    assert!((invoice.tax() - 13.0).abs() < 1e-9);
    assert!((invoice.total() - 143.0).abs() < 1e-9);
  }

  #[test]
  fn test_job_deserializes_unknown_status() {
    let job: Job = serde_json::from_value(json!({
      "id": "j1",
      "title": "Fix pump",
      "status": "on_hold"
    }))
    .unwrap();
    assert_eq!(job.status, JobStatus::Unknown);
    assert_eq!(job.location, "");
    assert!(job.agent_id.is_none());
  }

  #[test]
  fn test_job_status_params() {
    assert_eq!(JobStatus::InProgress.as_param(), "in_progress");
    let parsed: JobStatus = serde_json::from_value(json!("in_progress")).unwrap();
    assert_eq!(parsed, JobStatus::InProgress);
  }

  #[test]
  fn test_new_job_requires_title_and_location() {
    let mut job = NewJob {
      title: "  ".to_string(),
      location: "Depot".to_string(),
      ..NewJob::default()
    };
    assert_eq!(job.validate(), Err(FormError::MissingField("title")));

    job.title = "Inspect boiler".to_string();
    assert_eq!(job.validate(), Ok(()));
  }

  #[test]
  fn test_new_invoice_validation() {
    let mut invoice = NewInvoice {
      kind: InvoiceKind::Supplier,
      issuer: "Parts Co".to_string(),
      job_id: None,
      line_items: Vec::new(),
      tax_rate: 0.0,
    };
    assert_eq!(
      invoice.validate(),
      Err(FormError::MissingField("line_items"))
    );

    invoice.line_items.push(item(0.0, 10.0));
    assert_eq!(
      invoice.validate(),
      Err(FormError::Invalid("quantity", "must be positive"))
    );

    invoice.line_items[0].quantity = 3.0;
    assert_eq!(invoice.validate(), Ok(()));
    assert_eq!(invoice.total(), 30.0);
  }

  #[test]
  fn test_new_expense_validation() {
    let expense = NewExpense {
      description: "Fuel".to_string(),
      category: "travel".to_string(),
      amount: 0.0,
      date: "2026-03-01".to_string(),
      job_id: None,
    };
    assert_eq!(
      expense.validate(),
      Err(FormError::Invalid("amount", "must be positive"))
    );
  }

  #[test]
  fn test_analytics_defaults_and_rate() {
    let summary: AnalyticsSummary =
      serde_json::from_value(json!({"total_jobs": 4, "completed_jobs": 1})).unwrap();
    assert_eq!(summary.active_agents, 0);
    assert_eq!(summary.completion_rate(), 0.25);
    assert_eq!(AnalyticsSummary::default().completion_rate(), 0.0);
  }

  #[test]
  fn test_format_money() {
    assert_eq!(format_money(0.0), "0.00");
    assert_eq!(format_money(1234.5), "1,234.50");
    assert_eq!(format_money(1234567.891), "1,234,567.89");
    assert_eq!(format_money(-42.0), "-42.00");
  }
}

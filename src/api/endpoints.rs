//! Endpoint strings. These double as cache keys, so the same request must
//! always be spelled the same way.

use super::types::{InvoiceKind, JobStatus};

pub const JOBS: &str = "/jobs";
pub const AGENTS: &str = "/agents";
pub const INVOICES: &str = "/invoices";
pub const EXPENSES: &str = "/expenses";
pub const ANALYTICS: &str = "/analytics";

pub fn jobs(status: Option<JobStatus>) -> String {
  match status {
    Some(status) => format!("{}?status={}", JOBS, status.as_param()),
    None => JOBS.to_string(),
  }
}

pub fn job(id: &str) -> String {
  format!("{}/{}", JOBS, id)
}

pub fn job_assign(id: &str) -> String {
  format!("{}/{}/assign", JOBS, id)
}

/// Accept or decline an assignment.
pub fn job_response(id: &str, accept: bool) -> String {
  let action = if accept { "accept" } else { "decline" };
  format!("{}/{}/{}", JOBS, id, action)
}

pub fn agents() -> String {
  AGENTS.to_string()
}

pub fn agent_availability(id: &str) -> String {
  format!("{}/{}/availability", AGENTS, id)
}

pub fn invoices(kind: Option<InvoiceKind>) -> String {
  match kind {
    Some(kind) => format!("{}?kind={}", INVOICES, kind.as_param()),
    None => INVOICES.to_string(),
  }
}

pub fn invoice(id: &str) -> String {
  format!("{}/{}", INVOICES, id)
}

pub fn invoice_pdf(id: &str) -> String {
  format!("{}/{}/pdf", INVOICES, id)
}

pub fn expenses() -> String {
  EXPENSES.to_string()
}

pub fn analytics_summary() -> String {
  format!("{}/summary", ANALYTICS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_list_endpoints_with_filters() {
    assert_eq!(jobs(None), "/jobs");
    assert_eq!(jobs(Some(JobStatus::InProgress)), "/jobs?status=in_progress");
    assert_eq!(invoices(Some(InvoiceKind::Supplier)), "/invoices?kind=supplier");
  }

  #[test]
  fn test_item_endpoints() {
    assert_eq!(job("42"), "/jobs/42");
    assert_eq!(job_response("42", true), "/jobs/42/accept");
    assert_eq!(job_response("42", false), "/jobs/42/decline");
    assert_eq!(agent_availability("a7"), "/agents/a7/availability");
    assert_eq!(invoice_pdf("i1"), "/invoices/i1/pdf");
  }

  #[test]
  fn test_filtered_lists_share_invalidation_prefix() {
    assert!(jobs(Some(JobStatus::Pending)).starts_with(JOBS));
    assert!(job("1").starts_with(JOBS));
    assert!(invoices(Some(InvoiceKind::Agent)).starts_with(INVOICES));
  }
}

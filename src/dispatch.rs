//! Mutations against the backend, followed by cache invalidation.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::endpoints;
use crate::api::types::{Expense, Invoice, Job, NewExpense, NewInvoice, NewJob};
use crate::api::ApiClient;
use crate::cache::ApiCache;

/// Write operations and the cached endpoints each one makes outdated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
  CreateJob,
  AssignAgent,
  RespondToAssignment,
  SetAvailability,
  CreateInvoice,
  LogExpense,
}

impl Mutation {
  /// Endpoint prefixes to drop from the cache once the mutation succeeds.
  pub fn invalidates(&self) -> &'static [&'static str] {
    match self {
      Mutation::CreateJob => &[endpoints::JOBS, endpoints::ANALYTICS],
      Mutation::AssignAgent => &[endpoints::JOBS, endpoints::AGENTS],
      Mutation::RespondToAssignment => &[endpoints::JOBS],
      Mutation::SetAvailability => &[endpoints::AGENTS, endpoints::ANALYTICS],
      Mutation::CreateInvoice => &[endpoints::INVOICES, endpoints::ANALYTICS],
      Mutation::LogExpense => &[endpoints::EXPENSES, endpoints::ANALYTICS],
    }
  }
}

/// Client plus cache: every successful write invalidates what it touched.
#[derive(Clone)]
pub struct Dispatch {
  client: ApiClient,
  cache: ApiCache,
}

impl Dispatch {
  pub fn new(client: ApiClient, cache: ApiCache) -> Self {
    Self { client, cache }
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  pub fn cache(&self) -> &ApiCache {
    &self.cache
  }

  fn settle(&self, mutation: Mutation) {
    for prefix in mutation.invalidates() {
      self.cache.invalidate_matching(prefix);
    }
  }

  pub async fn create_job(&self, job: &NewJob) -> Result<Job> {
    job.validate()?;
    let created = self.client.create_job(job).await?;
    self.settle(Mutation::CreateJob);
    Ok(created)
  }

  pub async fn assign_agent(&self, job_id: &str, agent_id: &str) -> Result<Job> {
    let job = self.client.assign_agent(job_id, agent_id).await?;
    self.settle(Mutation::AssignAgent);
    Ok(job)
  }

  pub async fn respond_to_assignment(&self, job_id: &str, accept: bool) -> Result<()> {
    self.client.respond_to_assignment(job_id, accept).await?;
    self.settle(Mutation::RespondToAssignment);
    Ok(())
  }

  pub async fn set_availability(&self, agent_id: &str, available: bool) -> Result<()> {
    self.client.set_availability(agent_id, available).await?;
    self.settle(Mutation::SetAvailability);
    Ok(())
  }

  pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice> {
    invoice.validate()?;
    let created = self.client.create_invoice(invoice).await?;
    self.settle(Mutation::CreateInvoice);
    Ok(created)
  }

  pub async fn log_expense(&self, expense: &NewExpense) -> Result<Expense> {
    expense.validate()?;
    let logged = self.client.log_expense(expense).await?;
    self.settle(Mutation::LogExpense);
    Ok(logged)
  }

  /// Save an invoice PDF as `<dir>/<name>.pdf` and return the path.
  pub async fn download_invoice(&self, invoice_id: &str, name: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = self.client.download_invoice(invoice_id).await?;

    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|e| eyre!("Failed to create {}: {}", dir.display(), e))?;
    let path = dir.join(format!("{}.pdf", file_stem(name)));
    tokio::fs::write(&path, &bytes)
      .await
      .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;

    info!(invoice_id, path = %path.display(), bytes = bytes.len(), "invoice downloaded");
    Ok(path)
  }
}

/// Make an invoice number safe to use as a file name.
fn file_stem(name: &str) -> String {
  let stem: String = name
    .trim()
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
        c
      } else {
        '_'
      }
    })
    .collect();
  if stem.is_empty() {
    "invoice".to_string()
  } else {
    stem
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStore, DEFAULT_PREFIX};
  use serde_json::json;
  use std::time::Duration;

  fn dispatch() -> Dispatch {
    let client =
      ApiClient::with_token("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
    Dispatch::new(client, ApiCache::new(MemoryStore::new(), DEFAULT_PREFIX))
  }

  #[test]
  fn test_settle_drops_affected_endpoints() {
    let dispatch = dispatch();
    let cache = dispatch.cache();
    cache.store("/jobs", json!([]));
    cache.store("/jobs?status=pending", json!([]));
    cache.store("/jobs/7", json!({}));
    cache.store("/agents", json!([]));
    cache.store("/analytics/summary", json!({}));
    cache.store("/expenses", json!([]));

    dispatch.settle(Mutation::CreateJob);

    assert!(!cache.contains("/jobs"));
    assert!(!cache.contains("/jobs?status=pending"));
    assert!(!cache.contains("/jobs/7"));
    assert!(!cache.contains("/analytics/summary"));
    assert!(cache.contains("/agents"));
    assert!(cache.contains("/expenses"));
  }

  #[test]
  fn test_availability_touches_agents() {
    assert_eq!(
      Mutation::SetAvailability.invalidates(),
      &["/agents", "/analytics"]
    );
  }

  #[tokio::test]
  async fn test_invalid_form_never_reaches_network() {
    let dispatch = dispatch();
    dispatch.cache().store("/jobs", json!([]));

    let err = dispatch.create_job(&NewJob::default()).await.unwrap_err();
    assert!(err.to_string().contains("title is required"));
    assert!(dispatch.cache().contains("/jobs"));
  }

  #[test]
  fn test_file_stem() {
    assert_eq!(file_stem("INV-2026/004"), "INV-2026_004");
    assert_eq!(file_stem("  "), "invoice");
  }
}

use crate::api::endpoints;
use crate::api::types::{Expense, Invoice, Job, NewExpense, NewInvoice, NewJob};
use crate::api::{ApiCall, ApiError};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Authenticated client for the dispatch REST API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_token(
      &config.api.url,
      Config::get_api_token(),
      Duration::from_secs(config.api.timeout_secs),
    )
  }

  pub fn with_token(url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
    let mut base = Url::parse(url).map_err(|e| eyre!("Invalid API url {}: {}", url, e))?;

    // Url::join replaces the last path segment unless the base ends in '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("fieldops/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base, token })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
    self
      .base
      .join(endpoint.trim_start_matches('/'))
      .map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))
  }

  fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
    let mut request = self
      .http
      .request(method, self.url(endpoint)?)
      .header(ACCEPT, "application/json");
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    Ok(request)
  }

  /// Send a request and classify the response status.
  async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(|e| ApiError::Network {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;

    let status = response.status();
    debug!(endpoint, status = status.as_u16(), "api response");

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(ApiError::Unauthorized {
        endpoint: endpoint.to_string(),
      });
    }

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
      return Err(ApiError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
      });
    }

    Ok(response)
  }

  async fn read_json(endpoint: &str, response: Response) -> Result<Value, ApiError> {
    let bytes = response.bytes().await.map_err(|e| ApiError::Network {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;

    // 204 and friends
    if bytes.is_empty() {
      return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })
  }

  /// GET an endpoint as JSON
  pub async fn get_json(&self, endpoint: &str) -> Result<Value, ApiError> {
    let request = self.request(Method::GET, endpoint)?;
    let response = self.send(endpoint, request).await?;
    Self::read_json(endpoint, response).await
  }

  pub async fn post_json<B: Serialize + ?Sized>(
    &self,
    endpoint: &str,
    body: &B,
  ) -> Result<Value, ApiError> {
    let request = self.request(Method::POST, endpoint)?.json(body);
    let response = self.send(endpoint, request).await?;
    Self::read_json(endpoint, response).await
  }

  pub async fn patch_json<B: Serialize + ?Sized>(
    &self,
    endpoint: &str,
    body: &B,
  ) -> Result<Value, ApiError> {
    let request = self.request(Method::PATCH, endpoint)?.json(body);
    let response = self.send(endpoint, request).await?;
    Self::read_json(endpoint, response).await
  }

  /// GET an endpoint as raw bytes (invoice PDFs)
  pub async fn download(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
    let request = self
      .request(Method::GET, endpoint)?
      .header(ACCEPT, "application/pdf");
    let response = self.send(endpoint, request).await?;
    let bytes = response.bytes().await.map_err(|e| ApiError::Network {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;
    Ok(bytes.to_vec())
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  pub async fn create_job(&self, job: &NewJob) -> Result<Job, ApiError> {
    let value = self.post_json(endpoints::JOBS, job).await?;
    info!(title = %job.title, "job created");
    decode(endpoints::JOBS, value)
  }

  pub async fn assign_agent(&self, job_id: &str, agent_id: &str) -> Result<Job, ApiError> {
    let endpoint = endpoints::job_assign(job_id);
    let value = self
      .patch_json(&endpoint, &json!({ "agent_id": agent_id }))
      .await?;
    info!(job_id, agent_id, "agent assigned");
    decode(&endpoint, value)
  }

  pub async fn respond_to_assignment(&self, job_id: &str, accept: bool) -> Result<(), ApiError> {
    let endpoint = endpoints::job_response(job_id, accept);
    self.post_json(&endpoint, &json!({})).await?;
    info!(job_id, accept, "assignment answered");
    Ok(())
  }

  pub async fn set_availability(&self, agent_id: &str, available: bool) -> Result<(), ApiError> {
    let endpoint = endpoints::agent_availability(agent_id);
    self
      .patch_json(&endpoint, &json!({ "available": available }))
      .await?;
    info!(agent_id, available, "availability updated");
    Ok(())
  }

  pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, ApiError> {
    let value = self.post_json(endpoints::INVOICES, invoice).await?;
    info!(kind = %invoice.kind, issuer = %invoice.issuer, "invoice created");
    decode(endpoints::INVOICES, value)
  }

  pub async fn download_invoice(&self, invoice_id: &str) -> Result<Vec<u8>, ApiError> {
    self.download(&endpoints::invoice_pdf(invoice_id)).await
  }

  pub async fn log_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
    let value = self.post_json(endpoints::EXPENSES, expense).await?;
    info!(amount = expense.amount, category = %expense.category, "expense logged");
    decode(endpoints::EXPENSES, value)
  }
}

impl ApiCall for ApiClient {
  fn call(&self, endpoint: &str) -> BoxFuture<'static, Result<Value, ApiError>> {
    let client = self.clone();
    let endpoint = endpoint.to_string();
    Box::pin(async move { client.get_json(&endpoint).await })
  }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(|e| ApiError::Decode {
    endpoint: endpoint.to_string(),
    message: e.to_string(),
  })
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
  let value: Value = serde_json::from_str(body).ok()?;
  ["message", "error", "detail"]
    .iter()
    .find_map(|field| value.get(*field)?.as_str().map(String::from))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoints_join_under_base_path() {
    let client =
      ApiClient::with_token("https://ops.example.com/api", None, Duration::from_secs(5)).unwrap();
    assert_eq!(client.base_url().as_str(), "https://ops.example.com/api/");
    assert_eq!(
      client.url("/jobs?status=pending").unwrap().as_str(),
      "https://ops.example.com/api/jobs?status=pending"
    );
    assert_eq!(
      client.url("agents/7/availability").unwrap().as_str(),
      "https://ops.example.com/api/agents/7/availability"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(ApiClient::with_token("not a url", None, Duration::from_secs(5)).is_err());
  }

  #[test]
  fn test_error_message_fields() {
    assert_eq!(
      error_message(r#"{"message": "job not found"}"#).as_deref(),
      Some("job not found")
    );
    assert_eq!(
      error_message(r#"{"error": "bad request"}"#).as_deref(),
      Some("bad request")
    );
    assert_eq!(error_message("<html>oops</html>"), None);
    assert_eq!(error_message(r#"{"message": 3}"#), None);
  }

  #[tokio::test]
  async fn test_connection_failure_is_network_error() {
    // Port 9 (discard) on localhost is expected to refuse connections
    let client =
      ApiClient::with_token("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
    let err = client.get_json("/jobs").await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
  }
}

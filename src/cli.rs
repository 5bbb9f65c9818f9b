//! One-shot subcommands for scripting, sharing the dashboard's cache.

use chrono::{Local, Utc};
use clap::{Subcommand, ValueEnum};
use color_eyre::Result;
use std::path::PathBuf;

use crate::api::endpoints;
use crate::api::types::{format_money, Invoice, InvoiceKind, LineItem, NewExpense, NewInvoice, NewJob};
use crate::app::Services;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Inspect or clear cached responses
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
  /// Create or assign jobs
  Job {
    #[command(subcommand)]
    action: JobAction,
  },
  /// Answer a job assignment
  Assignment {
    #[command(subcommand)]
    action: AssignmentAction,
  },
  /// Create or download invoices
  Invoice {
    #[command(subcommand)]
    action: InvoiceAction,
  },
  /// Record expenses
  Expense {
    #[command(subcommand)]
    action: ExpenseAction,
  },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
  /// List cached endpoints, oldest first
  List,
  /// Forget one endpoint, or everything
  Clear { endpoint: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum JobAction {
  Create {
    #[arg(long)]
    title: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    client: Option<String>,
    /// Scheduled date, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    description: Option<String>,
  },
  Assign { job: String, agent: String },
}

#[derive(Subcommand, Debug)]
pub enum AssignmentAction {
  Accept { job: String },
  Decline { job: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
  Agent,
  Supplier,
}

impl From<KindArg> for InvoiceKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Agent => InvoiceKind::Agent,
      KindArg::Supplier => InvoiceKind::Supplier,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum InvoiceAction {
  Create {
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    issuer: String,
    #[arg(long)]
    job: Option<String>,
    /// Line item as DESCRIPTION:QUANTITY:UNIT_PRICE, repeatable
    #[arg(long = "item", value_parser = parse_line_item, required = true)]
    items: Vec<LineItem>,
    /// Tax as a fraction, e.g. 0.2
    #[arg(long, default_value_t = 0.0)]
    tax_rate: f64,
  },
  /// Save an invoice PDF
  Download {
    id: String,
    /// Directory to write to (defaults to downloads_dir)
    #[arg(long)]
    out: Option<PathBuf>,
  },
}

#[derive(Subcommand, Debug)]
pub enum ExpenseAction {
  Log {
    #[arg(long)]
    description: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    amount: f64,
    /// Defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    job: Option<String>,
  },
}

pub async fn run(command: Command, services: &Services) -> Result<()> {
  let dispatch = &services.dispatch;

  match command {
    Command::Cache { action } => match action {
      CacheAction::List => {
        let now = Utc::now();
        for (endpoint, at) in services.cache.entries() {
          let age = (now - at).num_seconds().max(0);
          println!("{:<40} {}  ({}s ago)", endpoint, at.to_rfc3339(), age);
        }
      }
      CacheAction::Clear { endpoint } => {
        services.cache.invalidate(endpoint.as_deref());
        match endpoint {
          Some(endpoint) => println!("Cleared {}", endpoint),
          None => println!("Cleared all cached responses"),
        }
      }
    },

    Command::Job { action } => match action {
      JobAction::Create {
        title,
        location,
        client,
        date,
        description,
      } => {
        let job = dispatch
          .create_job(&NewJob {
            title,
            location,
            client,
            scheduled_date: date,
            description,
          })
          .await?;
        println!("Created job {} ({})", job.id, job.status);
      }
      JobAction::Assign { job, agent } => {
        let job = dispatch.assign_agent(&job, &agent).await?;
        println!(
          "Assigned {} to {}",
          job.agent_name.as_deref().unwrap_or(&agent),
          job.id
        );
      }
    },

    Command::Assignment { action } => {
      let (job, accept) = match action {
        AssignmentAction::Accept { job } => (job, true),
        AssignmentAction::Decline { job } => (job, false),
      };
      dispatch.respond_to_assignment(&job, accept).await?;
      println!("{} {}", if accept { "Accepted" } else { "Declined" }, job);
    }

    Command::Invoice { action } => match action {
      InvoiceAction::Create {
        kind,
        issuer,
        job,
        items,
        tax_rate,
      } => {
        let invoice = dispatch
          .create_invoice(&NewInvoice {
            kind: kind.into(),
            issuer,
            job_id: job,
            line_items: items,
            tax_rate,
          })
          .await?;
        println!("Created invoice {} for {}", invoice.number, format_money(invoice.total()));
      }
      InvoiceAction::Download { id, out } => {
        let name = invoice_number(services, &id).await;
        let dir = out.unwrap_or_else(|| services.downloads_dir.clone());
        let path = dispatch.download_invoice(&id, &name, &dir).await?;
        println!("{}", path.display());
      }
    },

    Command::Expense { action } => match action {
      ExpenseAction::Log {
        description,
        category,
        amount,
        date,
        job,
      } => {
        let date = date.unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
        let expense = dispatch
          .log_expense(&NewExpense {
            description,
            category,
            amount,
            date,
            job_id: job,
          })
          .await?;
        println!("Logged expense {} ({})", expense.id, format_money(expense.amount));
      }
    },
  }

  Ok(())
}

/// File name for a download: the invoice number when it can be looked up.
async fn invoice_number(services: &Services, id: &str) -> String {
  let endpoint = endpoints::invoice(id);
  let cached = services
    .cache
    .lookup(&endpoint)
    .and_then(|entry| entry.decode::<Invoice>().ok());
  if let Some(invoice) = cached {
    return invoice.number;
  }

  match services.dispatch.client().get_json(&endpoint).await {
    Ok(value) => serde_json::from_value::<Invoice>(value)
      .map(|invoice| invoice.number)
      .unwrap_or_else(|_| id.to_string()),
    Err(_) => id.to_string(),
  }
}

/// Parse `DESCRIPTION:QUANTITY:UNIT_PRICE`. The description may contain ':'.
fn parse_line_item(raw: &str) -> Result<LineItem, String> {
  let mut parts = raw.rsplitn(3, ':');
  let (Some(price), Some(quantity), Some(description)) = (parts.next(), parts.next(), parts.next())
  else {
    return Err(format!("expected DESCRIPTION:QUANTITY:UNIT_PRICE, got '{}'", raw));
  };

  let quantity = quantity
    .trim()
    .parse::<f64>()
    .map_err(|e| format!("bad quantity '{}': {}", quantity, e))?;
  let unit_price = price
    .trim()
    .parse::<f64>()
    .map_err(|e| format!("bad unit price '{}': {}", price, e))?;

  Ok(LineItem {
    description: description.trim().to_string(),
    quantity,
    unit_price,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser)]
  struct Cli {
    #[command(subcommand)]
    command: Command,
  }

  #[test]
  fn test_parse_line_item() {
    let item = parse_line_item("Labour: call-out:2:45.50").unwrap();
    assert_eq!(item.description, "Labour: call-out");
    assert_eq!(item.quantity, 2.0);
    assert_eq!(item.unit_price, 45.5);
  }

  #[test]
  fn test_parse_line_item_rejects_garbage() {
    assert!(parse_line_item("just words").is_err());
    assert!(parse_line_item("Parts:two:10").is_err());
  }

  #[test]
  fn test_cache_clear_parses_optional_endpoint() {
    let cli = Cli::parse_from(["fieldops", "cache", "clear", "/jobs"]);
    assert!(matches!(
      cli.command,
      Command::Cache {
        action: CacheAction::Clear { endpoint: Some(ref e) }
      } if e == "/jobs"
    ));
  }

  #[test]
  fn test_invoice_create_requires_items() {
    let parsed = Cli::try_parse_from([
      "fieldops", "invoice", "create", "--kind", "agent", "--issuer", "Rosa",
    ]);
    assert!(parsed.is_err());

    let cli = Cli::parse_from([
      "fieldops", "invoice", "create", "--kind", "supplier", "--issuer", "Acme",
      "--item", "Valve:3:12", "--item", "Seal:10:0.5", "--tax-rate", "0.2",
    ]);
    match cli.command {
      Command::Invoice {
        action: InvoiceAction::Create { items, tax_rate, .. },
      } => {
        assert_eq!(items.len(), 2);
        assert_eq!(tax_rate, 0.2);
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_cache_clear_runs_against_cache() {
    let (services, _api) = crate::app::test_services();
    services.cache.store("/jobs", serde_json::json!([]));
    services.cache.store("/agents", serde_json::json!([]));

    run(
      Command::Cache {
        action: CacheAction::Clear {
          endpoint: Some("/jobs".to_string()),
        },
      },
      &services,
    )
    .await
    .unwrap();

    assert!(!services.cache.contains("/jobs"));
    assert!(services.cache.contains("/agents"));
  }
}

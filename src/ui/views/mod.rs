mod agent_list;
mod analytics;
mod expense_list;
mod invoice_detail;
mod invoice_list;
mod job_detail;
mod job_list;

pub use agent_list::AgentListView;
pub use analytics::AnalyticsView;
pub use expense_list::ExpenseListView;
pub use invoice_detail::InvoiceDetailView;
pub use invoice_list::InvoiceListView;
pub use job_detail::JobDetailView;
pub use job_list::JobListView;

use std::future::Future;
use tokio::sync::mpsc;

/// Background work started by a view, reported back on a later tick
pub(crate) struct Tasks<T> {
  tx: mpsc::UnboundedSender<T>,
  rx: mpsc::UnboundedReceiver<T>,
}

impl<T: Send + 'static> Tasks<T> {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  pub fn spawn<F>(&self, task: F)
  where
    F: Future<Output = T> + Send + 'static,
  {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      // The view may be gone by now
      let _ = tx.send(task.await);
    });
  }

  pub fn try_next(&mut self) -> Option<T> {
    self.rx.try_recv().ok()
  }
}

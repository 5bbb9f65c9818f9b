use crate::api::endpoints;
use crate::api::types::{format_money, Invoice, InvoiceKind};
use crate::app::Services;
use crate::ui::components::{KeyResult, ListPane, Toast};
use crate::ui::renderfns::{invoice_status_color, truncate};
use crate::ui::view::{list_shortcuts, Shortcut, View, ViewAction};
use crate::ui::views::{InvoiceDetailView, Tasks};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

const SORT_COLUMNS: &[&str] = &["date", "total", "number"];

/// Start a PDF download; the result comes back as a toast.
pub(crate) fn spawn_download(
  services: &Services,
  tasks: &Tasks<Result<String, String>>,
  invoice: &Invoice,
) {
  let dispatch = services.dispatch.clone();
  let dir = services.downloads_dir.clone();
  let id = invoice.id.clone();
  let number = invoice.number.clone();
  tasks.spawn(async move {
    dispatch
      .download_invoice(&id, &number, &dir)
      .await
      .map(|path| path.display().to_string())
      .map_err(|e| e.to_string())
  });
}

pub(crate) fn download_toast(result: Result<String, String>) -> Toast {
  match result {
    Ok(path) => Toast::info(format!("Saved {}", path)),
    Err(e) => Toast::error(format!("Download failed: {}", e)),
  }
}

/// Agent and supplier invoices
pub struct InvoiceListView {
  services: Services,
  kind: Option<InvoiceKind>,
  pane: ListPane<Invoice>,
  downloads: Tasks<Result<String, String>>,
}

impl InvoiceListView {
  pub fn new(services: Services) -> Self {
    let query = services.query(endpoints::invoices(None));
    Self {
      services,
      kind: None,
      pane: ListPane::new(query, SORT_COLUMNS),
      downloads: Tasks::new(),
    }
  }

  fn cycle_kind(&mut self) {
    self.kind = match self.kind {
      None => Some(InvoiceKind::Agent),
      Some(InvoiceKind::Agent) => Some(InvoiceKind::Supplier),
      Some(InvoiceKind::Supplier) => None,
    };
    self.pane.query_mut().set_endpoint(endpoints::invoices(self.kind));
  }
}

impl View for InvoiceListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let KeyResult::Handled = self.pane.handle_key(key) {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('t') => self.cycle_kind(),
      KeyCode::Char('d') => {
        if let Some(invoice) = self.pane.selected() {
          spawn_download(&self.services, &self.downloads, invoice);
          return ViewAction::Toast(Toast::info(format!("Downloading {}", invoice.number)));
        }
      }
      KeyCode::Enter => {
        if let Some(invoice) = self.pane.selected() {
          return ViewAction::Push(Box::new(InvoiceDetailView::new(
            self.services.clone(),
            invoice.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let label = match self.kind {
      Some(kind) => format!("Invoices [{}]", kind),
      None => "Invoices [All]".to_string(),
    };
    let header = Row::new(vec!["Number", "Date", "Kind", "Issuer", "Status", "Total"]);
    let widths = [
      Constraint::Length(14),
      Constraint::Length(12),
      Constraint::Length(9),
      Constraint::Percentage(40),
      Constraint::Length(10),
      Constraint::Length(14),
    ];

    self.pane.render(frame, area, &label, header, &widths, |invoice| {
      Row::new(vec![
        Cell::from(invoice.number.clone()).style(Style::default().fg(Color::Cyan)),
        Cell::from(invoice.issued_date.clone()),
        Cell::from(invoice.kind.to_string()),
        Cell::from(truncate(&invoice.issuer, 40)),
        Cell::from(invoice.status.to_string())
          .style(Style::default().fg(invoice_status_color(invoice.status))),
        Cell::from(Text::from(format_money(invoice.total())).right_aligned()),
      ])
    });
  }

  fn breadcrumb_label(&self) -> String {
    "Invoices".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.pane.tick();
    match self.downloads.try_next() {
      Some(result) => ViewAction::Toast(download_toast(result)),
      None => ViewAction::None,
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.pane.is_searching()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = list_shortcuts();
    shortcuts.push(Shortcut::new("t", "kind").with_priority(50));
    shortcuts.push(Shortcut::new("d", "download").with_priority(55));
    shortcuts.push(Shortcut::new("enter", "open").with_priority(60));
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::test_services;

  #[tokio::test]
  async fn test_kind_filter_cycles_endpoint() {
    let (services, _api) = test_services();
    let mut view = InvoiceListView::new(services);

    view.handle_key(KeyEvent::from(KeyCode::Char('t')));
    assert_eq!(view.pane.query().endpoint(), "/invoices?kind=agent");
    view.handle_key(KeyEvent::from(KeyCode::Char('t')));
    assert_eq!(view.pane.query().endpoint(), "/invoices?kind=supplier");
    view.handle_key(KeyEvent::from(KeyCode::Char('t')));
    assert_eq!(view.pane.query().endpoint(), "/invoices");
  }

  #[test]
  fn test_download_toast_levels() {
    use crate::ui::components::ToastLevel;
    assert_eq!(download_toast(Ok("/tmp/x.pdf".into())).level, ToastLevel::Info);
    assert_eq!(download_toast(Err("404".into())).level, ToastLevel::Error);
  }
}

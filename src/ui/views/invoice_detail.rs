use crate::api::endpoints;
use crate::api::types::{format_money, Invoice};
use crate::app::Services;
use crate::query::ApiQuery;
use crate::ui::renderfns::{invoice_status_color, query_badge};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::invoice_list::{download_toast, spawn_download};
use crate::ui::views::Tasks;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

/// One invoice with its line items and totals
pub struct InvoiceDetailView {
  services: Services,
  summary: Invoice,
  query: ApiQuery<Invoice>,
  downloads: Tasks<Result<String, String>>,
}

impl InvoiceDetailView {
  pub fn new(services: Services, summary: Invoice) -> Self {
    let query = services.query(endpoints::invoice(&summary.id));
    Self {
      services,
      summary,
      query,
      downloads: Tasks::new(),
    }
  }

  fn invoice(&self) -> &Invoice {
    self.query.data().unwrap_or(&self.summary)
  }
}

impl View for InvoiceDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('d') => spawn_download(&self.services, &self.downloads, self.invoice()),
      KeyCode::Char('r') => self.query.revalidate(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let invoice = self.invoice();

    let block = Block::default()
      .title(format!(" Invoice {}{} ", invoice.number, query_badge(&self.query)))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(4), // Summary
        Constraint::Min(3),    // Line items
        Constraint::Length(3), // Totals
      ])
      .split(inner);

    let summary = vec![
      Line::from(vec![
        Span::styled("Issuer   ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} ({})", invoice.issuer, invoice.kind)),
      ]),
      Line::from(vec![
        Span::styled("Issued   ", Style::default().fg(Color::DarkGray)),
        Span::raw(invoice.issued_date.clone()),
      ]),
      Line::from(vec![
        Span::styled("Status   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          invoice.status.to_string(),
          Style::default().fg(invoice_status_color(invoice.status)).bold(),
        ),
      ]),
      Line::from(vec![
        Span::styled("Job      ", Style::default().fg(Color::DarkGray)),
        Span::raw(invoice.job_id.clone().unwrap_or_else(|| "-".to_string())),
      ]),
    ];
    frame.render_widget(Paragraph::new(summary), chunks[0]);

    let rows: Vec<Row> = invoice
      .line_items
      .iter()
      .map(|item| {
        Row::new(vec![
          Cell::from(item.description.clone()),
          Cell::from(Text::from(format!("{}", item.quantity)).right_aligned()),
          Cell::from(Text::from(format_money(item.unit_price)).right_aligned()),
          Cell::from(Text::from(format_money(item.amount())).right_aligned()),
        ])
      })
      .collect();
    let table = Table::new(
      rows,
      [
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(14),
      ],
    )
    .header(Row::new(vec!["Description", "Qty", "Unit", "Amount"]).style(Style::default().fg(Color::Yellow)));
    frame.render_widget(table, chunks[1]);

    let totals = vec![
      Line::from(format!("Subtotal {:>14}", format_money(invoice.subtotal()))).right_aligned(),
      Line::from(format!(
        "Tax {:>3.0}% {:>14}",
        invoice.tax_rate * 100.0,
        format_money(invoice.tax())
      ))
      .right_aligned(),
      Line::from(format!("Total {:>14}", format_money(invoice.total())))
        .bold()
        .right_aligned(),
    ];
    frame.render_widget(Paragraph::new(totals), chunks[2]);
  }

  fn breadcrumb_label(&self) -> String {
    self.summary.number.clone()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    match self.downloads.try_next() {
      Some(result) => ViewAction::Toast(download_toast(result)),
      None => ViewAction::None,
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("d", "download").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}

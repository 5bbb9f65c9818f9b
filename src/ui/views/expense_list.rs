use crate::api::endpoints;
use crate::api::types::{format_money, Expense};
use crate::app::Services;
use crate::ui::components::{KeyResult, ListPane};
use crate::ui::renderfns::truncate;
use crate::ui::view::{list_shortcuts, Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Paragraph, Row};

const SORT_COLUMNS: &[&str] = &["date", "amount", "category"];

pub struct ExpenseListView {
  pane: ListPane<Expense>,
}

impl ExpenseListView {
  pub fn new(services: Services) -> Self {
    Self {
      pane: ListPane::new(services.query(endpoints::expenses()), SORT_COLUMNS),
    }
  }

  /// Sum of what is currently listed, search included
  fn total(&self) -> f64 {
    self.pane.visible().iter().map(|e| e.amount).sum()
  }
}

impl View for ExpenseListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let KeyResult::Handled = self.pane.handle_key(key) {
      return ViewAction::None;
    }
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    let total = self.total();
    let header = Row::new(vec!["Date", "Category", "Description", "Job", "Amount"]);
    let widths = [
      Constraint::Length(12),
      Constraint::Length(14),
      Constraint::Percentage(45),
      Constraint::Length(10),
      Constraint::Length(14),
    ];

    self.pane.render(frame, chunks[0], "Expenses", header, &widths, |expense| {
      Row::new(vec![
        Cell::from(expense.date.clone()),
        Cell::from(expense.category.clone()).style(Style::default().fg(Color::Cyan)),
        Cell::from(truncate(&expense.description, 50)),
        Cell::from(expense.job_id.clone().unwrap_or_default()),
        Cell::from(Text::from(format_money(expense.amount)).right_aligned()),
      ])
    });

    let footer = Line::from(vec![
      Span::styled("Total ", Style::default().fg(Color::DarkGray)),
      Span::styled(format_money(total), Style::default().bold()),
      Span::raw(" "),
    ])
    .right_aligned();
    frame.render_widget(Paragraph::new(footer), chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Expenses".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.pane.tick();
    ViewAction::None
  }

  fn is_capturing_input(&self) -> bool {
    self.pane.is_searching()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    list_shortcuts()
  }
}

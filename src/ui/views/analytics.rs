use crate::api::endpoints;
use crate::api::types::{format_money, AnalyticsSummary};
use crate::app::Services;
use crate::query::ApiQuery;
use crate::ui::renderfns::query_badge;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

/// Headline numbers from `/analytics/summary`
pub struct AnalyticsView {
  query: ApiQuery<AnalyticsSummary>,
}

impl AnalyticsView {
  pub fn new(services: Services) -> Self {
    Self {
      query: services.query(endpoints::analytics_summary()),
    }
  }
}

impl View for AnalyticsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.query.revalidate(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" Analytics{} ", query_badge(&self.query)))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(summary) = self.query.data() else {
      let message = match self.query.error() {
        Some(e) => format!("Failed to load: {}. Press 'r' to retry.", e),
        None => "Loading...".to_string(),
      };
      frame.render_widget(
        Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
        inner,
      );
      return;
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Min(4)])
      .split(inner);

    let rate = summary.completion_rate();
    let gauge = Gauge::default()
      .block(Block::default().title(" Completion ").borders(Borders::ALL))
      .gauge_style(Style::default().fg(Color::Green))
      .ratio(rate.clamp(0.0, 1.0))
      .label(format!(
        "{}/{} jobs ({:.0}%)",
        summary.completed_jobs,
        summary.total_jobs,
        rate * 100.0
      ));
    frame.render_widget(gauge, chunks[0]);

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
      Line::from(vec![
        Span::styled("Agents available      ", label),
        Span::raw(format!("{} of {}", summary.available_agents, summary.active_agents)),
      ]),
      Line::from(vec![
        Span::styled("Outstanding invoices  ", label),
        Span::styled(format_money(summary.outstanding_invoices), Style::default().fg(Color::Yellow)),
      ]),
      Line::from(vec![
        Span::styled("Expenses this month   ", label),
        Span::raw(format_money(summary.expenses_this_month)),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines), chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Analytics".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("r", "refresh").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}

use crate::api::endpoints;
use crate::api::types::{Job, JobStatus};
use crate::app::Services;
use crate::ui::components::{KeyResult, ListPane};
use crate::ui::renderfns::{job_status_color, truncate};
use crate::ui::view::{list_shortcuts, Shortcut, View, ViewAction};
use crate::ui::views::JobDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

const SORT_COLUMNS: &[&str] = &["date", "title", "status"];

/// Dispatch board: every job, optionally narrowed to one status
pub struct JobListView {
  services: Services,
  status: Option<JobStatus>,
  pane: ListPane<Job>,
  /// Job whose detail was last warmed in the cache
  prefetched: Option<String>,
}

impl JobListView {
  pub fn new(services: Services) -> Self {
    let query = services.query(endpoints::jobs(None));
    Self {
      services,
      status: None,
      pane: ListPane::new(query, SORT_COLUMNS),
      prefetched: None,
    }
  }

  /// All → Pending → ... → Completed → All
  fn cycle_status(&mut self) {
    let filters = JobStatus::FILTERS;
    self.status = match self.status {
      None => filters.first().copied(),
      Some(current) => filters
        .iter()
        .position(|s| *s == current)
        .and_then(|i| filters.get(i + 1))
        .copied(),
    };
    self.pane.query_mut().set_endpoint(endpoints::jobs(self.status));
  }

  /// Warm the cache for the selected job so Enter opens instantly
  fn prefetch_selected(&mut self) {
    let Some(id) = self.pane.selected().map(|job| job.id.clone()) else {
      return;
    };
    if self.prefetched.as_deref() != Some(id.as_str()) {
      self.services.prefetch(endpoints::job(&id));
      self.prefetched = Some(id);
    }
  }

  fn status_label(&self) -> String {
    self
      .status
      .map(|s| s.to_string())
      .unwrap_or_else(|| "All".to_string())
  }
}

impl View for JobListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let KeyResult::Handled = self.pane.handle_key(key) {
      self.prefetch_selected();
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('s') => self.cycle_status(),
      KeyCode::Enter => {
        if let Some(job) = self.pane.selected() {
          return ViewAction::Push(Box::new(JobDetailView::new(
            self.services.clone(),
            job.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let label = format!("Jobs [{}]", self.status_label());
    let header = Row::new(vec!["Date", "Title", "Location", "Agent", "Status"]);
    let widths = [
      Constraint::Length(12),
      Constraint::Percentage(35),
      Constraint::Percentage(25),
      Constraint::Length(16),
      Constraint::Length(12),
    ];

    self.pane.render(frame, area, &label, header, &widths, |job| {
      Row::new(vec![
        Cell::from(job.scheduled_date.clone().unwrap_or_else(|| "-".to_string()))
          .style(Style::default().fg(Color::DarkGray)),
        Cell::from(truncate(&job.title, 48)),
        Cell::from(truncate(&job.location, 32)),
        Cell::from(truncate(job.agent_name.as_deref().unwrap_or("unassigned"), 16)),
        Cell::from(job.status.to_string()).style(Style::default().fg(job_status_color(job.status))),
      ])
    });
  }

  fn breadcrumb_label(&self) -> String {
    "Jobs".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.pane.tick() {
      self.prefetch_selected();
    }
    ViewAction::None
  }

  fn is_capturing_input(&self) -> bool {
    self.pane.is_searching()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = list_shortcuts();
    shortcuts.push(Shortcut::new("s", "status").with_priority(50));
    shortcuts.push(Shortcut::new("enter", "open").with_priority(60));
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::test_services;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn test_status_filter_cycles_endpoint() {
    let (services, _api) = test_services();
    let mut view = JobListView::new(services);
    assert_eq!(view.pane.query().endpoint(), "/jobs");

    view.handle_key(key(KeyCode::Char('s')));
    assert_eq!(view.pane.query().endpoint(), "/jobs?status=pending");

    for _ in 0..JobStatus::FILTERS.len() {
      view.handle_key(key(KeyCode::Char('s')));
    }
    assert_eq!(view.pane.query().endpoint(), "/jobs");
  }

  #[tokio::test]
  async fn test_loaded_jobs_prefetch_selected_detail() {
    let (services, api) = test_services();
    api.reply(
      "/jobs",
      Ok(serde_json::json!([
        {"id": "j1", "title": "Boiler service", "status": "pending", "scheduled_date": "2026-03-01"}
      ])),
    );
    api.reply(
      "/jobs/j1",
      Ok(serde_json::json!({"id": "j1", "title": "Boiler service", "status": "pending"})),
    );
    let cache = services.cache.clone();
    let mut view = JobListView::new(services);

    assert!(view.pane.query_mut().wait().await);
    view.prefetch_selected();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(cache.contains("/jobs/j1"));
    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::Push(_)));
  }
}

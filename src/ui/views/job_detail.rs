use crate::api::endpoints;
use crate::api::types::Job;
use crate::app::Services;
use crate::query::ApiQuery;
use crate::ui::components::Toast;
use crate::ui::renderfns::{job_status_color, query_badge};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::Tasks;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Single job, refreshed from `/jobs/{id}`
pub struct JobDetailView {
  services: Services,
  /// Row the view was opened from, shown until the detail arrives
  summary: Job,
  query: ApiQuery<Job>,
  responses: Tasks<Result<bool, String>>,
  responding: bool,
}

impl JobDetailView {
  pub fn new(services: Services, summary: Job) -> Self {
    let query = services.query(endpoints::job(&summary.id));
    Self {
      services,
      summary,
      query,
      responses: Tasks::new(),
      responding: false,
    }
  }

  fn job(&self) -> &Job {
    self.query.data().unwrap_or(&self.summary)
  }

  fn respond(&mut self, accept: bool) -> ViewAction {
    if self.responding {
      return ViewAction::None;
    }
    self.responding = true;

    let dispatch = self.services.dispatch.clone();
    let id = self.job().id.clone();
    self.responses.spawn(async move {
      dispatch
        .respond_to_assignment(&id, accept)
        .await
        .map(|_| accept)
        .map_err(|e| e.to_string())
    });
    ViewAction::None
  }

  fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
      Span::styled(format!("{:<12}", name), Style::default().fg(Color::DarkGray)),
      Span::raw(value),
    ])
  }
}

impl View for JobDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('a') => return self.respond(true),
      KeyCode::Char('d') => return self.respond(false),
      KeyCode::Char('r') => self.query.revalidate(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let job = self.job();
    let title = format!(" {}{} ", job.title, query_badge(&self.query));

    let mut lines = vec![
      Line::from(vec![
        Span::styled(format!("{:<12}", "Status"), Style::default().fg(Color::DarkGray)),
        Span::styled(
          job.status.to_string(),
          Style::default().fg(job_status_color(job.status)).bold(),
        ),
      ]),
      Self::field("Location", job.location.clone()),
      Self::field("Client", job.client.clone().unwrap_or_else(|| "-".to_string())),
      Self::field(
        "Scheduled",
        job.scheduled_date.clone().unwrap_or_else(|| "unscheduled".to_string()),
      ),
      Self::field(
        "Agent",
        job.agent_name.clone().unwrap_or_else(|| "unassigned".to_string()),
      ),
      Line::raw(""),
    ];
    if let Some(description) = &job.description {
      lines.push(Line::raw(description.clone()));
    }
    if let Some(e) = self.query.error() {
      lines.push(Line::raw(""));
      lines.push(Line::styled(e.to_string(), Style::default().fg(Color::Red)));
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.summary.title.clone()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    match self.responses.try_next() {
      Some(Ok(accepted)) => {
        self.responding = false;
        // The mutation dropped this endpoint from the cache
        self.query.revalidate();
        let verb = if accepted { "accepted" } else { "declined" };
        ViewAction::Toast(Toast::info(format!("Assignment {}", verb)))
      }
      Some(Err(e)) => {
        self.responding = false;
        ViewAction::Toast(Toast::error(e))
      }
      None => ViewAction::None,
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("a", "accept").with_priority(20),
      Shortcut::new("d", "decline").with_priority(30),
      Shortcut::new("r", "refresh").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::JobStatus;
  use crate::app::test_services;
  use serde_json::json;

  fn summary() -> Job {
    serde_json::from_value(json!({"id": "j7", "title": "Gate repair", "status": "assigned"}))
      .unwrap()
  }

  #[tokio::test]
  async fn test_shows_summary_until_detail_arrives() {
    let (services, api) = test_services();
    api.reply(
      "/jobs/j7",
      Ok(json!({"id": "j7", "title": "Gate repair", "status": "in_progress", "location": "Yard 3"})),
    );
    let mut view = JobDetailView::new(services, summary());
    assert_eq!(view.job().status, JobStatus::Assigned);

    view.query.wait().await;
    assert_eq!(view.job().status, JobStatus::InProgress);
    assert_eq!(view.job().location, "Yard 3");
  }

  #[tokio::test]
  async fn test_failed_response_reports_error() {
    let (services, _api) = test_services();
    let mut view = JobDetailView::new(services, summary());

    view.handle_key(KeyEvent::from(KeyCode::Char('a')));
    // A second press while the first is in flight is ignored
    view.handle_key(KeyEvent::from(KeyCode::Char('d')));

    let mut toast = None;
    for _ in 0..50 {
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
      if let ViewAction::Toast(t) = view.tick() {
        toast = Some(t);
        break;
      }
    }
    let toast = toast.expect("dispatch against an unreachable backend fails");
    assert_eq!(toast.level, crate::ui::components::ToastLevel::Error);
    assert!(!view.responding);
  }
}

use crate::api::endpoints;
use crate::api::types::Agent;
use crate::app::Services;
use crate::optimistic::Optimistic;
use crate::ui::components::{KeyResult, ListPane, Toast};
use crate::ui::renderfns::truncate;
use crate::ui::view::{list_shortcuts, Shortcut, View, ViewAction};
use crate::ui::views::Tasks;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};
use std::collections::HashMap;

const SORT_COLUMNS: &[&str] = &["available", "load", "name"];

type Saved = (String, Result<(), String>);

/// Field agents; space flips availability before the backend confirms
pub struct AgentListView {
  services: Services,
  pane: ListPane<Agent>,
  availability: HashMap<String, Optimistic<bool>>,
  saves: Tasks<Saved>,
}

impl AgentListView {
  pub fn new(services: Services) -> Self {
    let query = services.query(endpoints::agents());
    Self {
      services,
      pane: ListPane::new(query, SORT_COLUMNS),
      availability: HashMap::new(),
      saves: Tasks::new(),
    }
  }

  fn toggle_selected(&mut self) -> ViewAction {
    let Some(agent) = self.pane.selected() else {
      return ViewAction::None;
    };
    let id = agent.id.clone();
    let current = agent.available;

    if self.availability.get(&id).is_some_and(|state| state.is_pending()) {
      return ViewAction::Toast(Toast::info(format!("Still saving {}", agent.name)));
    }

    // Snapshot what is on screen now, which a refetch may have changed
    let wanted = !current;
    let mut state = Optimistic::new(current);
    state.apply(wanted);
    self.availability.insert(id.clone(), state);
    self.show(&id, wanted);

    let dispatch = self.services.dispatch.clone();
    self.saves.spawn(async move {
      let result = dispatch
        .set_availability(&id, wanted)
        .await
        .map_err(|e| e.to_string());
      (id, result)
    });
    ViewAction::None
  }

  fn show(&mut self, id: &str, available: bool) {
    self.pane.query_mut().update(|agents| {
      if let Some(agent) = agents.iter_mut().find(|a| a.id == id) {
        agent.available = available;
      }
    });
  }

  /// A refetch that lands mid-save must not undo the tentative value
  fn overlay_pending(&mut self) {
    let pending: Vec<(String, bool)> = self
      .availability
      .iter()
      .filter(|(_, state)| state.is_pending())
      .map(|(id, state)| (id.clone(), *state.value()))
      .collect();
    for (id, available) in pending {
      self.show(&id, available);
    }
  }

  fn settle(&mut self, id: String, result: Result<(), String>) -> ViewAction {
    let Some(state) = self.availability.get_mut(&id) else {
      return ViewAction::None;
    };

    match result {
      Ok(()) => {
        state.commit();
        let word = if *state.value() { "available" } else { "unavailable" };
        ViewAction::Toast(Toast::info(format!("Agent marked {}", word)))
      }
      Err(e) => {
        state.rollback();
        let restored = *state.value();
        self.show(&id, restored);
        ViewAction::Toast(Toast::error(format!("Availability not saved: {}", e)))
      }
    }
  }
}

impl View for AgentListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let KeyResult::Handled = self.pane.handle_key(key) {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char(' ') => return self.toggle_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let header = Row::new(vec!["", "Name", "Email", "Skills", "Jobs"]);
    let widths = [
      Constraint::Length(2),
      Constraint::Percentage(25),
      Constraint::Percentage(30),
      Constraint::Percentage(35),
      Constraint::Length(5),
    ];
    let pending: Vec<&str> = self
      .availability
      .iter()
      .filter(|(_, state)| state.is_pending())
      .map(|(id, _)| id.as_str())
      .collect();

    self.pane.render(frame, area, "Agents", header, &widths, |agent| {
      let (dot, color) = match (agent.available, pending.contains(&agent.id.as_str())) {
        (_, true) => ("…", Color::Yellow),
        (true, false) => ("●", Color::Green),
        (false, false) => ("○", Color::DarkGray),
      };
      Row::new(vec![
        Cell::from(dot).style(Style::default().fg(color)),
        Cell::from(truncate(&agent.name, 30)),
        Cell::from(truncate(&agent.email, 36)).style(Style::default().fg(Color::DarkGray)),
        Cell::from(truncate(&agent.skills.join(", "), 40)),
        Cell::from(agent.active_jobs.to_string()),
      ])
    });
  }

  fn breadcrumb_label(&self) -> String {
    "Agents".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.pane.tick() {
      self.overlay_pending();
    }
    match self.saves.try_next() {
      Some((id, result)) => self.settle(id, result),
      None => ViewAction::None,
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.pane.is_searching()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = list_shortcuts();
    shortcuts.push(Shortcut::new("space", "availability").with_priority(50));
    shortcuts
  }
}

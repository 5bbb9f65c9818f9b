use super::{KeyResult, SearchEvent, SearchInput};
use crate::listing::{ListFilter, Listable};
use crate::query::ApiQuery;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::query_badge;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use serde::de::DeserializeOwned;

/// A searchable, sortable table backed by a list query.
///
/// Owns the navigation keys shared by every list view (`j`/`k`, `g`/`G`,
/// `/`, `o`, `r`); views handle whatever it passes back.
pub struct ListPane<T> {
  query: ApiQuery<Vec<T>>,
  filter: ListFilter,
  search: SearchInput,
  state: TableState,
}

impl<T: Listable + DeserializeOwned> ListPane<T> {
  pub fn new(query: ApiQuery<Vec<T>>, sort_columns: &'static [&'static str]) -> Self {
    Self {
      query,
      filter: ListFilter::new(sort_columns),
      search: SearchInput::new(),
      state: TableState::default().with_selected(Some(0)),
    }
  }

  pub fn query(&self) -> &ApiQuery<Vec<T>> {
    &self.query
  }

  pub fn query_mut(&mut self) -> &mut ApiQuery<Vec<T>> {
    &mut self.query
  }

  fn items(&self) -> &[T] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Items after search and sort, in display order
  pub fn visible(&self) -> Vec<&T> {
    let items = self.items();
    self
      .filter
      .apply(items)
      .into_iter()
      .filter_map(|i| items.get(i))
      .collect()
  }

  pub fn selected(&self) -> Option<&T> {
    let idx = self.state.selected()?;
    self.visible().get(idx).copied()
  }

  pub fn is_searching(&self) -> bool {
    self.search.is_active()
  }

  /// Apply any finished fetch. Returns true when the data changed.
  pub fn tick(&mut self) -> bool {
    self.query.poll()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<()> {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(needle)) => {
        self.filter.needle = needle;
        self.state.select(Some(0));
        return KeyResult::Handled;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return KeyResult::Handled,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.state.select_last(),
      KeyCode::Char('o') => self.filter.cycle_sort(),
      KeyCode::Char('r') => self.query.revalidate(),
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  pub fn render<F>(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    label: &str,
    header: Row<'static>,
    widths: &[Constraint],
    row: F,
  ) where
    F: Fn(&T) -> Row<'static>,
  {
    let rows: Vec<Row> = self.visible().into_iter().map(&row).collect();
    ensure_valid_selection(&mut self.state, rows.len());

    let mut title = format!(" {} ({}){} ", label, rows.len(), query_badge(&self.query));
    if !self.filter.needle.is_empty() {
      title.push_str(&format!("/{} ", self.filter.needle));
    }

    let block = Block::default()
      .title(title)
      .title_bottom(Line::from(format!(" sort: {} ", self.filter.label())).right_aligned())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if rows.is_empty() {
      let content = if self.query.is_loading() {
        "Loading...".to_string()
      } else if let Some(e) = self.query.error() {
        format!("Failed to load: {}. Press 'r' to retry.", e)
      } else if !self.filter.needle.is_empty() {
        "No matches.".to_string()
      } else {
        "Nothing here yet.".to_string()
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    } else {
      let table = Table::new(rows, widths.to_vec())
        .header(header.style(Style::default().fg(Color::Yellow).bold()))
        .block(block)
        .row_highlight_style(
          Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
      frame.render_stateful_widget(table, area, &mut self.state);
    }

    self.search.render_overlay(frame, area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MockApi;
  use crate::api::types::Agent;
  use crate::cache::{ApiCache, MemoryStore};
  use crate::query::QueryOptions;
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn pane() -> ListPane<Agent> {
    let cache = ApiCache::new(MemoryStore::default(), "test:");
    cache.store(
      "/agents",
      json!([
        {"id": "a1", "name": "Rosa", "available": true, "active_jobs": 2},
        {"id": "a2", "name": "Tom", "available": false, "active_jobs": 0},
        {"id": "a3", "name": "Ines", "available": true, "active_jobs": 1}
      ]),
    );
    let query = ApiQuery::new(
      "/agents",
      cache,
      Arc::new(MockApi::new()),
      QueryOptions::default().enabled(false),
    );
    ListPane::new(query, &["name"])
  }

  #[tokio::test]
  async fn test_disabled_query_shows_nothing() {
    let pane = pane();
    assert!(pane.visible().is_empty());
    assert!(pane.selected().is_none());
  }

  #[tokio::test]
  async fn test_search_narrows_and_resets_selection() {
    let mut pane = pane();
    pane.query_mut().set_enabled(true);
    assert_eq!(pane.visible().len(), 3);

    pane.handle_key(key(KeyCode::Char('j')));
    pane.handle_key(key(KeyCode::Char('/')));
    assert!(pane.is_searching());
    pane.handle_key(key(KeyCode::Char('o')));
    assert_eq!(pane.visible().len(), 2);
    assert_eq!(pane.selected().map(|a| a.name.as_str()), Some("Rosa"));
  }

  #[tokio::test]
  async fn test_navigation_follows_sorted_order() {
    let mut pane = pane();
    pane.query_mut().set_enabled(true);
    // name ascending: Ines, Rosa, Tom
    assert_eq!(pane.selected().map(|a| a.name.as_str()), Some("Ines"));
    pane.handle_key(key(KeyCode::Char('j')));
    assert_eq!(pane.selected().map(|a| a.name.as_str()), Some("Rosa"));
    // Flip to descending
    pane.handle_key(key(KeyCode::Char('o')));
    pane.handle_key(key(KeyCode::Char('g')));
    assert_eq!(pane.selected().map(|a| a.name.as_str()), Some("Tom"));
  }

  #[tokio::test]
  async fn test_unknown_key_not_handled() {
    let mut pane = pane();
    assert_eq!(pane.handle_key(key(KeyCode::Char('t'))), KeyResult::NotHandled);
  }
}

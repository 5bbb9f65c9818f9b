use crate::api::{endpoints, ApiCall, ApiClient};
use crate::cache::{ApiCache, DurableStore, NoopStore, SqliteStore};
use crate::config::{extract_host, Config};
use crate::dispatch::Dispatch;
use crate::event::{Event, EventHandler};
use crate::query::{ApiQuery, QueryOptions};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Toast};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{
  AgentListView, AnalyticsView, ExpenseListView, InvoiceListView, JobListView,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use serde::de::DeserializeOwned;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a view needs to read and write backend data
#[derive(Clone)]
pub struct Services {
  pub cache: ApiCache,
  pub api: Arc<dyn ApiCall>,
  pub dispatch: Dispatch,
  pub stale_after: chrono::Duration,
  pub downloads_dir: PathBuf,
}

impl Services {
  pub fn from_config(config: &Config) -> Result<Self> {
    let client = ApiClient::new(config)?;
    let cache = ApiCache::with_shared_store(open_store(config), &config.cache.key_prefix);
    let stale_after =
      chrono::Duration::seconds(config.cache.stale_after_secs.min(u64::from(u32::MAX)) as i64);

    Ok(Self {
      api: Arc::new(client.clone()),
      dispatch: Dispatch::new(client, cache.clone()),
      cache,
      stale_after,
      downloads_dir: config.downloads_dir(),
    })
  }

  /// Mount a query for `endpoint` with the configured staleness window
  pub fn query<T: DeserializeOwned>(&self, endpoint: impl Into<String>) -> ApiQuery<T> {
    ApiQuery::new(
      endpoint,
      self.cache.clone(),
      Arc::clone(&self.api),
      QueryOptions::default().stale_after(self.stale_after),
    )
  }

  /// Warm the cache for `endpoint` in the background
  pub fn prefetch(&self, endpoint: impl Into<String>) {
    let endpoint = endpoint.into();
    let api = Arc::clone(&self.api);
    let path = endpoint.clone();
    self.cache.prefetch(endpoint, move || api.call(&path));
  }
}

/// Durable tier for the cache. Falls back to no persistence if SQLite fails.
fn open_store(config: &Config) -> Arc<dyn DurableStore> {
  if !config.cache.persist {
    return Arc::new(NoopStore);
  }

  let opened = match &config.cache.path {
    Some(path) => SqliteStore::open(path),
    None => SqliteStore::default_path().and_then(|path| SqliteStore::open(&path)),
  };
  match opened {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, "durable cache unavailable, keeping responses in memory only");
      Arc::new(NoopStore)
    }
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  command_input: CommandInput,
  toast: Option<Toast>,
  services: Services,
  title: String,
  host: String,
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, services: Services) -> Self {
    let root: Box<dyn View> = Box::new(JobListView::new(services.clone()));
    Self {
      view_stack: vec![root],
      command_input: CommandInput::new(),
      toast: None,
      services,
      title: config.display_title(),
      host: extract_host(&config.api.url).to_string(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Views one keypress away open from cache
    self.services.prefetch(endpoints::agents());
    self.services.prefetch(endpoints::invoices(None));
    self.services.prefetch(endpoints::analytics_summary());

    let result = self.event_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
    }
  }

  fn tick(&mut self) {
    if self.toast.as_ref().is_some_and(Toast::is_expired) {
      self.toast = None;
    }

    // Only the visible view polls; others catch up when they return
    let action = match self.view_stack.last_mut() {
      Some(view) => view.tick(),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      self.should_quit = true;
      return;
    }

    let capturing = self
      .view_stack
      .last()
      .is_some_and(|view| view.is_capturing_input());
    if !capturing {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Toast(toast) => self.toast = Some(toast),
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    let services = self.services.clone();
    let root: Box<dyn View> = match cmd {
      "jobs" => Box::new(JobListView::new(services)),
      "agents" => Box::new(AgentListView::new(services)),
      "invoices" => Box::new(InvoiceListView::new(services)),
      "expenses" => Box::new(ExpenseListView::new(services)),
      "analytics" => Box::new(AnalyticsView::new(services)),
      "clear-cache" => {
        self.services.cache.invalidate(None);
        info!("cache cleared from command palette");
        self.toast = Some(Toast::info("Cache cleared"));
        return;
      }
      "quit" => {
        self.should_quit = true;
        return;
      }
      other => {
        self.toast = Some(Toast::error(format!("Unknown command: {}", other)));
        return;
      }
    };

    self.view_stack.clear();
    self.view_stack.push(root);
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn toast(&self) -> Option<&Toast> {
    self.toast.as_ref()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn host(&self) -> &str {
    &self.host
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }
}

/// Services wired to a scripted API and an in-memory store. Mutations go
/// to a closed local port and fail.
#[cfg(test)]
pub fn test_services() -> (Services, Arc<crate::api::mock::MockApi>) {
  use crate::cache::MemoryStore;

  let api = Arc::new(crate::api::mock::MockApi::new());
  let cache = ApiCache::new(MemoryStore::new(), "test:");
  let client = ApiClient::with_token("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
  let services = Services {
    cache: cache.clone(),
    api: api.clone(),
    dispatch: Dispatch::new(client, cache),
    stale_after: chrono::Duration::minutes(5),
    downloads_dir: std::env::temp_dir(),
  };
  (services, api)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> Config {
    serde_yaml::from_str("api:\n  url: https://dispatch.example.com/api\n").unwrap()
  }

  fn app() -> App {
    let (services, _api) = test_services();
    App::new(&config(), services)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_command(app: &mut App, cmd: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in cmd.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_starts_on_jobs() {
    let app = app();
    assert_eq!(app.breadcrumb(), vec!["Jobs".to_string()]);
    assert_eq!(app.host(), "dispatch.example.com");
  }

  #[tokio::test]
  async fn test_command_replaces_root() {
    let mut app = app();
    type_command(&mut app, "agents");
    assert_eq!(app.breadcrumb(), vec!["Agents".to_string()]);
    assert!(!app.command_input().is_active());
  }

  #[tokio::test]
  async fn test_clear_cache_command() {
    let mut app = app();
    app.services.cache.store("/jobs", serde_json::json!([]));
    type_command(&mut app, "cc");
    assert!(!app.services.cache.contains("/jobs"));
    assert!(app.toast().is_some());
  }

  #[tokio::test]
  async fn test_pop_at_root_quits() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_colon_goes_to_search_while_searching() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('/')));
    app.handle_key(key(KeyCode::Char(':')));
    assert!(!app.command_input().is_active());
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let mut app = app();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}

use crate::ui::components::Toast;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
  /// Lower = shown first
  pub priority: u8,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request from the App
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Show a message in the footer
  Toast(Toast),
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, filters) and return actions
/// for the App to execute: App → View → Components.
///
/// Views that load data hold an `ApiQuery` and poll it in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll queries and background work
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// True while the view owns the keyboard (an open search box).
  /// The App then leaves `:` and `q` to the view.
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}

/// Shortcuts shared by every list view
pub fn list_shortcuts() -> Vec<Shortcut> {
  vec![
    Shortcut::new(":", "command").with_priority(10),
    Shortcut::new("/", "search").with_priority(20),
    Shortcut::new("o", "sort").with_priority(30),
    Shortcut::new("r", "refresh").with_priority(40),
    Shortcut::new("q", "back").with_priority(90),
  ]
}

mod command_input;
mod input;
mod key_result;
mod list_pane;
mod search_input;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
pub use list_pane::ListPane;
pub use search_input::{SearchEvent, SearchInput};
pub use toast::{Toast, ToastLevel};

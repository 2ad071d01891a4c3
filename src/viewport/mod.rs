//! Page navigation and zoom

mod page_input;
mod state;

pub use page_input::{PageInput, PageInputOutcome};
pub use state::{Command, Effect, ViewportState};

// Export modules for use in tests
pub mod content;
pub mod export;
pub mod geometry;
pub mod notification;
pub mod panic_handler;
pub mod render;
pub mod selection;
pub mod service;
pub mod session;
pub mod settings;
pub mod viewport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use content::{PageContent, PageContentStore, SelectableElement, normalize};
pub use session::{Session, SessionConfig, SessionError, SessionSnapshot};

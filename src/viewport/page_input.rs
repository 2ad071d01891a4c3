//! Direct page-number entry
//!
//! Only digits are accepted. An unparsable or out-of-domain value never
//! surfaces as an error; the field snaps back to the current page.

use log::debug;

use super::state::{Command, Effect, ViewportState};
use crate::content::PageDomain;

/// Result of committing the page field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageInputOutcome {
    /// Moved to the given page
    Navigated(u32),
    /// The field already named the current page
    Unchanged,
    /// The entry was rejected and the field reverted
    Reverted,
}

#[derive(Clone, Debug, Default)]
pub struct PageInput {
    text: String,
    editing: bool,
}

impl PageInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently shown in the field
    #[must_use]
    pub fn display(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Mirror the viewport when the user is not typing
    pub fn sync(&mut self, current_page: Option<u32>) {
        if !self.editing {
            self.text = current_page.map(|p| p.to_string()).unwrap_or_default();
        }
    }

    /// Accept a keystroke; non-digits are dropped. Returns whether it was taken.
    pub fn push_char(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() {
            return false;
        }
        if !self.editing {
            self.editing = true;
            self.text.clear();
        }
        self.text.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.editing = true;
        self.text.pop();
    }

    /// Replace the field contents, keeping digits only
    pub fn set_text(&mut self, text: &str) {
        self.editing = true;
        self.text = text.chars().filter(char::is_ascii_digit).collect();
    }

    /// Abandon the entry and show the current page again
    pub fn cancel(&mut self, current_page: Option<u32>) {
        self.editing = false;
        self.sync(current_page);
    }

    /// Parse and validate the entry, navigating when it names a known page
    pub fn commit<D>(
        &mut self,
        viewport: &mut ViewportState,
        domain: &D,
    ) -> (PageInputOutcome, Vec<Effect>)
    where
        D: PageDomain + ?Sized,
    {
        let parsed = self.text.parse::<u32>().ok();
        self.editing = false;

        let outcome = match parsed {
            Some(page) if viewport.current_page == Some(page) => (PageInputOutcome::Unchanged, vec![]),
            Some(page) if domain.contains_page(page) => {
                let effects = viewport.apply(Command::GoToPage(page), domain);
                (PageInputOutcome::Navigated(page), effects)
            }
            _ => {
                debug!("Rejected page entry {:?}", self.text);
                (PageInputOutcome::Reverted, vec![])
            }
        };

        self.sync(viewport.current_page);
        outcome
    }
}

//! Element selection and inline text editing

use serde::Serialize;

use crate::content::PageContent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no element is selected")]
    NothingSelected,

    #[error("element '{0}' is not on the current page")]
    UnknownElement(String),

    #[error("element '{0}' is not a text element")]
    NotEditable(String),

    #[error("no edit is open")]
    NoEditOpen,
}

/// Selected element and the text of an open edit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub selected_element_id: Option<String>,
    /// Present only while an edit is open
    pub pending_edit_text: Option<String>,
}

/// Edit committed by the user, for the shell to persist upstream
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditCommit {
    pub element_id: String,
    pub new_text: String,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.state.selected_element_id.as_deref()
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.state.pending_edit_text.is_some()
    }

    /// Select an element; any open edit is dropped
    pub fn select(&mut self, element_id: impl Into<String>) {
        self.state.selected_element_id = Some(element_id.into());
        self.state.pending_edit_text = None;
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::default();
    }

    /// Open an edit on the selected text element, seeded with its text
    pub fn begin_edit(&mut self, page: &PageContent) -> Result<&str, SelectionError> {
        let id = self
            .state
            .selected_element_id
            .as_deref()
            .ok_or(SelectionError::NothingSelected)?;
        let element = page
            .element(id)
            .ok_or_else(|| SelectionError::UnknownElement(id.to_string()))?;
        if !element.is_editable() {
            return Err(SelectionError::NotEditable(id.to_string()));
        }

        let text = element.text().unwrap_or_default().to_string();
        Ok(self.state.pending_edit_text.insert(text).as_str())
    }

    /// Replace the pending text while the edit is open
    pub fn update_pending(&mut self, text: impl Into<String>) -> Result<(), SelectionError> {
        match self.state.pending_edit_text.as_mut() {
            Some(pending) => {
                *pending = text.into();
                Ok(())
            }
            None => Err(SelectionError::NoEditOpen),
        }
    }

    /// Close the edit and hand back what must be written into the element
    pub fn commit_edit(&mut self, new_text: impl Into<String>) -> Result<EditCommit, SelectionError> {
        if !self.is_editing() {
            return Err(SelectionError::NoEditOpen);
        }
        let element_id = self
            .state
            .selected_element_id
            .clone()
            .ok_or(SelectionError::NothingSelected)?;

        self.state.pending_edit_text = None;
        Ok(EditCommit {
            element_id,
            new_text: new_text.into(),
        })
    }

    /// Commit whatever is pending
    pub fn commit_pending(&mut self) -> Result<EditCommit, SelectionError> {
        let text = self
            .state
            .pending_edit_text
            .clone()
            .ok_or(SelectionError::NoEditOpen)?;
        self.commit_edit(text)
    }

    /// Discard the pending text; the selection itself stays
    pub fn cancel_edit(&mut self) {
        self.state.pending_edit_text = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ElementBox, ElementKind, SelectableElement};

    fn page() -> PageContent {
        let base = |id: &str, kind| SelectableElement {
            id: id.to_string(),
            page: 1,
            bbox: ElementBox::new(0.0, 0.0, 5.0, 5.0),
            kind,
        };
        PageContent {
            elements: vec![
                base(
                    "t",
                    ElementKind::Text {
                        text: "Total".to_string(),
                        word_positions: String::new(),
                    },
                ),
                base(
                    "c",
                    ElementKind::Cell {
                        text: "12".to_string(),
                    },
                ),
            ],
            ..PageContent::new(1)
        }
    }

    #[test]
    fn begin_edit_copies_text() {
        let mut sel = SelectionController::new();
        sel.select("t");
        assert_eq!(sel.begin_edit(&page()).unwrap(), "Total");
        assert!(sel.is_editing());
        assert_eq!(sel.state().pending_edit_text.as_deref(), Some("Total"));
    }

    #[test]
    fn begin_edit_rejects_non_text_and_missing() {
        let mut sel = SelectionController::new();
        assert_eq!(sel.begin_edit(&page()), Err(SelectionError::NothingSelected));

        sel.select("c");
        assert_eq!(
            sel.begin_edit(&page()),
            Err(SelectionError::NotEditable("c".to_string()))
        );

        sel.select("gone");
        assert_eq!(
            sel.begin_edit(&page()),
            Err(SelectionError::UnknownElement("gone".to_string()))
        );
        assert!(!sel.is_editing());
    }

    #[test]
    fn commit_closes_edit_and_keeps_selection() {
        let mut sel = SelectionController::new();
        sel.select("t");
        sel.begin_edit(&page()).unwrap();

        let commit = sel.commit_edit("Grand total").unwrap();
        assert_eq!(
            commit,
            EditCommit {
                element_id: "t".to_string(),
                new_text: "Grand total".to_string()
            }
        );
        assert!(!sel.is_editing());
        assert_eq!(sel.selected_id(), Some("t"));
    }

    #[test]
    fn commit_without_edit_fails() {
        let mut sel = SelectionController::new();
        sel.select("t");
        assert_eq!(sel.commit_edit("x"), Err(SelectionError::NoEditOpen));
    }

    #[test]
    fn cancel_discards_pending_text() {
        let mut sel = SelectionController::new();
        sel.select("t");
        sel.begin_edit(&page()).unwrap();
        sel.update_pending("draft").unwrap();
        sel.cancel_edit();

        assert!(!sel.is_editing());
        assert_eq!(sel.selected_id(), Some("t"));
        assert_eq!(sel.update_pending("late"), Err(SelectionError::NoEditOpen));
    }

    #[test]
    fn commit_pending_uses_updated_text() {
        let mut sel = SelectionController::new();
        sel.select("t");
        sel.begin_edit(&page()).unwrap();
        sel.update_pending("Subtotal").unwrap();
        assert_eq!(sel.commit_pending().unwrap().new_text, "Subtotal");
    }

    #[test]
    fn select_drops_open_edit_and_clear_resets() {
        let mut sel = SelectionController::new();
        sel.select("t");
        sel.begin_edit(&page()).unwrap();
        sel.select("c");
        assert!(!sel.is_editing());

        sel.clear();
        assert_eq!(sel.state(), &SelectionState::default());
    }
}

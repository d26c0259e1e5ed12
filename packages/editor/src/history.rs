//! # Undo/Redo History
//!
//! Tracks applied transactions and enables undo/redo.
//!
//! ## Design
//!
//! - Each document-changing transaction records its steps and their inverses
//! - Undo applies the inverses and moves the entry to the redo stack
//! - Redo reapplies the original steps
//! - New edits clear the redo stack
//! - The history lives inside the editor state, so every state transition
//!   produces a new history value; entries are shared between values

use std::rc::Rc;

use folio_transform::Step;

use crate::errors::EditorResult;
use crate::selection::Selection;
use crate::state::Transaction;

/// Default maximum number of undo levels
pub const DEFAULT_DEPTH: usize = 100;

/// One undoable transaction
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Steps in application order
    pub steps: Vec<Step>,

    /// Inverse steps, in reverse order for undo
    pub inverses: Vec<Step>,

    pub selection_before: Selection,
    pub selection_after: Selection,
}

/// Marks a transaction produced by undo or redo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

#[derive(Debug, Clone)]
pub struct History {
    /// Applied entries (most recent last)
    done: Vec<Rc<HistoryEntry>>,

    /// Undone entries (most recent last)
    undone: Vec<Rc<HistoryEntry>>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_DEPTH)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            max_levels,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.done.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.undone.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Entry the next undo reverts
    pub fn undo_entry(&self) -> Option<&HistoryEntry> {
        self.done.last().map(Rc::as_ref)
    }

    /// Entry the next redo reapplies
    pub fn redo_entry(&self) -> Option<&HistoryEntry> {
        self.undone.last().map(Rc::as_ref)
    }

    /// History after `tr` has been applied
    pub(crate) fn apply(&self, tr: &Transaction, selection_before: Selection) -> EditorResult<History> {
        let mut next = self.clone();

        match tr.history_action() {
            Some(HistoryAction::Undo) => {
                if let Some(entry) = next.done.pop() {
                    next.undone.push(entry);
                }
            }
            Some(HistoryAction::Redo) => {
                if let Some(entry) = next.undone.pop() {
                    next.done.push(entry);
                }
            }
            None if tr.doc_changed() && tr.add_to_history() => {
                let mut inverses = tr
                    .steps()
                    .iter()
                    .zip(tr.transform().docs())
                    .map(|(step, doc)| step.invert(doc))
                    .collect::<Result<Vec<_>, _>>()?;
                inverses.reverse();

                next.push(HistoryEntry {
                    steps: tr.steps().to_vec(),
                    inverses,
                    selection_before,
                    selection_after: tr.selection(),
                });
            }
            None => {}
        }

        Ok(next)
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.done.push(Rc::new(entry));
        if self.max_levels > 0 && self.done.len() > self.max_levels {
            self.done.remove(0);
        }
        self.undone.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EditorState;
    use crate::test_support::{doc_from, registry};
    use serde_json::json;

    fn state_with(max_levels: usize) -> EditorState {
        let registry = registry();
        let doc = doc_from(
            &registry,
            json!({"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "a"}]}]}),
        );
        EditorState::new(registry.schema().clone(), doc, max_levels)
    }

    fn type_char(state: &EditorState, text: &str) -> EditorState {
        let mut tr = state.tr();
        tr.insert_text(text).unwrap();
        state.apply(tr).unwrap()
    }

    #[test]
    fn test_records_document_changes() {
        let state = state_with(100);
        assert!(!state.history().can_undo());

        let state = type_char(&state, "b");
        assert_eq!(state.history().undo_levels(), 1);
        assert_eq!(state.history().redo_levels(), 0);

        let entry = state.history().undo_entry().unwrap();
        assert_eq!(entry.steps.len(), 1);
        assert_eq!(entry.inverses.len(), 1);
    }

    #[test]
    fn test_selection_only_changes_are_not_recorded() {
        let state = state_with(100);
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(1));
        let state = state.apply(tr).unwrap();
        assert!(!state.history().can_undo());
    }

    #[test]
    fn test_max_levels() {
        let mut state = state_with(2);
        for c in ["b", "c", "d"] {
            state = type_char(&state, c);
        }
        assert_eq!(state.history().undo_levels(), 2);
        assert_eq!(state.history().max_levels(), 2);
    }

    #[test]
    fn test_transactions_can_opt_out() {
        let state = state_with(100);
        let mut tr = state.tr();
        tr.insert_text("x").unwrap();
        tr.set_add_to_history(false);
        let state = state.apply(tr).unwrap();
        assert!(!state.history().can_undo());
    }
}

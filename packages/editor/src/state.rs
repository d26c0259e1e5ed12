//! # Editor state and transactions
//!
//! [`EditorState`] is an immutable value: `{doc, selection, stored marks,
//! history}`. A [`Transaction`] is built from a state, accumulates steps and
//! selection/mark updates, and [`EditorState::apply`] turns the pair into the
//! next state without touching the old one.

use folio_model::{Fragment, Mark, MarkType, Node, ResolvedPos, Schema};
use folio_transform::{Step, StepError, Transform};

use crate::errors::{EditorError, EditorResult};
use crate::history::{History, HistoryAction};
use crate::input_rules::AppliedInputRule;
use crate::selection::{nearest_cursor, Selection};

#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Schema,
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    history: History,

    /// Input rule applied by the previous transaction, undoable with Backspace
    input_rule: Option<AppliedInputRule>,
}

impl EditorState {
    /// State with the cursor at the start of `doc` and an empty history
    pub fn new(schema: Schema, doc: Node, history_depth: usize) -> Self {
        Self {
            selection: Selection::at_start(&doc),
            schema,
            doc,
            stored_marks: None,
            history: History::with_max_levels(history_depth),
            input_rule: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn input_rule(&self) -> Option<&AppliedInputRule> {
        self.input_rule.as_ref()
    }

    pub fn resolved_from(&self) -> EditorResult<ResolvedPos> {
        Ok(self.selection.resolve_from(&self.doc)?)
    }

    /// Marks typed text would get: the stored marks, or the marks at the
    /// selection start
    pub fn active_marks(&self) -> EditorResult<Vec<Mark>> {
        match &self.stored_marks {
            Some(marks) => Ok(marks.clone()),
            None => Ok(self.resolved_from()?.marks()),
        }
    }

    /// Start a transaction against this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    /// The state after `tr`. Fails when `tr` was started from a state with a
    /// different document.
    pub fn apply(&self, tr: Transaction) -> EditorResult<EditorState> {
        if !tr.before().ptr_eq(&self.doc) {
            return Err(EditorError::MismatchedTransaction);
        }

        let selection = tr.selection();
        let history = self.history.apply(&tr, self.selection)?;
        let input_rule = match &tr.input_rule {
            Some(rule) => Some(rule.clone()),
            None if tr.doc_changed() || tr.selection_set() => None,
            None => self.input_rule.clone(),
        };

        Ok(EditorState {
            schema: self.schema.clone(),
            doc: tr.doc().clone(),
            selection,
            stored_marks: tr.stored_marks().map(<[Mark]>::to_vec),
            history,
            input_rule,
        })
    }
}

/// An edit in progress: steps plus selection, stored-mark and history
/// metadata
#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Schema,
    transform: Transform,

    selection: Selection,
    /// Number of steps `selection` already accounts for
    selection_for: usize,
    selection_set: bool,

    stored_marks: Option<Vec<Mark>>,
    /// Number of steps `stored_marks` already accounts for; any later step
    /// clears them
    stored_marks_for: usize,

    add_to_history: bool,
    history_action: Option<HistoryAction>,
    input_rule: Option<AppliedInputRule>,
}

impl Transaction {
    fn new(state: &EditorState) -> Self {
        Self {
            schema: state.schema.clone(),
            transform: Transform::new(state.doc.clone()),
            selection: state.selection,
            selection_for: 0,
            selection_set: false,
            stored_marks: state.stored_marks.clone(),
            stored_marks_for: 0,
            add_to_history: true,
            history_action: None,
            input_rule: None,
        }
    }

    /// Current document
    pub fn doc(&self) -> &Node {
        self.transform.doc()
    }

    /// Document the transaction started from
    pub fn before(&self) -> &Node {
        self.transform.before()
    }

    pub fn steps(&self) -> &[Step] {
        self.transform.steps()
    }

    pub fn doc_changed(&self) -> bool {
        self.transform.doc_changed()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Direct access to the step builder. The selection is carried through
    /// every step added this way.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn step(&mut self, step: Step) -> EditorResult<&mut Self> {
        self.transform.step(step)?;
        Ok(self)
    }

    /// Selection mapped through all steps added since it was set
    pub fn selection(&self) -> Selection {
        let maps = self.transform.mapping().maps();
        if self.selection_for >= maps.len() {
            self.selection
        } else {
            self.selection.map(&maps[self.selection_for..], self.doc())
        }
    }

    /// Replace the selection. Clears stored marks.
    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_for = self.steps().len();
        self.selection_set = true;
        self.stored_marks = None;
        self.stored_marks_for = self.steps().len();
        self
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        if self.stored_marks_for == self.steps().len() {
            self.stored_marks.as_deref()
        } else {
            None
        }
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_for = self.steps().len();
        self
    }

    /// Add `mark` to the marks typed text would get
    pub fn add_stored_mark(&mut self, mark: &Mark) -> EditorResult<&mut Self> {
        let current = self.current_marks()?;
        Ok(self.set_stored_marks(Some(mark.add_to_set(&current))))
    }

    pub fn remove_stored_mark(&mut self, mark_type: &MarkType) -> EditorResult<&mut Self> {
        let current = self.current_marks()?;
        Ok(self.set_stored_marks(Some(mark_type.remove_from_set(&current))))
    }

    fn current_marks(&self) -> EditorResult<Vec<Mark>> {
        match self.stored_marks() {
            Some(marks) => Ok(marks.to_vec()),
            None => Ok(self.doc().resolve(self.selection().head())?.marks()),
        }
    }

    /// Delete the selected content, leaving a cursor where it started. When
    /// plain deletion would leave the parent invalid, the range is replaced
    /// by an empty default textblock instead.
    pub fn delete_selection(&mut self) -> EditorResult<&mut Self> {
        let selection = self.selection();
        if selection.is_empty() {
            return Ok(self);
        }
        let (from, to) = (selection.from(), selection.to());

        let cursor = if self.transform.delete(from, to).is_ok() {
            from
        } else {
            self.delete_across(from, to)?
        };

        let cursor = nearest_cursor(self.doc(), cursor);
        self.set_selection(Selection::cursor(cursor));
        Ok(self)
    }

    /// Delete a range whose ends sit at different depths. The blocks around
    /// it at the shared depth become the content before `from` joined with
    /// the rest of the textblock at `to`, or a single empty textblock when
    /// that join does not fit. Returns the new cursor position.
    fn delete_across(&mut self, from: usize, to: usize) -> EditorResult<usize> {
        let doc = self.doc().clone();
        let rfrom = doc.resolve(from)?;
        let rto = doc.resolve(to)?;
        let shared = rfrom.shared_depth(to);
        let (start, end) = match (rfrom.before(shared + 1), rto.after(shared + 1)) {
            (Some(start), Some(end)) => (start, end),
            _ => (from, to),
        };

        if let Some(joined) = joined_remainder(&rfrom, &rto, shared) {
            if self.transform.replace_with(start, end, joined).is_ok() {
                return Ok(from);
            }
        }

        let block = self
            .schema
            .default_textblock_type()
            .ok_or_else(|| StepError::structure("delete selection", from, "no textblock type to fill the range"))?
            .create(None, Fragment::empty(), Vec::new())?;
        self.transform.replace_with(start, end, Fragment::from_node(block))?;
        Ok(start + 1)
    }

    /// Replace the selection with `text`. The text gets the stored marks, or
    /// the marks at the selection.
    pub fn insert_text(&mut self, text: &str) -> EditorResult<&mut Self> {
        let selection = self.selection();
        self.insert_text_at(text, selection.from(), selection.to())
    }

    /// Replace `from..to` with `text`
    pub fn insert_text_at(&mut self, text: &str, from: usize, to: usize) -> EditorResult<&mut Self> {
        if text.is_empty() {
            return Ok(self);
        }
        let marks = match self.stored_marks() {
            Some(marks) => marks.to_vec(),
            None => {
                let rfrom = self.doc().resolve(from)?;
                if from == to {
                    rfrom.marks()
                } else {
                    let rto = self.doc().resolve(to)?;
                    rfrom.marks_across(&rto).unwrap_or_default()
                }
            }
        };

        let pos = if from == to {
            from
        } else {
            let selection = self.selection();
            if selection.from() == from && selection.to() == to {
                self.delete_selection()?;
                self.selection().from()
            } else {
                self.transform.delete(from, to)?;
                from
            }
        };

        let node = self.schema.text(text, marks)?;
        self.transform.insert(pos, Fragment::from_node(node))?;
        if !self.selection().is_empty() {
            let end = pos + text.chars().count();
            self.set_selection(Selection::cursor(end));
        }
        Ok(self)
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    /// Keep this transaction out of the undo history
    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    pub fn history_action(&self) -> Option<HistoryAction> {
        self.history_action
    }

    pub(crate) fn set_history_action(&mut self, action: HistoryAction) -> &mut Self {
        self.history_action = Some(action);
        self.add_to_history = false;
        self
    }

    pub(crate) fn set_input_rule(&mut self, rule: AppliedInputRule) -> &mut Self {
        self.input_rule = Some(rule);
        self
    }
}

/// The node at `shared + 1` around `rfrom`, cut at `rfrom`, with the tail of
/// the textblock at `rto` appended, followed by whatever the node at
/// `shared + 1` around `rto` still holds after that textblock
fn joined_remainder(rfrom: &ResolvedPos, rto: &ResolvedPos, shared: usize) -> Option<Fragment> {
    if rfrom.depth() <= shared || rto.depth() <= shared {
        return None;
    }
    if !rfrom.parent().is_textblock() || !rto.parent().is_textblock() {
        return None;
    }

    let head = rfrom.node(shared + 1).cut(0, rfrom.pos() - rfrom.start(shared + 1));
    let tail = rto.parent().content().cut(rto.parent_offset(), rto.parent().content().size());
    let mut nodes = vec![append_to_last_textblock(&head, &tail)?];

    if rto.depth() > shared + 1 {
        let last = rto.node(shared + 1);
        let rest = last.cut(rto.after(rto.depth())? - rto.start(shared + 1), last.content().size());
        if rest.content().size() > 0 && rest.check().is_ok() {
            nodes.push(rest);
        }
    }
    Some(Fragment::from_vec(nodes))
}

fn append_to_last_textblock(node: &Node, tail: &Fragment) -> Option<Node> {
    if node.is_textblock() {
        return Some(node.copy(node.content().append(tail)));
    }
    let index = node.child_count().checked_sub(1)?;
    let last = append_to_last_textblock(node.content().child(index), tail)?;
    Some(node.copy(node.content().replace_child(index, last)))
}

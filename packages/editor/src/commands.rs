//! # Commands
//!
//! A [`Command`] inspects a state and, when given a dispatch buffer, pushes
//! the transaction that performs it. It returns whether it applies; called
//! without a buffer it only answers that question.

use std::fmt;
use std::rc::Rc;

use folio_model::{Attrs, Fragment, MarkType, Node, NodeType, Slice};
use tracing::warn;

use crate::errors::EditorResult;
use crate::history::{HistoryAction, HistoryEntry};
use crate::input_rules::InputRule;
use crate::selection::Selection;
use crate::state::{EditorState, Transaction};

type CommandFn = dyn Fn(&EditorState, Option<&mut Vec<Transaction>>) -> bool;

#[derive(Clone)]
pub struct Command(Rc<CommandFn>);

impl Command {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EditorState, Option<&mut Vec<Transaction>>) -> bool + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn run(&self, state: &EditorState, dispatch: Option<&mut Vec<Transaction>>) -> bool {
        (self.0)(state, dispatch)
    }

    /// Whether the command applies, without performing it
    pub fn can_run(&self, state: &EditorState) -> bool {
        self.run(state, None)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Command")
    }
}

/// Build a transaction with `build` and dispatch it. Build failures mean the
/// command does not apply.
fn run_with<F>(state: &EditorState, dispatch: Option<&mut Vec<Transaction>>, build: F) -> bool
where
    F: FnOnce(&mut Transaction) -> EditorResult<bool>,
{
    let mut tr = state.tr();
    match build(&mut tr) {
        Ok(true) => {
            if let Some(dispatch) = dispatch {
                dispatch.push(tr);
            }
            true
        }
        Ok(false) | Err(_) => false,
    }
}

/// Try each command in turn until one applies
pub fn chain(commands: Vec<Command>) -> Command {
    Command::new(move |state, mut dispatch| {
        commands
            .iter()
            .any(|command| command.run(state, dispatch.as_deref_mut()))
    })
}

/// Command for capabilities that cannot be invoked
pub fn inapplicable() -> Command {
    Command::new(|_, _| false)
}

fn mark_applies(doc: &Node, from: usize, to: usize, mark_type: &MarkType) -> bool {
    if from == to {
        return doc
            .resolve(from)
            .map(|rpos| rpos.parent().inline_content() && rpos.parent().ty().allows_mark_type(mark_type))
            .unwrap_or(false);
    }
    let mut applies = doc.inline_content() && doc.ty().allows_mark_type(mark_type);
    doc.nodes_between(from, to, |node, _, _, _| {
        if applies {
            return false;
        }
        applies = node.inline_content() && node.ty().allows_mark_type(mark_type);
        true
    });
    applies
}

/// Add `mark_type` to the selection, or remove it when the selection already
/// has it. With a cursor, toggles the stored marks instead.
pub fn toggle_mark(mark_type: MarkType, attrs: Option<Attrs>) -> Command {
    Command::new(move |state, dispatch| {
        let selection = state.selection();
        let (from, to) = (selection.from(), selection.to());
        if !mark_applies(state.doc(), from, to, &mark_type) {
            return false;
        }

        run_with(state, dispatch, |tr| {
            if selection.cursor_pos().is_some() {
                if mark_type.is_in_set(&state.active_marks()?).is_some() {
                    tr.remove_stored_mark(&mark_type)?;
                } else {
                    tr.add_stored_mark(&mark_type.create(attrs.as_ref())?)?;
                }
            } else if state.doc().range_has_mark(from, to, &mark_type) {
                tr.transform_mut().remove_mark(from, to, &mark_type)?;
            } else {
                tr.transform_mut().add_mark(from, to, &mark_type.create(attrs.as_ref())?)?;
            }
            Ok(true)
        })
    })
}

/// Turn the selected textblocks into `ty`
pub fn set_block_type(ty: NodeType, attrs: Option<Attrs>) -> Command {
    Command::new(move |state, dispatch| {
        let selection = state.selection();
        run_with(state, dispatch, |tr| {
            tr.transform_mut()
                .set_block_type(selection.from(), selection.to(), &ty, attrs.as_ref())?;
            Ok(tr.doc_changed())
        })
    })
}

/// Turn the selected textblocks into `ty`, or back into `fallback` when the
/// block at the selection already is one
pub fn toggle_block_type(ty: NodeType, attrs: Option<Attrs>, fallback: NodeType) -> Command {
    Command::new(move |state, dispatch| {
        let Ok(rfrom) = state.resolved_from() else {
            return false;
        };
        let current = rfrom.parent();
        let is_active = current.ty() == &ty
            && attrs
                .as_ref()
                .map(|attrs| attrs.iter().all(|(k, v)| current.attr(k) == Some(v)))
                .unwrap_or(true);

        let selection = state.selection();
        run_with(state, dispatch, |tr| {
            let (target, target_attrs) = if is_active {
                (&fallback, None)
            } else {
                (&ty, attrs.as_ref())
            };
            tr.transform_mut()
                .set_block_type(selection.from(), selection.to(), target, target_attrs)?;
            Ok(tr.doc_changed())
        })
    })
}

/// Wrap the selected blocks in a node of type `ty`
pub fn wrap_in(ty: NodeType, attrs: Option<Attrs>) -> Command {
    Command::new(move |state, dispatch| {
        let selection = state.selection();
        run_with(state, dispatch, |tr| {
            tr.transform_mut()
                .wrap(selection.from(), selection.to(), &ty, attrs.as_ref())?;
            Ok(true)
        })
    })
}

/// Replace the selection with a leaf node of type `ty`
pub fn insert_node(ty: NodeType) -> Command {
    Command::new(move |state, dispatch| {
        let Ok(rfrom) = state.resolved_from() else {
            return false;
        };
        if !rfrom.parent().inline_content() {
            return false;
        }
        run_with(state, dispatch, |tr| {
            let node = ty.create(None, Fragment::empty(), Vec::new())?;
            tr.delete_selection()?;
            let pos = tr.selection().from();
            tr.transform_mut().insert(pos, Fragment::from_node(node))?;
            tr.set_selection(Selection::cursor(pos + 1));
            Ok(true)
        })
    })
}

/// Select the smallest node that contains the whole selection
pub fn select_parent_node() -> Command {
    Command::new(|state, dispatch| {
        let selection = state.selection();
        let Ok(rfrom) = state.resolved_from() else {
            return false;
        };
        let depth = rfrom.shared_depth(selection.to());
        let Some(pos) = rfrom.before(depth) else {
            return false;
        };
        run_with(state, dispatch, |tr| {
            tr.set_selection(Selection::node(state.doc(), pos)?);
            Ok(true)
        })
    })
}

pub fn select_all() -> Command {
    Command::new(|state, dispatch| {
        run_with(state, dispatch, |tr| {
            tr.set_selection(Selection::all(state.doc()));
            Ok(true)
        })
    })
}

fn history_command(action: HistoryAction) -> Command {
    Command::new(move |state, dispatch| {
        let entry = match action {
            HistoryAction::Undo => state.history().undo_entry(),
            HistoryAction::Redo => state.history().redo_entry(),
        };
        let Some(entry) = entry else {
            return false;
        };
        let Some(dispatch) = dispatch else {
            return true;
        };

        match history_transaction(state, entry, action) {
            Ok(tr) => {
                dispatch.push(tr);
                true
            }
            Err(err) => {
                warn!(error = %err, ?action, "history entry no longer applies");
                false
            }
        }
    })
}

fn history_transaction(state: &EditorState, entry: &HistoryEntry, action: HistoryAction) -> EditorResult<Transaction> {
    let (steps, selection) = match action {
        HistoryAction::Undo => (&entry.inverses, entry.selection_before),
        HistoryAction::Redo => (&entry.steps, entry.selection_after),
    };
    let mut tr = state.tr();
    for step in steps {
        tr.step(step.clone())?;
    }
    tr.set_selection(selection);
    tr.set_history_action(action);
    Ok(tr)
}

pub fn undo() -> Command {
    history_command(HistoryAction::Undo)
}

pub fn redo() -> Command {
    history_command(HistoryAction::Redo)
}

/// Revert the input rule applied by the last transaction, keeping the text
/// that triggered it
pub fn undo_input_rule() -> Command {
    Command::new(|state, dispatch| {
        let Some(rule) = state.input_rule() else {
            return false;
        };
        run_with(state, dispatch, |tr| {
            for step in &rule.inverses {
                tr.step(step.clone())?;
            }
            tr.insert_text_at(&rule.text, rule.from, rule.to)?;
            let end = rule.from + rule.text.chars().count();
            tr.set_selection(Selection::cursor(end));
            Ok(true)
        })
    })
}

pub fn delete_selection() -> Command {
    Command::new(|state, dispatch| {
        if state.selection().is_empty() {
            return false;
        }
        run_with(state, dispatch, |tr| {
            tr.delete_selection()?;
            Ok(true)
        })
    })
}

/// Delete the character or inline node before the cursor
pub fn delete_char_backward() -> Command {
    Command::new(|state, dispatch| {
        let Some(pos) = state.selection().cursor_pos() else {
            return false;
        };
        let Ok(rpos) = state.doc().resolve(pos) else {
            return false;
        };
        if rpos.parent_offset() == 0 {
            return false;
        }
        run_with(state, dispatch, |tr| {
            tr.transform_mut().delete(pos - 1, pos)?;
            Ok(true)
        })
    })
}

/// Delete the character or inline node after the cursor
pub fn delete_char_forward() -> Command {
    Command::new(|state, dispatch| {
        let Some(pos) = state.selection().cursor_pos() else {
            return false;
        };
        let Ok(rpos) = state.doc().resolve(pos) else {
            return false;
        };
        if rpos.parent_offset() >= rpos.parent().content().size() {
            return false;
        }
        run_with(state, dispatch, |tr| {
            tr.transform_mut().delete(pos, pos + 1)?;
            Ok(true)
        })
    })
}

/// Split the textblock at the cursor. At the end of a block the new block
/// gets the default textblock type.
pub fn split_block() -> Command {
    Command::new(|state, dispatch| {
        let Ok(rfrom) = state.resolved_from() else {
            return false;
        };
        if !rfrom.parent().is_textblock() {
            return false;
        }
        run_with(state, dispatch, |tr| {
            tr.delete_selection()?;
            let pos = tr.selection().from();
            let rpos = tr.doc().resolve(pos)?;
            let at_end = rpos.parent_offset() == rpos.parent().content().size();
            let default = tr.schema().default_textblock_type().cloned();
            let type_after = match &default {
                Some(ty) if at_end && rpos.parent().ty() != ty => Some((ty, None)),
                _ => None,
            };
            tr.transform_mut().split(pos, 1, type_after)?;
            Ok(true)
        })
    })
}

/// In an empty textblock inside a wrapper, move the block out of the wrapper
pub fn lift_empty_block() -> Command {
    Command::new(|state, dispatch| {
        let Some(pos) = state.selection().cursor_pos() else {
            return false;
        };
        let Ok(rpos) = state.doc().resolve(pos) else {
            return false;
        };
        if rpos.parent().content().size() > 0 || rpos.depth() < 2 {
            return false;
        }
        run_with(state, dispatch, |tr| lift_block(tr, pos))
    })
}

/// Move the textblock at `pos` out of its wrapper. A first or last child
/// leaves on its own; otherwise the whole wrapper is unwrapped when it holds
/// only this block.
fn lift_block(tr: &mut Transaction, pos: usize) -> EditorResult<bool> {
    let rpos = tr.doc().resolve(pos)?;
    let depth = rpos.depth();
    if depth < 2 {
        return Ok(false);
    }
    let wrapper = rpos.node(depth - 1).clone();
    let block = rpos.parent().clone();
    let index = rpos.index(depth - 1);
    let (Some(block_before), Some(wrapper_before)) = (rpos.before(depth), rpos.before(depth - 1)) else {
        return Ok(false);
    };
    let block_after = block_before + block.node_size();
    let wrapper_after = wrapper_before + wrapper.node_size();

    if wrapper.child_count() == 1 {
        tr.transform_mut().lift(pos)?;
        return Ok(true);
    }

    let offset = pos - block_before;
    if index == 0 {
        let content = Fragment::from_vec(vec![block, wrapper.copy(Fragment::empty())]);
        tr.transform_mut()
            .replace(wrapper_before, block_after, Slice::new(content, 0, 1))?;
        tr.set_selection(Selection::cursor(wrapper_before + offset));
    } else if index + 1 == wrapper.child_count() {
        let content = Fragment::from_vec(vec![wrapper.copy(Fragment::empty()), block]);
        tr.transform_mut()
            .replace(block_before, wrapper_after, Slice::new(content, 1, 0))?;
        tr.set_selection(Selection::cursor(block_before + 1 + offset));
    } else {
        return Ok(false);
    }
    Ok(true)
}

/// At the start of a textblock, join it with the content before it: merge
/// with a preceding textblock, move into the last textblock of a preceding
/// wrapper, delete a preceding leaf, or lift the block out of its wrapper
pub fn join_backward() -> Command {
    Command::new(|state, dispatch| {
        let Some(pos) = state.selection().cursor_pos() else {
            return false;
        };
        let Ok(rpos) = state.doc().resolve(pos) else {
            return false;
        };
        if rpos.parent_offset() > 0 || !rpos.parent().is_textblock() {
            return false;
        }
        let depth = rpos.depth();
        let cut_depth = (0..depth).rev().find(|&d| rpos.index(d) > 0);

        run_with(state, dispatch, |tr| {
            let Some(cut_depth) = cut_depth.filter(|&d| d + 1 == depth) else {
                return lift_block(tr, pos);
            };
            let Some(cut) = rpos.before(cut_depth + 1) else {
                return Ok(false);
            };
            let before = rpos.node(cut_depth).child(rpos.index(cut_depth) - 1).clone();

            if before.is_textblock() && cut_depth + 1 == depth {
                tr.transform_mut().join(cut, 1)?;
                return Ok(true);
            }
            if before.is_leaf() {
                tr.transform_mut().delete(cut - before.node_size(), cut)?;
                return Ok(true);
            }

            let Some(target_end) = last_textblock_end(&before, cut - before.node_size()) else {
                return Ok(false);
            };
            let Some(block_before) = rpos.before(depth) else {
                return Ok(false);
            };
            let block = rpos.parent().clone();
            tr.transform_mut()
                .delete(block_before, block_before + block.node_size())?;
            tr.transform_mut().insert(target_end, block.content().clone())?;
            tr.set_selection(Selection::cursor(target_end));
            Ok(true)
        })
    })
}

/// At the end of a textblock, join the content after it into it
pub fn join_forward() -> Command {
    Command::new(|state, dispatch| {
        let Some(pos) = state.selection().cursor_pos() else {
            return false;
        };
        let Ok(rpos) = state.doc().resolve(pos) else {
            return false;
        };
        if !rpos.parent().is_textblock() || rpos.parent_offset() < rpos.parent().content().size() {
            return false;
        }
        let depth = rpos.depth();
        let cut_depth =
            (0..depth).rev().find(|&d| rpos.index(d) + 1 < rpos.node(d).child_count());

        run_with(state, dispatch, |tr| {
            let Some(cut_depth) = cut_depth else {
                return Ok(false);
            };
            let Some(cut) = rpos.after(cut_depth + 1) else {
                return Ok(false);
            };
            let after = rpos.node(cut_depth).child(rpos.index(cut_depth) + 1).clone();

            if after.is_textblock() && cut_depth + 1 == depth {
                tr.transform_mut().join(cut, 1)?;
                return Ok(true);
            }
            if after.is_leaf() {
                tr.transform_mut().delete(cut, cut + after.node_size())?;
                return Ok(true);
            }

            let Some((source_before, source)) = first_textblock(&after, cut) else {
                return Ok(false);
            };
            tr.transform_mut()
                .delete(source_before, source_before + source.node_size())?;
            tr.transform_mut().insert(pos, source.content().clone())?;
            tr.set_selection(Selection::cursor(pos));
            Ok(true)
        })
    })
}

/// Content end of the last textblock inside `node`, which starts at `start`
fn last_textblock_end(node: &Node, start: usize) -> Option<usize> {
    if node.is_textblock() {
        return Some(start + 1 + node.content().size());
    }
    let last = node.last_child()?;
    let last_start = start + 1 + node.content().size() - last.node_size();
    last_textblock_end(last, last_start)
}

/// First textblock inside `node`, which starts at `start`, with its position
fn first_textblock(node: &Node, start: usize) -> Option<(usize, Node)> {
    if node.is_textblock() {
        return Some((start, node.clone()));
    }
    first_textblock(node.first_child()?, start + 1)
}

/// Insert `text` at the selection unless an input rule claims it
pub(crate) fn text_input_transaction(
    state: &EditorState,
    rules: &[InputRule],
    text: &str,
) -> EditorResult<Transaction> {
    let selection = state.selection();
    for rule in rules {
        if let Some(tr) = rule.apply(state, selection.from(), selection.to(), text) {
            return Ok(tr);
        }
    }
    let mut tr = state.tr();
    tr.insert_text(text)?;
    Ok(tr)
}

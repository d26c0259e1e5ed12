//! # Input rules
//!
//! Rules look at the text of the current textblock up to the cursor, plus
//! the text being typed, and may turn the typing into a structural edit:
//! `> ` wraps the block in a blockquote, `## ` turns it into a level-2
//! heading. The most recent rule can be undone with Backspace, which
//! restores the typed text instead.

use folio_model::{Attrs, NodeType};
use folio_transform::Step;
use serde_json::json;
use tracing::debug;

use crate::state::{EditorState, Transaction};

/// Part of the text before the cursor a rule matched
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Length of the match in characters, including the typed text
    pub len: usize,
    pub attrs: Option<Attrs>,
}

#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Turn the textblock into this type
    SetBlockType(NodeType),
    /// Wrap the textblock in a node of this type
    Wrap(NodeType),
}

#[derive(Debug, Clone)]
pub struct InputRule {
    name: &'static str,
    matcher: fn(&str) -> Option<RuleMatch>,
    action: RuleAction,
}

/// Enough to revert a rule and put the typed text back
#[derive(Debug, Clone)]
pub struct AppliedInputRule {
    /// Inverse steps of the rule, in reverse order
    pub(crate) inverses: Vec<Step>,
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) text: String,
}

impl InputRule {
    pub fn new(name: &'static str, matcher: fn(&str) -> Option<RuleMatch>, action: RuleAction) -> Self {
        Self { name, matcher, action }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Transaction applying this rule when `text` is typed over `from..to`
    pub fn apply(&self, state: &EditorState, from: usize, to: usize, text: &str) -> Option<Transaction> {
        let rfrom = state.doc().resolve(from).ok()?;
        if !rfrom.parent().is_textblock() || rfrom.depth() == 0 {
            return None;
        }
        let offset = rfrom.parent_offset();
        let mut before = rfrom.parent().content().text_between(0, offset, "");
        before.push_str(text);

        let found = (self.matcher)(&before)?;
        let typed = text.chars().count();
        let start = (from + typed).checked_sub(found.len)?;
        if start < rfrom.start(rfrom.depth()) {
            return None;
        }

        let mut tr = state.tr();
        let applied = match &self.action {
            RuleAction::SetBlockType(ty) => tr
                .transform_mut()
                .delete(start, to)
                .and_then(|t| t.set_block_type(start, start, ty, found.attrs.as_ref()))
                .is_ok(),
            RuleAction::Wrap(ty) => tr
                .transform_mut()
                .delete(start, to)
                .and_then(|t| t.wrap(start, start, ty, found.attrs.as_ref()))
                .is_ok(),
        };
        if !applied {
            return None;
        }

        let inverses = tr
            .steps()
            .iter()
            .zip(tr.transform().docs())
            .rev()
            .map(|(step, doc)| step.invert(doc))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        debug!(rule = self.name, start, "input rule applied");
        tr.set_input_rule(AppliedInputRule {
            inverses,
            from,
            to,
            text: text.to_string(),
        });
        Some(tr)
    }
}

/// `#`..`######` followed by whitespace at the start of a textblock
pub fn heading_match(text: &str) -> Option<RuleMatch> {
    let rest = text.trim_start_matches('#');
    let level = text.len() - rest.len();
    if !(1..=6).contains(&level) {
        return None;
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_whitespace() => Some(RuleMatch {
            len: level + 1,
            attrs: Some(Attrs::from([("level".to_string(), json!(level))])),
        }),
        _ => None,
    }
}

/// `>` followed by whitespace at the start of a textblock, optionally
/// indented
pub fn blockquote_match(text: &str) -> Option<RuleMatch> {
    let rest = text.trim_start();
    let rest = rest.strip_prefix('>')?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_whitespace() => Some(RuleMatch {
            len: text.chars().count(),
            attrs: None,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::test_support::{doc_from, registry};

    #[test]
    fn test_heading_match() {
        let m = heading_match("### ").unwrap();
        assert_eq!(m.len, 4);
        assert_eq!(m.attrs.unwrap()["level"], json!(3));
        assert!(heading_match("####### ").is_none());
        assert!(heading_match("#x").is_none());
        assert!(heading_match("a# ").is_none());
        assert!(heading_match(" ").is_none());
    }

    #[test]
    fn test_blockquote_match() {
        assert_eq!(blockquote_match("> ").unwrap().len, 2);
        assert_eq!(blockquote_match("  > ").unwrap().len, 4);
        assert!(blockquote_match(">x").is_none());
        assert!(blockquote_match("a> ").is_none());
    }

    #[test]
    fn test_heading_rule_converts_block() {
        let registry = registry();
        let doc = doc_from(
            &registry,
            json!({"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "##"}]}]}),
        );
        let mut state = EditorState::new(registry.schema().clone(), doc, 100);
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(3));
        state = state.apply(tr).unwrap();

        let heading = registry.schema().node_type("heading").unwrap().clone();
        let rule = InputRule::new("heading", heading_match, RuleAction::SetBlockType(heading));
        let tr = rule.apply(&state, 3, 3, " ").unwrap();
        let next = state.apply(tr).unwrap();

        assert_eq!(
            next.doc().to_json(),
            json!({"type": "doc", "content": [{"type": "heading", "attrs": {"level": 2}}]})
        );
        assert!(next.input_rule().is_some());
    }

    #[test]
    fn test_rule_ignores_text_in_the_middle() {
        let registry = registry();
        let doc = doc_from(
            &registry,
            json!({"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "a#"}]}]}),
        );
        let state = EditorState::new(registry.schema().clone(), doc, 100);
        let heading = registry.schema().node_type("heading").unwrap().clone();
        let rule = InputRule::new("heading", heading_match, RuleAction::SetBlockType(heading));
        assert!(rule.apply(&state, 3, 3, " ").is_none());
    }

    #[test]
    fn test_rule_over_selection_measures_from_its_start() {
        let registry = registry();
        let doc = doc_from(
            &registry,
            json!({"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "##abc"}]}]}),
        );
        let state = EditorState::new(registry.schema().clone(), doc, 100);
        let heading = registry.schema().node_type("heading").unwrap().clone();
        let rule = InputRule::new("heading", heading_match, RuleAction::SetBlockType(heading));

        let tr = rule.apply(&state, 3, 6, " ").unwrap();
        let next = state.apply(tr).unwrap();
        assert_eq!(
            next.doc().to_json(),
            json!({"type": "doc", "content": [{"type": "heading", "attrs": {"level": 2}}]})
        );
    }
}

//! # Toolbar projection
//!
//! Activation answers "does the current selection carry this mark / sit in
//! this node type" for every capability. It is recomputed after each
//! transaction and projected onto the capabilities shown in the toolbar.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::binder::{BoundCommand, BoundCommands};
use crate::capability::CapabilityKind;
use crate::errors::{EditorError, EditorResult};
use crate::registry::Registry;
use crate::state::EditorState;

/// Active flag per capability name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActivationSnapshot(BTreeMap<String, bool>);

impl ActivationSnapshot {
    /// Marks are active when a collapsed selection would type with them, or
    /// when any part of a non-empty selection has them. Nodes are active when
    /// selected or when they contain the selection start.
    pub fn compute(registry: &Registry, state: &EditorState) -> EditorResult<Self> {
        let schema = registry.schema();
        let doc = state.doc();
        let selection = state.selection();
        let rpos = state.resolved_from()?;
        let active_marks = state.active_marks()?;
        let selected = selection.selected_node(doc);

        let mut flags = BTreeMap::new();
        for capability in registry.iter() {
            let name = capability.name();
            let active = match capability.kind() {
                CapabilityKind::Mark => {
                    let mark_type = schema
                        .mark_type(name)
                        .ok_or_else(|| EditorError::UnknownCapability(name.to_string()))?;
                    if selection.is_empty() {
                        mark_type.is_in_set(&active_marks).is_some()
                    } else {
                        doc.range_has_mark(selection.from(), selection.to(), mark_type)
                    }
                }
                CapabilityKind::Node => {
                    let node_type = schema
                        .node_type(name)
                        .ok_or_else(|| EditorError::UnknownCapability(name.to_string()))?;
                    selected.as_ref().is_some_and(|node| node.ty() == node_type)
                        || (1..=rpos.depth()).any(|depth| rpos.node(depth).ty() == node_type)
                }
            };
            flags.insert(name.to_string(), active);
        }
        Ok(Self(flags))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, active)| (name.as_str(), *active))
    }
}

#[derive(Debug, Clone)]
pub struct ToolbarEntry {
    pub name: String,
    pub command: BoundCommand,
    pub active: bool,
}

/// Toolbar capabilities, marks then nodes in registration order
pub fn project(registry: &Registry, activation: &ActivationSnapshot, commands: &BoundCommands) -> Vec<ToolbarEntry> {
    registry
        .iter()
        .filter(|capability| capability.in_toolbar())
        .filter_map(|capability| {
            let command = commands.get(capability.name())?.clone();
            Some(ToolbarEntry {
                name: capability.name().to_string(),
                command,
                active: activation.is_active(capability.name()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::test_support::{doc_from, registry};
    use serde_json::json;

    fn state_with(registry: &Registry, selection: Selection) -> EditorState {
        // "ab" + bold "cd" + "ef" inside a blockquote
        let doc = doc_from(
            registry,
            json!({"type": "doc", "content": [
                {"type": "blockquote", "content": [
                    {"type": "paragraph", "content": [
                        {"type": "text", "text": "ab"},
                        {"type": "text", "text": "cd", "marks": [{"type": "bold"}]},
                        {"type": "text", "text": "ef"}
                    ]}
                ]},
                {"type": "heading", "content": [{"type": "text", "text": "T"}]}
            ]}),
        );
        let state = EditorState::new(registry.schema().clone(), doc, 0);
        let mut tr = state.tr();
        tr.set_selection(selection);
        state.apply(tr).unwrap()
    }

    #[test]
    fn test_cursor_inside_mark_run() {
        let registry = registry();
        let inside = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::cursor(5))).unwrap();
        assert!(inside.is_active("bold"));
        assert!(!inside.is_active("italic"));
        assert!(inside.is_active("blockquote"));
        assert!(inside.is_active("paragraph"));
        assert!(!inside.is_active("heading"));

        let outside = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::cursor(3))).unwrap();
        assert!(!outside.is_active("bold"));
    }

    #[test]
    fn test_partial_overlap_is_active() {
        let registry = registry();
        let snapshot = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::text(2, 5))).unwrap();
        assert!(snapshot.is_active("bold"));

        let plain = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::text(2, 4))).unwrap();
        assert!(!plain.is_active("bold"));
    }

    #[test]
    fn test_heading_and_doc_flags() {
        let registry = registry();
        let snapshot = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::cursor(12))).unwrap();
        assert!(snapshot.is_active("heading"));
        assert!(!snapshot.is_active("blockquote"));
        assert!(!snapshot.is_active("doc"));
    }

    #[test]
    fn test_projection_filters_toolbar_capabilities() {
        let registry = registry();
        let commands = BoundCommands::bind(&registry, None).unwrap();
        let snapshot = ActivationSnapshot::compute(&registry, &state_with(&registry, Selection::cursor(5))).unwrap();
        let entries = project(&registry, &snapshot, &commands);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["link", "bold", "italic", "paragraph", "blockquote", "heading"]);
        assert!(entries[1].active);
        assert_eq!(entries[1].command.name(), "bold");
    }
}

//! # Reconcile cycle
//!
//! One inbound transaction goes through apply, change detection, diff
//! derivation and activation recompute. The function is pure: the
//! [`crate::Editor`] stores the result and notifies hooks.

use folio_transform::{recreate_transform, DocumentDiff};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::DiffOptions;
use crate::errors::EditorResult;
use crate::registry::Registry;
use crate::state::{EditorState, Transaction};
use crate::toolbar::ActivationSnapshot;

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub state: EditorState,
    pub changed: bool,

    /// Serialized new document, only when it changed
    pub content: Option<Value>,

    /// Derived change-tracking diff, only when the document changed
    pub diff: Option<DocumentDiff>,
    pub activation: ActivationSnapshot,
}

#[instrument(skip_all, fields(steps = tr.steps().len()))]
pub fn reconcile(
    registry: &Registry,
    state: &EditorState,
    tr: Transaction,
    options: &DiffOptions,
) -> EditorResult<Reconciliation> {
    let next = state.apply(tr)?;

    let before = state.doc();
    let after = next.doc();
    let diff_start = before.content().find_diff_start(after.content(), 0);
    let changed = diff_start.is_some();
    debug!(changed, ?diff_start, "change detection");

    let (content, diff) = if changed {
        let derived = recreate_transform(before, after, (*options).into())?;
        let diff = DocumentDiff::from_transform(&derived);
        debug!(ops = diff.ops.len(), changes = diff.changes.len(), "diff derived");
        (Some(after.to_json()), Some(diff))
    } else {
        (None, None)
    };

    let activation = ActivationSnapshot::compute(registry, &next)?;

    Ok(Reconciliation {
        state: next,
        changed,
        content,
        diff,
        activation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::test_support::{doc_from, registry};
    use folio_transform::DiffOp;
    use serde_json::json;

    fn hi_state(registry: &Registry) -> EditorState {
        let doc = doc_from(
            registry,
            json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "hi"}]}
            ]}),
        );
        EditorState::new(registry.schema().clone(), doc, 100)
    }

    #[test]
    fn test_insert_reports_content_and_diff() {
        let registry = registry();
        let state = hi_state(&registry);
        let mut tr = state.tr();
        tr.insert_text_at("!", 3, 3).unwrap();

        let result = reconcile(&registry, &state, tr, &DiffOptions::default()).unwrap();
        assert!(result.changed);
        assert_eq!(
            result.content,
            Some(json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "hi!"}]}
            ]}))
        );
        let diff = result.diff.unwrap();
        assert_eq!(diff.ops.len(), 1);
        assert!(matches!(diff.ops[0], DiffOp::Insert { at: 3, .. }));
    }

    #[test]
    fn test_selection_only_is_unchanged() {
        let registry = registry();
        let state = hi_state(&registry);
        let mut tr = state.tr();
        tr.set_selection(Selection::text(1, 3));

        let result = reconcile(&registry, &state, tr, &DiffOptions::default()).unwrap();
        assert!(!result.changed);
        assert!(result.content.is_none());
        assert!(result.diff.is_none());
        assert_eq!(result.state.selection(), Selection::text(1, 3));
    }

    #[test]
    fn test_mark_change_prefers_mark_ops() {
        let registry = registry();
        let state = hi_state(&registry);
        let bold = registry.schema().mark("bold", None).unwrap();
        let mut tr = state.tr();
        tr.transform_mut().add_mark(1, 3, &bold).unwrap();

        let result = reconcile(&registry, &state, tr.clone(), &DiffOptions::default()).unwrap();
        let diff = result.diff.unwrap();
        assert!(matches!(diff.ops.as_slice(), [DiffOp::AddMark { from: 1, to: 3, .. }]));

        let replace_only = DiffOptions {
            allow_non_replace_steps: false,
            word_granularity: false,
        };
        let result = reconcile(&registry, &state, tr, &replace_only).unwrap();
        let diff = result.diff.unwrap();
        assert!(diff.ops.iter().all(|op| matches!(op, DiffOp::Replace { .. })));
    }
}

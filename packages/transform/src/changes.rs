//! # Change tracking output
//!
//! A [`DocumentDiff`] is what change-tracking consumers receive after an
//! edit: the derived steps, the same steps as serializable [`DiffOp`]s, and
//! the changed ranges as [`Change`] spans in both document versions.

use serde::Serialize;
use serde_json::Value;

use crate::map::{Assoc, Mapping};
use crate::step::{slice_to_json, Step};
use crate::transform::Transform;

/// One run of changed content: `from_a..to_a` in the old document became
/// `from_b..to_b` in the new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub from_a: usize,
    pub to_a: usize,
    pub from_b: usize,
    pub to_b: usize,
}

/// Atomic edit operation, positions relative to the document the
/// operation applies to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DiffOp {
    Insert { at: usize, content: Value },
    Delete { from: usize, to: usize },
    Replace { from: usize, to: usize, content: Value },
    AddMark { from: usize, to: usize, mark: Value },
    RemoveMark { from: usize, to: usize, mark: Value },
}

impl From<&Step> for DiffOp {
    fn from(step: &Step) -> Self {
        match step {
            Step::Replace { from, to, slice } if slice.is_empty() => DiffOp::Delete {
                from: *from,
                to: *to,
            },
            Step::Replace { from, to, slice } if from == to => DiffOp::Insert {
                at: *from,
                content: slice_to_json(slice),
            },
            Step::Replace { from, to, slice } => DiffOp::Replace {
                from: *from,
                to: *to,
                content: slice_to_json(slice),
            },
            Step::AddMark { from, to, mark } => DiffOp::AddMark {
                from: *from,
                to: *to,
                mark: mark.to_json(),
            },
            Step::RemoveMark { from, to, mark } => DiffOp::RemoveMark {
                from: *from,
                to: *to,
                mark: mark.to_json(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDiff {
    pub ops: Vec<DiffOp>,
    pub changes: Vec<Change>,

    #[serde(skip)]
    pub steps: Vec<Step>,
}

impl DocumentDiff {
    pub fn from_transform(tr: &Transform) -> Self {
        Self {
            ops: tr.steps().iter().map(DiffOp::from).collect(),
            changes: collect_changes(tr.steps()),
            steps: tr.steps().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Fold the ranges touched by each step into spans over the first and last
/// documents, merging spans that touch
fn collect_changes(steps: &[Step]) -> Vec<Change> {
    let mut changes: Vec<Change> = Vec::new();
    let mut mapping = Mapping::new();

    for step in steps {
        let map = step.get_map();
        for change in &mut changes {
            change.from_b = map.map(change.from_b, Assoc::Before);
            change.to_b = map.map(change.to_b, Assoc::After);
        }

        let touched: Vec<(usize, usize, usize)> = if map.is_empty() {
            vec![(step.from(), step.to(), step.to() - step.from())]
        } else {
            map.ranges()
                .map(|r| (r.start, r.start + r.old_size, r.new_size))
                .collect()
        };

        let back = mapping.invert();
        for (start, end, new_size) in touched {
            add_change(
                &mut changes,
                Change {
                    from_a: back.map(start, Assoc::Before),
                    to_a: back.map(end, Assoc::After),
                    from_b: start,
                    to_b: start + new_size,
                },
            );
        }
        mapping.push(map);
    }
    changes
}

fn add_change(changes: &mut Vec<Change>, change: Change) {
    changes.push(change);
    changes.sort_by_key(|c| (c.from_b, c.to_b));

    let mut merged: Vec<Change> = Vec::with_capacity(changes.len());
    for change in changes.drain(..) {
        match merged.last_mut() {
            Some(last) if change.from_b <= last.to_b => {
                last.from_a = last.from_a.min(change.from_a);
                last.to_a = last.to_a.max(change.to_a);
                last.to_b = last.to_b.max(change.to_b);
            }
            _ => merged.push(change),
        }
    }
    *changes = merged;
}

#[cfg(test)]
mod tests {
    use folio_model::{Fragment, Slice};
    use serde_json::json;

    use super::*;
    use crate::test_support::{doc, p, schema, text};

    #[test]
    fn test_insert_op_and_span() {
        let s = schema();
        let mut tr = Transform::new(doc(&s, vec![p(&s, vec![text(&s, "hi")])]));
        tr.insert(3, Fragment::from_node(text(&s, "!"))).unwrap();

        let diff = DocumentDiff::from_transform(&tr);
        assert_eq!(
            diff.ops,
            vec![DiffOp::Insert {
                at: 3,
                content: json!({"content": [{"type": "text", "text": "!"}]})
            }]
        );
        assert_eq!(
            diff.changes,
            vec![Change {
                from_a: 3,
                to_a: 3,
                from_b: 3,
                to_b: 4
            }]
        );
    }

    #[test]
    fn test_delete_and_mark_ops() {
        let s = schema();
        let bold = s.mark("bold", None).unwrap();
        let mut tr = Transform::new(doc(&s, vec![p(&s, vec![text(&s, "hello")])]));
        tr.delete(1, 2).unwrap();
        tr.add_mark(1, 3, &bold).unwrap();

        let diff = DocumentDiff::from_transform(&tr);
        assert!(matches!(diff.ops[0], DiffOp::Delete { from: 1, to: 2 }));
        assert!(matches!(diff.ops[1], DiffOp::AddMark { from: 1, to: 3, .. }));
        // The deletion and the formatting touch, so they form one span
        assert_eq!(
            diff.changes,
            vec![Change {
                from_a: 1,
                to_a: 4,
                from_b: 1,
                to_b: 3
            }]
        );
    }

    #[test]
    fn test_separate_edits_stay_separate() {
        let s = schema();
        let mut tr = Transform::new(doc(
            &s,
            vec![p(&s, vec![text(&s, "one")]), p(&s, vec![text(&s, "two")])],
        ));
        tr.replace(1, 2, Slice::closed(Fragment::from_node(text(&s, "O"))))
            .unwrap();
        tr.delete(8, 9).unwrap();

        let diff = DocumentDiff::from_transform(&tr);
        assert_eq!(diff.changes.len(), 2);
        assert_eq!(diff.changes[1].from_a, 8);
        assert_eq!(diff.changes[1].to_b, 8);
    }

    #[test]
    fn test_serialized_shape() {
        let diff = DocumentDiff {
            ops: vec![DiffOp::Delete { from: 1, to: 2 }],
            changes: vec![],
            steps: vec![],
        };
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"ops": [{"op": "delete", "from": 1, "to": 2}], "changes": []})
        );
    }
}

//! # Steps
//!
//! A [`Step`] is one atomic, invertible document change. Every step knows how
//! to apply itself, how it moves positions ([`StepMap`]) and how to produce
//! the step that undoes it.

use folio_model::{Fragment, Mark, Node, Slice};
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use crate::map::{MapRange, StepMap};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `from..to` with a slice
    Replace { from: usize, to: usize, slice: Slice },

    /// Add a mark to the inline content in `from..to`
    AddMark { from: usize, to: usize, mark: Mark },

    /// Remove a mark from the inline content in `from..to`
    RemoveMark { from: usize, to: usize, mark: Mark },
}

impl Step {
    pub fn replace(from: usize, to: usize, slice: Slice) -> Self {
        Step::Replace { from, to, slice }
    }

    pub fn from(&self) -> usize {
        match self {
            Step::Replace { from, .. } | Step::AddMark { from, .. } | Step::RemoveMark { from, .. } => {
                *from
            }
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Step::Replace { to, .. } | Step::AddMark { to, .. } | Step::RemoveMark { to, .. } => *to,
        }
    }

    pub fn apply(&self, doc: &Node) -> StepResult<Node> {
        let size = doc.content().size();
        if self.from() > self.to() || self.to() > size {
            return Err(StepError::OutOfRange {
                from: self.from(),
                to: self.to(),
                size,
            });
        }

        match self {
            Step::Replace { from, to, slice } => Ok(doc.replace(*from, *to, slice)?),
            Step::AddMark { from, to, mark } => {
                map_inline(doc, *from, *to, |node, parent| {
                    if !parent.ty().allows_mark_type(mark.mark_type()) {
                        return node.clone();
                    }
                    node.mark(mark.add_to_set(node.marks()))
                })
            }
            Step::RemoveMark { from, to, mark } => {
                map_inline(doc, *from, *to, |node, _| node.mark(mark.remove_from_set(node.marks())))
            }
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, slice } => StepMap::new(vec![MapRange {
                start: *from,
                old_size: to - from,
                new_size: slice.size(),
            }]),
            Step::AddMark { .. } | Step::RemoveMark { .. } => StepMap::empty(),
        }
    }

    /// The step that undoes this one, given the document it was applied to
    pub fn invert(&self, doc: &Node) -> StepResult<Step> {
        Ok(match self {
            Step::Replace { from, to, slice } => Step::Replace {
                from: *from,
                to: from + slice.size(),
                slice: doc.slice(*from, *to)?,
            },
            Step::AddMark { from, to, mark } => Step::RemoveMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
            Step::RemoveMark { from, to, mark } => Step::AddMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Step::Replace { from, to, slice } => {
                let mut obj = json!({"stepType": "replace", "from": from, "to": to});
                if !slice.is_empty() {
                    obj["slice"] = slice_to_json(slice);
                }
                obj
            }
            Step::AddMark { from, to, mark } => {
                json!({"stepType": "addMark", "from": from, "to": to, "mark": mark.to_json()})
            }
            Step::RemoveMark { from, to, mark } => {
                json!({"stepType": "removeMark", "from": from, "to": to, "mark": mark.to_json()})
            }
        }
    }
}

pub(crate) fn slice_to_json(slice: &Slice) -> Value {
    let mut obj = json!({
        "content": slice.content.iter().map(Node::to_json).collect::<Vec<_>>(),
    });
    if slice.open_start > 0 {
        obj["openStart"] = json!(slice.open_start);
    }
    if slice.open_end > 0 {
        obj["openEnd"] = json!(slice.open_end);
    }
    obj
}

/// Rebuild `from..to` with every inline node passed through `f`, then
/// splice the result back in with a replace
fn map_inline<F>(doc: &Node, from: usize, to: usize, f: F) -> StepResult<Node>
where
    F: Fn(&Node, &Node) -> Node,
{
    let old = doc.slice(from, to)?;
    let rfrom = doc.resolve(from)?;
    let parent = rfrom.node(rfrom.shared_depth(to)).clone();
    let content = map_fragment(&old.content, &f, &parent);
    let slice = Slice::new(content, old.open_start, old.open_end);
    Ok(doc.replace(from, to, &slice)?)
}

fn map_fragment<F>(fragment: &Fragment, f: &F, parent: &Node) -> Fragment
where
    F: Fn(&Node, &Node) -> Node,
{
    let mapped = fragment
        .iter()
        .map(|child| {
            let mut child = child.clone();
            if child.content().size() > 0 {
                let inner = map_fragment(child.content(), f, &child);
                child = child.copy(inner);
            }
            if child.is_inline() {
                child = f(&child, parent);
            }
            child
        })
        .collect();
    Fragment::from_vec(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc, p, schema, text};

    #[test]
    fn test_add_mark_splits_text() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "hello")])]);
        let bold = s.mark("bold", None).unwrap();

        let step = Step::AddMark {
            from: 2,
            to: 4,
            mark: bold.clone(),
        };
        let result = step.apply(&d).unwrap();

        let para = result.child(0);
        assert_eq!(para.child_count(), 3);
        assert_eq!(para.child(1).text(), Some("el"));
        assert_eq!(para.child(1).marks(), &[bold][..]);
    }

    #[test]
    fn test_replace_inverts_to_original() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "hi")])]);
        let step = Step::replace(3, 3, Slice::closed(Fragment::from_node(text(&s, "!"))));

        let after = step.apply(&d).unwrap();
        let inverse = step.invert(&d).unwrap();
        assert_eq!(inverse.apply(&after).unwrap(), d);
    }

    #[test]
    fn test_mark_inverse_round_trips() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "hello")])]);
        let italic = s.mark("italic", None).unwrap();
        let step = Step::AddMark {
            from: 1,
            to: 6,
            mark: italic,
        };

        let after = step.apply(&d).unwrap();
        assert_ne!(after, d);
        assert_eq!(step.invert(&d).unwrap().apply(&after).unwrap(), d);
        assert!(step.get_map().is_empty());
    }

    #[test]
    fn test_out_of_range_step_fails() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "hi")])]);
        let step = Step::replace(2, 40, Slice::empty());
        assert!(matches!(step.apply(&d), Err(StepError::OutOfRange { .. })));
    }

    #[test]
    fn test_step_json_shape() {
        let s = schema();
        let step = Step::replace(3, 3, Slice::closed(Fragment::from_node(text(&s, "!"))));
        assert_eq!(
            step.to_json(),
            json!({
                "stepType": "replace", "from": 3, "to": 3,
                "slice": {"content": [{"type": "text", "text": "!"}]}
            })
        );
    }
}

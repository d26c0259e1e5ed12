//! # Selection
//!
//! A text selection spans from `anchor` to `head` (collapsed when they are
//! equal); a node selection covers exactly one node.

use folio_model::{ModelError, ModelResult, Node, ResolvedPos};
use folio_transform::{Assoc, StepMap};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { from: usize, to: usize },
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Self::Text { anchor, head }
    }

    /// Select the node directly after `pos`
    pub fn node(doc: &Node, pos: usize) -> ModelResult<Self> {
        let node = doc
            .resolve(pos)?
            .node_after()
            .ok_or(ModelError::PositionOutOfRange {
                pos,
                size: doc.content().size(),
            })?;
        Ok(Self::Node {
            from: pos,
            to: pos + node.node_size(),
        })
    }

    /// Cursor in the first textblock
    pub fn at_start(doc: &Node) -> Self {
        Self::cursor(nearest_cursor(doc, 0))
    }

    /// Cursor in the last textblock
    pub fn at_end(doc: &Node) -> Self {
        Self::cursor(nearest_cursor(doc, doc.content().size()))
    }

    /// Everything from the first to the last textblock
    pub fn all(doc: &Node) -> Self {
        Self::text(nearest_cursor(doc, 0), nearest_cursor(doc, doc.content().size()))
    }

    pub fn anchor(&self) -> usize {
        match *self {
            Self::Text { anchor, .. } => anchor,
            Self::Node { from, .. } => from,
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Self::Text { head, .. } => head,
            Self::Node { to, .. } => to,
        }
    }

    pub fn from(&self) -> usize {
        match *self {
            Self::Text { anchor, head } => anchor.min(head),
            Self::Node { from, .. } => from,
        }
    }

    pub fn to(&self) -> usize {
        match *self {
            Self::Text { anchor, head } => anchor.max(head),
            Self::Node { to, .. } => to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from() == self.to()
    }

    /// Position of a collapsed text selection
    pub fn cursor_pos(&self) -> Option<usize> {
        match *self {
            Self::Text { anchor, head } if anchor == head => Some(head),
            _ => None,
        }
    }

    pub fn resolve_from(&self, doc: &Node) -> ModelResult<ResolvedPos> {
        doc.resolve(self.from())
    }

    /// The node covered by a node selection
    pub fn selected_node(&self, doc: &Node) -> Option<Node> {
        match *self {
            Self::Node { from, .. } => doc.node_at(from),
            Self::Text { .. } => None,
        }
    }

    /// Carry the selection through the maps of some steps into `doc`, the
    /// document those steps produced
    pub fn map(&self, maps: &[StepMap], doc: &Node) -> Selection {
        let map = |pos: usize, assoc: Assoc| maps.iter().fold(pos, |pos, m| m.map(pos, assoc));
        match *self {
            Self::Text { anchor, head } => Self::Text {
                anchor: nearest_cursor(doc, map(anchor, Assoc::After)),
                head: nearest_cursor(doc, map(head, Assoc::After)),
            },
            Self::Node { from, to } => {
                let new_from = map(from, Assoc::After);
                let new_to = map(to, Assoc::Before);
                match doc.node_at(new_from) {
                    Some(node) if new_to == new_from + node.node_size() => Self::Node {
                        from: new_from,
                        to: new_to,
                    },
                    _ => Self::cursor(nearest_cursor(doc, new_from)),
                }
            }
        }
    }
}

/// The valid cursor position closest to `pos`: `pos` itself when it lies in
/// a textblock, else the start of the next textblock, else the end of the
/// last one
pub fn nearest_cursor(doc: &Node, pos: usize) -> usize {
    let size = doc.content().size();
    let pos = pos.min(size);
    let mut containing = None;
    let mut next = None;
    let mut last = None;

    doc.nodes_between(0, size, |node, start, _, _| {
        if !node.is_textblock() {
            return containing.is_none() && next.is_none();
        }
        let content_start = start + 1;
        let content_end = content_start + node.content().size();
        if content_start <= pos && pos <= content_end {
            containing = Some(pos);
        } else if content_start > pos && next.is_none() {
            next = Some(content_start);
        }
        last = Some(content_end);
        false
    });

    containing.or(next).or(last).unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc_from, registry};
    use folio_transform::MapRange;
    use serde_json::json;

    fn sample() -> Node {
        let registry = registry();
        doc_from(
            &registry,
            json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "ab"}]},
                {"type": "blockquote", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "cd"}]}
                ]}
            ]}),
        )
    }

    #[test]
    fn test_nearest_cursor() {
        let doc = sample();
        assert_eq!(nearest_cursor(&doc, 0), 1);
        assert_eq!(nearest_cursor(&doc, 2), 2);
        assert_eq!(nearest_cursor(&doc, 4), 6);
        assert_eq!(nearest_cursor(&doc, 100), 8);
    }

    #[test]
    fn test_select_all_spans_textblocks() {
        let doc = sample();
        let all = Selection::all(&doc);
        assert_eq!((all.from(), all.to()), (1, 8));
        assert!(!all.is_empty());
    }

    #[test]
    fn test_node_selection() {
        let doc = sample();
        let sel = Selection::node(&doc, 4).unwrap();
        assert_eq!(sel, Selection::Node { from: 4, to: 10 });
        assert_eq!(sel.selected_node(&doc).unwrap().type_name(), "blockquote");
        assert_eq!(sel.cursor_pos(), None);
    }

    #[test]
    fn test_map_cursor_through_insertion() {
        let doc = sample();
        let map = StepMap::new(vec![MapRange {
            start: 1,
            old_size: 0,
            new_size: 1,
        }]);
        let mapped = Selection::cursor(1).map(&[map], &doc);
        assert_eq!(mapped, Selection::cursor(2));
    }
}

use crate::error::{ModelError, ModelResult};
use crate::mark::Mark;
use crate::node::Node;

#[derive(Debug, Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position of the start of the child at `index`
    offset: usize,
}

/// A position resolved against a document, with its ancestor chain.
///
/// Depth 0 is the document itself; `node(depth())` is the innermost
/// non-text node containing the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub fn resolve(doc: &Node, pos: usize) -> ModelResult<Self> {
        if pos > doc.content().size() {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: doc.content().size(),
            });
        }

        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset, false)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }

        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The innermost node containing the position
    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Ancestor at `depth` (0 is the document)
    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    /// Index into the ancestor at `depth` where the position points
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index pointing after the position in the ancestor at `depth`
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Position at the start of the ancestor's content
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    /// Position at the end of the ancestor's content
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position directly before the ancestor at `depth`; `None` for the document
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 || depth > self.depth() {
            return None;
        }
        Some(self.path[depth - 1].offset)
    }

    /// Position directly after the ancestor at `depth`; `None` for the document
    pub fn after(&self, depth: usize) -> Option<usize> {
        self.before(depth).map(|before| before + self.node(depth).node_size())
    }

    /// Offset into the text node the position points into, 0 between nodes
    pub fn text_offset(&self) -> usize {
        let last = self.path.last().map(|e| e.offset).unwrap_or(0);
        self.pos - last
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if index == parent.child_count() {
            return None;
        }
        let offset = self.text_offset();
        let child = parent.child(index);
        Some(if offset > 0 {
            child.cut(offset, child.node_size())
        } else {
            child.clone()
        })
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(parent.child(index).cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Marks that text inserted at this position would receive.
    ///
    /// Inside a text node that is the node's marks. At a boundary the marks
    /// of the node before win (the node after when at the start), minus
    /// non-inclusive marks that do not continue on the other side.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());

        if parent.content().size() == 0 {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }

        let before = index.checked_sub(1).and_then(|i| parent.maybe_child(i));
        let after = parent.maybe_child(index);
        let (main, other) = match before {
            Some(before) => (Some(before), after),
            None => (after, None),
        };
        let Some(main) = main else {
            return Vec::new();
        };

        main.marks()
            .iter()
            .filter(|mark| {
                mark.mark_type().inclusive()
                    || other.map(|o| mark.is_in_set(o.marks())).unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Marks at the end of a range starting here and ending at `end`, used
    /// when replacing a range with typed text
    pub fn marks_across(&self, end: &ResolvedPos) -> Option<Vec<Mark>> {
        let after = self.parent().maybe_child(self.index(self.depth()));
        let after = after.filter(|node| node.is_inline())?;
        let next = end.parent().maybe_child(end.index(end.depth()));
        Some(
            after
                .marks()
                .iter()
                .filter(|mark| {
                    mark.mark_type().inclusive()
                        || next.map(|n| mark.is_in_set(n.marks())).unwrap_or(false)
                })
                .cloned()
                .collect(),
        )
    }

    /// Deepest depth whose node contains both this position and `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&depth| self.start(depth) <= pos && self.end(depth) >= pos)
            .unwrap_or(0)
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }

    /// Depth of the innermost textblock ancestor, if any
    pub fn textblock_depth(&self) -> Option<usize> {
        (0..=self.depth()).rev().find(|&d| self.node(d).is_textblock())
    }
}

//! # Fragments
//!
//! A [`Fragment`] is the ordered child list of a node. It is persistent: the
//! children live behind an `Arc`, so cloning is cheap and every "modifying"
//! method returns a new fragment that shares untouched children.
//!
//! Adjacent text nodes with identical marks are always joined, and empty text
//! nodes are never stored, so two fragments describing the same content compare
//! equal regardless of how they were built.

use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::node::Node;

#[derive(Clone, Default)]
pub struct Fragment {
    children: Arc<Vec<Node>>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_vec(vec![node])
    }

    /// Build a fragment, joining adjacent text nodes with the same marks
    pub fn from_vec(nodes: Vec<Node>) -> Self {
        let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            push_joined(&mut joined, node);
        }
        let size = joined.iter().map(Node::node_size).sum();
        Self {
            children: Arc::new(joined),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn ptr_eq(&self, other: &Fragment) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.children.as_ref().clone()
    }

    /// The part of this fragment between two content positions
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in self.children.iter() {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.node_size()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to.saturating_sub(pos + 1)).min(child.content().size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    result.push(piece);
                }
                pos = end;
            }
        }
        Fragment::from_vec(result)
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.to_vec();
        nodes.extend(other.iter().cloned());
        Fragment::from_vec(nodes)
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.to_vec();
        nodes[index] = node;
        Fragment::from_vec(nodes)
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        let mut nodes = Vec::with_capacity(self.child_count() + 1);
        nodes.push(node);
        nodes.extend(self.iter().cloned());
        Fragment::from_vec(nodes)
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        let mut nodes = self.to_vec();
        nodes.push(node);
        Fragment::from_vec(nodes)
    }

    /// Child index and its start offset for a content position. With
    /// `round_up`, a position inside a child maps to the index after it.
    pub fn find_index(&self, pos: usize, round_up: bool) -> ModelResult<(usize, usize)> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.children.len(), pos));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.children.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round_up {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    /// Call `f` for every descendant overlapping `from..to`, with its absolute
    /// position, its parent and its index. Returning `false` skips the node's
    /// children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between_inner(from, to, f, 0, None)
    }

    pub(crate) fn nodes_between_inner<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: Option<&Node>,
    ) where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.children.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content().size() > 0 {
                let start = pos + 1;
                child.content().nodes_between_inner(
                    from.saturating_sub(start),
                    child.content().size().min(to.saturating_sub(start)),
                    f,
                    node_start + start,
                    Some(child),
                );
            }
            pos = end;
        }
    }

    /// Text between two positions, with `block_separator` between blocks
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, &mut |node, pos, _, _| {
            let node_text: String = match node.text() {
                Some(node_text) => {
                    let start = from.saturating_sub(pos);
                    let end = (to - pos).min(node.node_size());
                    node_text.chars().skip(start).take(end.saturating_sub(start)).collect()
                }
                None if node.is_leaf() => node.ty().spec().leaf_text.clone().unwrap_or_default(),
                None => String::new(),
            };
            if node.is_block()
                && ((node.is_leaf() && !node_text.is_empty()) || node.is_textblock())
                && !block_separator.is_empty()
            {
                if first {
                    first = false;
                } else {
                    text.push_str(block_separator);
                }
            }
            text.push_str(&node_text);
            true
        });
        text
    }

    /// First position at which this fragment and `other` differ, `None` when
    /// they are equal. `pos` is the absolute position of the fragment start.
    pub fn find_diff_start(&self, other: &Fragment, pos: usize) -> Option<usize> {
        let mut pos = pos;
        let mut i = 0;
        loop {
            if i == self.child_count() || i == other.child_count() {
                return if self.child_count() == other.child_count() {
                    None
                } else {
                    Some(pos)
                };
            }
            let a = self.child(i);
            let b = other.child(i);
            i += 1;

            if a.ptr_eq(b) {
                pos += a.node_size();
                continue;
            }
            if !a.same_markup(b) {
                return Some(pos);
            }
            if let (Some(ta), Some(tb)) = (a.text(), b.text()) {
                if ta != tb {
                    let common = ta.chars().zip(tb.chars()).take_while(|(x, y)| x == y).count();
                    return Some(pos + common);
                }
            }
            if a.content().size() > 0 || b.content().size() > 0 {
                if let Some(inner) = a.content().find_diff_start(b.content(), pos + 1) {
                    return Some(inner);
                }
            }
            pos += a.node_size();
        }
    }

    /// Last positions (in this fragment and in `other`) at which the two
    /// differ, scanning from the end. `pos_a`/`pos_b` are the absolute end
    /// positions of the fragments.
    pub fn find_diff_end(
        &self,
        other: &Fragment,
        pos_a: usize,
        pos_b: usize,
    ) -> Option<(usize, usize)> {
        let (mut pos_a, mut pos_b) = (pos_a, pos_b);
        let (mut i_a, mut i_b) = (self.child_count(), other.child_count());
        loop {
            if i_a == 0 || i_b == 0 {
                return if i_a == i_b { None } else { Some((pos_a, pos_b)) };
            }
            i_a -= 1;
            i_b -= 1;
            let a = self.child(i_a);
            let b = other.child(i_b);
            let size = a.node_size();

            if a.ptr_eq(b) {
                pos_a -= size;
                pos_b -= size;
                continue;
            }
            if !a.same_markup(b) {
                return Some((pos_a, pos_b));
            }
            if let (Some(ta), Some(tb)) = (a.text(), b.text()) {
                if ta != tb {
                    let same = ta
                        .chars()
                        .rev()
                        .zip(tb.chars().rev())
                        .take_while(|(x, y)| x == y)
                        .count();
                    return Some((pos_a - same, pos_b - same));
                }
            }
            if a.content().size() > 0 || b.content().size() > 0 {
                if let Some(inner) = a.content().find_diff_end(b.content(), pos_a - 1, pos_b - 1) {
                    return Some(inner);
                }
            }
            pos_a -= size;
            pos_b -= size;
        }
    }
}

fn push_joined(target: &mut Vec<Node>, node: Node) {
    if let Some(text) = node.text() {
        if text.is_empty() {
            return;
        }
        if let Some(last) = target.last_mut() {
            if let Some(last_text) = last.text() {
                if last.same_markup(&node) {
                    let mut merged = String::with_capacity(last_text.len() + text.len());
                    merged.push_str(last_text);
                    merged.push_str(text);
                    *last = last.with_text(merged);
                    return;
                }
            }
        }
    }
    target.push(node);
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
            || (self.size == other.size && self.children == other.children)
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.children.iter()).finish()
    }
}

//! # Document Nodes
//!
//! [`Node`] is an immutable, reference-counted tree value. Edits never mutate
//! a node; they build a new tree that shares every untouched subtree with the
//! old one, so holding on to a previous document is free.
//!
//! ## Positions
//!
//! ```text
//!  0   1 2 3 4    5
//!  <p> h i ! </p>
//! ```
//!
//! Entering or leaving a non-leaf node counts one position, every character
//! counts one, and a leaf node (such as a hard break) counts one.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::resolved_pos::ResolvedPos;
use crate::schema::{Attrs, MarkType, NodeType};
use crate::slice::{self, Slice};

struct NodeData {
    ty: NodeType,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    text: Option<String>,
    /// Cached character count for text nodes
    text_len: usize,
}

#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn new(ty: NodeType, attrs: Attrs, content: Fragment, marks: Vec<Mark>) -> Self {
        Node(Arc::new(NodeData {
            ty,
            attrs,
            content,
            marks,
            text: None,
            text_len: 0,
        }))
    }

    pub(crate) fn new_text(ty: NodeType, text: String, marks: Vec<Mark>) -> Self {
        let text_len = text.chars().count();
        Node(Arc::new(NodeData {
            ty,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            marks,
            text: Some(text),
            text_len,
        }))
    }

    pub fn ty(&self) -> &NodeType {
        &self.0.ty
    }

    pub fn type_name(&self) -> &str {
        self.0.ty.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_inline(&self) -> bool {
        self.0.ty.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.ty.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.ty.is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.0.ty.inline_content()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.ty.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.0.ty.is_atom()
    }

    /// Number of positions this node occupies in its parent
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.0.text_len
        } else if self.is_leaf() {
            1
        } else {
            self.0.content.size() + 2
        }
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same type, attributes and marks
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.ty(), other.attrs(), other.marks())
    }

    pub fn has_markup(&self, ty: &NodeType, attrs: &Attrs, marks: &[Mark]) -> bool {
        self.0.ty == *ty && self.0.attrs == *attrs && Mark::same_set(&self.0.marks, marks)
    }

    /// Copy of this node with different content
    pub fn copy(&self, content: Fragment) -> Node {
        if self.is_text() {
            return self.clone();
        }
        if content.ptr_eq(&self.0.content) {
            return self.clone();
        }
        Node(Arc::new(NodeData {
            ty: self.0.ty.clone(),
            attrs: self.0.attrs.clone(),
            content,
            marks: self.0.marks.clone(),
            text: None,
            text_len: 0,
        }))
    }

    /// Copy of this node with a different mark set
    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        if Mark::same_set(&marks, &self.0.marks) {
            return self.clone();
        }
        Node(Arc::new(NodeData {
            ty: self.0.ty.clone(),
            attrs: self.0.attrs.clone(),
            content: self.0.content.clone(),
            marks,
            text: self.0.text.clone(),
            text_len: self.0.text_len,
        }))
    }

    /// Copy of a text node with new text
    pub fn with_text(&self, text: String) -> Node {
        if self.0.text.as_deref() == Some(text.as_str()) {
            return self.clone();
        }
        Node::new_text(self.0.ty.clone(), text, self.0.marks.clone())
    }

    /// Part of this node between two content positions (character offsets for
    /// text nodes)
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match &self.0.text {
            Some(text) => {
                if from == 0 && to == self.0.text_len {
                    return self.clone();
                }
                let cut: String = text.chars().skip(from).take(to.saturating_sub(from)).collect();
                self.with_text(cut)
            }
            None => {
                if from == 0 && to == self.0.content.size() {
                    return self.clone();
                }
                self.copy(self.0.content.cut(from, to))
            }
        }
    }

    /// The slice of this node's content between two positions
    pub fn slice(&self, from: usize, to: usize) -> ModelResult<Slice> {
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom.node(depth).content().cut(rfrom.pos() - start, rto.pos() - start);
        Ok(Slice::new(content, rfrom.depth() - depth, rto.depth() - depth))
    }

    /// Replace the range `from..to` with a slice, producing a new node
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> ModelResult<Node> {
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        slice::replace(&rfrom, &rto, slice)
    }

    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// The node directly after `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self.clone();
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos, false).ok()?;
            let child = node.maybe_child(index)?.clone();
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.0.content.nodes_between_inner(from, to, &mut f, 0, Some(self))
    }

    /// Whether any inline content in `from..to` carries a mark of this type
    pub fn range_has_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> bool {
        let mut found = false;
        if to > from {
            self.nodes_between(from, to, |node, _, _, _| {
                if mark_type.is_in_set(node.marks()).is_some() {
                    found = true;
                }
                !found
            });
        }
        found
    }

    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        self.0.content.text_between(from, to, block_separator)
    }

    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => self.text_between(0, self.0.content.size(), ""),
        }
    }

    /// Validate content, marks and attributes of this node and its descendants
    pub fn check(&self) -> ModelResult<()> {
        if let Some(text) = &self.0.text {
            if text.is_empty() {
                return Err(ModelError::InvalidContent("text (empty text nodes are not allowed)".into()));
            }
        }
        self.0.ty.check_content(&self.0.content)?;
        for child in self.0.content.iter() {
            if let Some(mark) = child.marks().iter().find(|m| !self.0.ty.allows_mark_type(m.mark_type())) {
                return Err(ModelError::MarkNotAllowed {
                    mark: mark.type_name().to_string(),
                    node: self.type_name().to_string(),
                });
            }
            child.check()?;
        }
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.same_markup(other)
                && self.0.text == other.0.text
                && self.0.content == other.0.content)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = if self.0.marks.is_empty() {
            String::new()
        } else {
            format!("{:?}", self.0.marks)
        };
        match &self.0.text {
            Some(text) => write!(f, "{}{:?}", marks, text),
            None if self.0.content.is_empty() => write!(f, "{}{}", marks, self.type_name()),
            None => write!(f, "{}{}({:?})", marks, self.type_name(), self.0.content),
        }
    }
}

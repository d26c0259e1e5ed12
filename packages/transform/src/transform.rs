//! # Transform
//!
//! Accumulates steps against a starting document. Each builder method adds
//! one or more steps and fails without touching the transform when a step
//! cannot be applied.

use folio_model::{Attrs, Fragment, Mark, MarkType, Node, NodeType, Slice};

use crate::error::{StepError, StepResult};
use crate::map::Mapping;
use crate::step::Step;

#[derive(Debug, Clone)]
pub struct Transform {
    /// Document before each step
    docs: Vec<Node>,
    steps: Vec<Step>,
    doc: Node,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Self {
            docs: Vec::new(),
            steps: Vec::new(),
            doc,
            mapping: Mapping::new(),
        }
    }

    /// Current document
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// Starting document
    pub fn before(&self) -> &Node {
        self.docs.first().unwrap_or(&self.doc)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step(&mut self, step: Step) -> StepResult<&mut Self> {
        let doc = step.apply(&self.doc)?;
        self.add_step(step, doc);
        Ok(self)
    }

    /// Apply a step, returning `false` instead of an error when it fails
    pub fn maybe_step(&mut self, step: Step) -> bool {
        match step.apply(&self.doc) {
            Ok(doc) => {
                self.add_step(step, doc);
                true
            }
            Err(_) => false,
        }
    }

    fn add_step(&mut self, step: Step, doc: Node) {
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.mapping.push(step.get_map());
        self.steps.push(step);
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> StepResult<&mut Self> {
        if from == to && slice.is_empty() {
            return Ok(self);
        }
        self.step(Step::replace(from, to, slice))
    }

    pub fn replace_with(&mut self, from: usize, to: usize, content: Fragment) -> StepResult<&mut Self> {
        self.replace(from, to, Slice::closed(content))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> StepResult<&mut Self> {
        self.replace(from, to, Slice::empty())
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> StepResult<&mut Self> {
        self.replace_with(pos, pos, content)
    }

    /// Add `mark` to all inline content in `from..to` whose parent allows it,
    /// dropping marks of the same type with different attributes
    pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> StepResult<&mut Self> {
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        let mut added: Vec<(usize, usize)> = Vec::new();

        self.doc.nodes_between(from, to, |node, pos, parent, _| {
            if !node.is_inline() {
                return true;
            }
            let allowed = parent
                .map(|p| p.ty().allows_mark_type(mark.mark_type()))
                .unwrap_or(false);
            if !allowed || mark.is_in_set(node.marks()) {
                return false;
            }
            let start = pos.max(from);
            let end = (pos + node.node_size()).min(to);
            if let Some(existing) = mark.mark_type().is_in_set(node.marks()) {
                push_range(&mut removed, start, end, existing.clone());
            }
            match added.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => added.push((start, end)),
            }
            false
        });

        let mut steps: Vec<Step> = removed
            .into_iter()
            .map(|(from, to, mark)| Step::RemoveMark { from, to, mark })
            .collect();
        steps.extend(added.into_iter().map(|(from, to)| Step::AddMark {
            from,
            to,
            mark: mark.clone(),
        }));
        self.apply_all(steps)
    }

    /// Remove every mark of `mark_type` from inline content in `from..to`
    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: &MarkType) -> StepResult<&mut Self> {
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        self.doc.nodes_between(from, to, |node, pos, _, _| {
            if !node.is_inline() {
                return true;
            }
            if let Some(existing) = mark_type.is_in_set(node.marks()) {
                let start = pos.max(from);
                let end = (pos + node.node_size()).min(to);
                push_range(&mut removed, start, end, existing.clone());
            }
            false
        });

        let steps = removed
            .into_iter()
            .map(|(from, to, mark)| Step::RemoveMark { from, to, mark })
            .collect();
        self.apply_all(steps)
    }

    /// Change every textblock touching `from..to` into `ty` with `attrs`.
    /// Blocks whose content the new type cannot hold are left alone.
    pub fn set_block_type(
        &mut self,
        from: usize,
        to: usize,
        ty: &NodeType,
        attrs: Option<&Attrs>,
    ) -> StepResult<&mut Self> {
        if !ty.is_textblock() {
            return Err(StepError::structure(
                "set block type",
                from,
                format!("{} is not a textblock type", ty.name()),
            ));
        }
        let attrs = ty.compute_attrs(attrs)?;

        let mut targets: Vec<(usize, Node)> = Vec::new();
        self.doc.nodes_between(from, to, |node, pos, _, _| {
            if !node.is_textblock() {
                return true;
            }
            if !node.has_markup(ty, &attrs, node.marks()) && ty.valid_content(node.content()) {
                targets.push((pos, node.clone()));
            }
            false
        });

        let mut steps = Vec::with_capacity(targets.len());
        for (pos, node) in targets {
            let replacement = ty.create(Some(&attrs), node.content().clone(), node.marks().to_vec())?;
            steps.push(Step::replace(
                pos,
                pos + node.node_size(),
                Slice::closed(Fragment::from_node(replacement)),
            ));
        }
        self.apply_all(steps)
    }

    /// Wrap the sibling blocks covering `from..to` in a new `wrapper` node
    pub fn wrap(&mut self, from: usize, to: usize, wrapper: &NodeType, attrs: Option<&Attrs>) -> StepResult<&mut Self> {
        let (start, end, blocks) = block_range(&self.doc, from, to)?;
        let node = wrapper.create_checked(attrs, blocks, Vec::new()).map_err(|err| {
            StepError::structure("wrap", from, format!("{} cannot hold the range: {}", wrapper.name(), err))
        })?;
        self.step(Step::replace(start, end, Slice::closed(Fragment::from_node(node))))
    }

    /// Replace the node wrapping the textblock at `pos` with its content
    pub fn lift(&mut self, pos: usize) -> StepResult<&mut Self> {
        let rfrom = self.doc.resolve(pos)?;
        let depth = rfrom
            .textblock_depth()
            .and_then(|d| d.checked_sub(1))
            .filter(|d| *d > 0)
            .ok_or_else(|| StepError::structure("lift", pos, "no wrapper around the block"))?;
        let wrapper = rfrom.node(depth).clone();
        let before = rfrom
            .before(depth)
            .ok_or_else(|| StepError::structure("lift", pos, "no wrapper around the block"))?;
        self.step(Step::replace(
            before,
            before + wrapper.node_size(),
            Slice::closed(wrapper.content().clone()),
        ))
    }

    /// Split the node at `pos`, `depth` levels deep. The new node after the
    /// split gets `type_after` when given, otherwise the type of the node
    /// being split.
    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        type_after: Option<(&NodeType, Option<&Attrs>)>,
    ) -> StepResult<&mut Self> {
        let rpos = self.doc.resolve(pos)?;
        if depth == 0 || depth > rpos.depth() {
            return Err(StepError::structure("split", pos, "invalid split depth"));
        }

        let mut before = Fragment::empty();
        let mut after = Fragment::empty();
        let base = rpos.depth();
        for (level, d) in (base + 1 - depth..=base).rev().enumerate() {
            let node = rpos.node(d);
            before = Fragment::from_node(node.copy(before));
            let after_node = match type_after {
                Some((ty, attrs)) if level == 0 => ty.create(attrs, after, Vec::new())?,
                _ => node.copy(after),
            };
            after = Fragment::from_node(after_node);
        }

        let content = before.append(&after);
        self.step(Step::replace(pos, pos, Slice::new(content, depth, depth)))
    }

    /// Join the blocks on either side of `pos`
    pub fn join(&mut self, pos: usize, depth: usize) -> StepResult<&mut Self> {
        let from = pos
            .checked_sub(depth)
            .ok_or_else(|| StepError::structure("join", pos, "join depth exceeds position"))?;
        self.step(Step::replace(from, pos + depth, Slice::empty()))
    }

    fn apply_all(&mut self, steps: Vec<Step>) -> StepResult<&mut Self> {
        let mut doc = self.doc.clone();
        let mut applied = Vec::with_capacity(steps.len());
        for step in steps {
            let next = step.apply(&doc)?;
            applied.push((step, next.clone()));
            doc = next;
        }
        for (step, next) in applied {
            self.add_step(step, next);
        }
        Ok(self)
    }
}

fn push_range(ranges: &mut Vec<(usize, usize, Mark)>, start: usize, end: usize, mark: Mark) {
    match ranges.last_mut() {
        Some(last) if last.1 == start && last.2 == mark => last.1 = end,
        _ => ranges.push((start, end, mark)),
    }
}

/// Sibling blocks covering `from..to`: the position before the first, the
/// position after the last, and the blocks themselves
fn block_range(doc: &Node, from: usize, to: usize) -> StepResult<(usize, usize, Fragment)> {
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let mut depth = rfrom.shared_depth(to);
    while depth > 0 && rfrom.node(depth).inline_content() {
        depth -= 1;
    }

    let parent = rfrom.node(depth);
    let first = rfrom.index(depth);
    let last = if rto.depth() > depth {
        rto.index(depth)
    } else {
        rto.index(depth).saturating_sub(1).max(first)
    };
    if first >= parent.child_count() {
        return Err(StepError::structure("wrap", from, "no block at position"));
    }

    let start = rfrom.start(depth)
        + (0..first).map(|i| parent.child(i).node_size()).sum::<usize>();
    let blocks: Vec<Node> = (first..=last.min(parent.child_count() - 1))
        .map(|i| parent.child(i).clone())
        .collect();
    let end = start + blocks.iter().map(Node::node_size).sum::<usize>();
    Ok((start, end, Fragment::from_vec(blocks)))
}

//! # Slices and replacement
//!
//! A [`Slice`] is a piece of a document: a fragment plus how many levels are
//! "open" (cut through) at its start and end. Replacing a range with a slice
//! stitches the open sides of the slice onto the nodes around the range,
//! joining compatible nodes and validating every node it rebuilds.

use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::node::Node;
use crate::resolved_pos::ResolvedPos;

#[derive(Clone, PartialEq, Default)]
pub struct Slice {
    pub content: Fragment,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A closed slice holding the given fragment
    pub fn closed(content: Fragment) -> Self {
        Self::new(content, 0, 0)
    }

    /// Positions this slice adds when inserted
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }

    pub fn is_empty(&self) -> bool {
        self.content.size() == 0
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({},{})", self.content, self.open_start, self.open_end)
    }
}

pub(crate) fn replace(from: &ResolvedPos, to: &ResolvedPos, slice: &Slice) -> ModelResult<Node> {
    if slice.open_start > from.depth() {
        return Err(ModelError::replace("inserted content deeper than insertion position"));
    }
    if slice.open_end > to.depth() || from.depth() - slice.open_start != to.depth() - slice.open_end {
        return Err(ModelError::replace("inconsistent open depths"));
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> ModelResult<Node> {
    let index = from.index(depth);
    let node = from.node(depth);

    if index == to.index(depth) && depth < from.depth() - slice.open_start {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        return Ok(node.copy(node.content().replace_child(index, inner)));
    }
    if slice.content.size() == 0 {
        return close(node, replace_two_way(from, to, depth)?);
    }
    if slice.open_start == 0
        && slice.open_end == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(&slice.content)
            .append(&content.cut(to.parent_offset(), content.size()));
        return close(parent, joined);
    }

    let (start, end) = prepare_slice_for_replace(slice, from)?;
    close(node, replace_three_way(from, &start, &end, to, depth)?)
}

fn check_join(main: &Node, sub: &Node) -> ModelResult<()> {
    if sub.ty().compatible_content(main.ty()) {
        Ok(())
    } else {
        Err(ModelError::replace(format!(
            "cannot join {} onto {}",
            sub.type_name(),
            main.type_name()
        )))
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> ModelResult<Node> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

fn add_node(child: Node, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut() {
        if let (Some(a), Some(b)) = (last.text(), child.text()) {
            if child.same_markup(last) {
                let merged = format!("{}{}", a, b);
                *last = last.with_text(merged);
                return;
            }
        }
    }
    target.push(child);
}

fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let Some(anchor) = end.or(start) else {
        return;
    };
    let node = anchor.node(depth);
    let mut start_index = 0;
    let end_index = end.map(|e| e.index(depth)).unwrap_or(node.child_count());

    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(node.child(i).clone(), target);
    }
    if let Some(end) = end {
        if end.depth() == depth && end.text_offset() > 0 {
            if let Some(before) = end.node_before() {
                add_node(before, target);
            }
        }
    }
}

fn close(node: &Node, content: Fragment) -> ModelResult<Node> {
    node.ty().check_content(&content).map_err(|_| {
        ModelError::replace(format!("invalid content for node {}", node.type_name()))
    })?;
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> ModelResult<Fragment> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);

    match (&open_start, &open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            add_node(close(os, inner)?, &mut content);
        }
        _ => {
            if let Some(os) = &open_start {
                let inner = replace_two_way(from, start, depth + 1)?;
                add_node(close(os, inner)?, &mut content);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = &open_end {
                let inner = replace_two_way(end, to, depth + 1)?;
                add_node(close(oe, inner)?, &mut content);
            }
        }
    }

    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

fn replace_two_way(from: &ResolvedPos, to: &ResolvedPos, depth: usize) -> ModelResult<Fragment> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let ty = joinable(from, to, depth + 1)?;
        let inner = replace_two_way(from, to, depth + 1)?;
        add_node(close(&ty, inner)?, &mut content);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

/// Wrap the slice in copies of the ancestors of `along` so its open sides
/// can be resolved at the same depths as the replaced range
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> ModelResult<(ResolvedPos, ResolvedPos)> {
    let extra = along.depth() - slice.open_start;
    let parent = along.node(extra);
    let mut node = parent.copy(slice.content.clone());
    for depth in (0..extra).rev() {
        node = along.node(depth).copy(Fragment::from_node(node));
    }
    let start = ResolvedPos::resolve(&node, slice.open_start + extra)?;
    let end = ResolvedPos::resolve(&node, node.content().size() - slice.open_end - extra)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use crate::test_schema::{doc, p, schema, text};
    use crate::{Fragment, Slice};

    #[test]
    fn test_insert_text_flat() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "hi")])]);
        let slice = Slice::closed(Fragment::from_node(text(&s, "!")));

        let result = d.replace(3, 3, &slice).unwrap();
        assert_eq!(result, doc(&s, vec![p(&s, vec![text(&s, "hi!")])]));
    }

    #[test]
    fn test_delete_across_blocks_joins_them() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "ab")]), p(&s, vec![text(&s, "cd")])]);

        // From after "a" to before "d"
        let result = d.replace(2, 6, &Slice::empty()).unwrap();
        assert_eq!(result, doc(&s, vec![p(&s, vec![text(&s, "ad")])]));
    }

    #[test]
    fn test_replace_with_open_slice_splits_block() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "abcd")])]);
        let split = Slice::new(
            Fragment::from_vec(vec![p(&s, vec![]), p(&s, vec![])]),
            1,
            1,
        );

        let result = d.replace(3, 3, &split).unwrap();
        assert_eq!(
            result,
            doc(&s, vec![p(&s, vec![text(&s, "ab")]), p(&s, vec![text(&s, "cd")])])
        );
    }

    #[test]
    fn test_slice_and_reinsert() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "ab")]), p(&s, vec![text(&s, "cd")])]);
        let slice = d.slice(2, 6).unwrap();
        assert_eq!(slice.open_start, 1);
        assert_eq!(slice.open_end, 1);

        let removed = d.replace(2, 6, &crate::Slice::empty()).unwrap();
        let restored = removed.replace(2, 2, &slice).unwrap();
        assert_eq!(restored, d);
    }

    #[test]
    fn test_invalid_replace_is_rejected() {
        let s = schema();
        let d = doc(&s, vec![p(&s, vec![text(&s, "ab")])]);
        // A paragraph cannot be inserted inside a paragraph
        let slice = Slice::closed(Fragment::from_node(p(&s, vec![])));
        assert!(d.replace(2, 2, &slice).is_err());
    }
}

//! # Diff derivation
//!
//! [`recreate_transform`] rebuilds a [`Transform`] that turns one document
//! into another. When only formatting differs it emits mark steps; otherwise
//! it finds the changed region with `find_diff_start`/`find_diff_end` and
//! emits the smallest replace step, out of a few progressively wider
//! candidates, that reproduces the target exactly.

use folio_model::{Fragment, Mark, Node};
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::step::Step;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecreateOptions {
    /// Allow add/remove mark steps; with `false` only replace steps are made
    pub allow_non_replace_steps: bool,

    /// Grow text changes to whole words
    pub word_granularity: bool,
}

impl Default for RecreateOptions {
    fn default() -> Self {
        Self {
            allow_non_replace_steps: true,
            word_granularity: false,
        }
    }
}

/// Derive steps turning `before` into `after`. Applying the returned
/// transform's steps to `before` always yields a document equal to `after`.
pub fn recreate_transform(before: &Node, after: &Node, options: RecreateOptions) -> StepResult<Transform> {
    let mut tr = Transform::new(before.clone());

    if options.allow_non_replace_steps && strip_marks(before) == strip_marks(after) {
        for step in mark_steps(before, after) {
            tr.step(step)?;
        }
        if tr.doc() == after {
            debug!(steps = tr.steps().len(), "formatting-only diff");
            return Ok(tr);
        }
    }

    replace_changed_range(&mut tr, after, options.word_granularity)?;
    if tr.doc() != after {
        return Err(StepError::Unreproducible);
    }
    debug!(steps = tr.steps().len(), "derived transform");
    Ok(tr)
}

fn replace_changed_range(tr: &mut Transform, after: &Node, word_granularity: bool) -> StepResult<()> {
    let current = tr.doc().clone();
    let (size_a, size_b) = (current.content().size(), after.content().size());
    let Some(mut start) = current.content().find_diff_start(after.content(), 0) else {
        return Ok(());
    };
    let (mut end_a, mut end_b) = current
        .content()
        .find_diff_end(after.content(), size_a, size_b)
        .unwrap_or((size_a, size_b));

    // The common suffix may overlap the common prefix when the change
    // repeats content next to it
    if end_a < start {
        end_b = (start + end_b).saturating_sub(end_a);
        end_a = start;
    } else if end_b < start {
        end_a = (start + end_a).saturating_sub(end_b);
        end_b = start;
    }

    if word_granularity {
        (start, end_a, end_b) = expand_to_words(&current, start, end_a, end_b)?;
    }

    for (from, to_a, to_b) in candidate_ranges(&current, after, start, end_a, end_b)? {
        let step = Step::replace(from, to_a, after.slice(from, to_b)?);
        match step.apply(&current) {
            Ok(doc) if doc == *after => {
                debug!(from, to_a, to_b, "replace range found");
                tr.step(step)?;
                return Ok(());
            }
            _ => continue,
        }
    }
    Err(StepError::Unreproducible)
}

/// Ranges to try, narrowest first: the exact changed region, then for each
/// shared ancestor (innermost first) its affected children and then its
/// whole content. The last candidate is the full document content, which
/// always works.
fn candidate_ranges(
    a: &Node,
    b: &Node,
    start: usize,
    end_a: usize,
    end_b: usize,
) -> StepResult<Vec<(usize, usize, usize)>> {
    let start_a = a.resolve(start)?;
    let start_b = b.resolve(start)?;
    let ra_end = a.resolve(end_a)?;
    let rb_end = b.resolve(end_b)?;
    let depth = start_a
        .shared_depth(end_a)
        .min(start_b.shared_depth(end_b));

    let mut ranges = vec![(start, end_a, end_b)];
    for d in (0..=depth).rev() {
        let children = start_a.before(d + 1).zip(start_b.before(d + 1)).and_then(|(from_a, from_b)| {
            let to_a = ra_end.after(d + 1)?;
            let to_b = rb_end.after(d + 1)?;
            (from_a == from_b).then_some((from_a, to_a, to_b))
        });
        if let Some(range) = children {
            ranges.push(range);
        }
        ranges.push((start_a.start(d), ra_end.end(d), rb_end.end(d)));
    }
    ranges.dedup();
    Ok(ranges)
}

fn expand_to_words(
    doc: &Node,
    start: usize,
    end_a: usize,
    end_b: usize,
) -> StepResult<(usize, usize, usize)> {
    let rstart = doc.resolve(start)?;
    let mut back = 0;
    if rstart.parent().inline_content() {
        let parent = rstart.parent();
        while back < rstart.parent_offset()
            && char_at(parent, rstart.parent_offset() - back - 1).is_some_and(is_word_char)
        {
            back += 1;
        }
    }

    let rend = doc.resolve(end_a)?;
    let mut forward = 0;
    if rend.parent().inline_content() {
        let parent = rend.parent();
        let size = parent.content().size();
        while rend.parent_offset() + forward < size
            && char_at(parent, rend.parent_offset() + forward).is_some_and(is_word_char)
        {
            forward += 1;
        }
    }

    Ok((start - back, end_a + forward, end_b + forward))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Character at a content offset of a textblock, `None` for non-text leaves
fn char_at(parent: &Node, offset: usize) -> Option<char> {
    let mut pos = 0;
    for child in parent.content().iter() {
        let end = pos + child.node_size();
        if offset < end {
            return child.text().and_then(|text| text.chars().nth(offset - pos));
        }
        pos = end;
    }
    None
}

fn strip_marks(node: &Node) -> Node {
    if node.content().size() == 0 {
        return node.mark(Vec::new());
    }
    let content = Fragment::from_vec(node.content().iter().map(strip_marks).collect());
    node.copy(content).mark(Vec::new())
}

/// Inline nodes in document order: start, end and marks
fn inline_runs(doc: &Node) -> Vec<(usize, usize, Vec<Mark>)> {
    let mut runs = Vec::new();
    doc.nodes_between(0, doc.content().size(), |node, pos, _, _| {
        if node.is_inline() {
            runs.push((pos, pos + node.node_size(), node.marks().to_vec()));
            false
        } else {
            true
        }
    });
    runs
}

/// Mark steps for two documents whose unmarked structure is identical
fn mark_steps(before: &Node, after: &Node) -> Vec<Step> {
    let runs_a = inline_runs(before);
    let runs_b = inline_runs(after);

    let mut bounds: Vec<usize> = runs_a
        .iter()
        .chain(&runs_b)
        .flat_map(|(start, end, _)| [*start, *end])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
    let mut added: Vec<(usize, usize, Mark)> = Vec::new();
    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let (Some(marks_a), Some(marks_b)) = (marks_covering(&runs_a, from, to), marks_covering(&runs_b, from, to)) else {
            continue;
        };
        for mark in marks_a.iter().filter(|m| !m.is_in_set(marks_b)) {
            extend_range(&mut removed, from, to, mark);
        }
        for mark in marks_b.iter().filter(|m| !m.is_in_set(marks_a)) {
            extend_range(&mut added, from, to, mark);
        }
    }

    let removals = removed
        .into_iter()
        .map(|(from, to, mark)| Step::RemoveMark { from, to, mark });
    let additions = added
        .into_iter()
        .map(|(from, to, mark)| Step::AddMark { from, to, mark });
    removals.chain(additions).collect()
}

fn marks_covering(runs: &[(usize, usize, Vec<Mark>)], from: usize, to: usize) -> Option<&[Mark]> {
    runs.iter()
        .find(|(start, end, _)| *start <= from && *end >= to)
        .map(|(_, _, marks)| marks.as_slice())
}

fn extend_range(ranges: &mut Vec<(usize, usize, Mark)>, from: usize, to: usize, mark: &Mark) {
    if let Some(existing) = ranges.iter_mut().rev().find(|(_, end, m)| *end == from && m == mark) {
        existing.1 = to;
        return;
    }
    ranges.push((from, to, mark.clone()));
}

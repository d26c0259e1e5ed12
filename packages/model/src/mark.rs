use std::fmt;

use crate::schema::{Attrs, MarkType};

/// A mark instance attached to inline content.
///
/// Mark sets are plain `Vec<Mark>` kept sorted by [`MarkType::rank`] with at
/// most one mark per type.
#[derive(Clone, PartialEq)]
pub struct Mark {
    ty: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(ty: MarkType, attrs: Attrs) -> Self {
        Self { ty, attrs }
    }

    pub fn mark_type(&self) -> &MarkType {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Add this mark to a set, replacing any mark of the same type
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut result = Vec::with_capacity(set.len() + 1);
        let mut placed = false;
        for mark in set {
            if mark == self {
                return set.to_vec();
            }
            if mark.ty == self.ty {
                continue;
            }
            if !placed && mark.ty.rank() > self.ty.rank() {
                result.push(self.clone());
                placed = true;
            }
            result.push(mark.clone());
        }
        if !placed {
            result.push(self.clone());
        }
        result
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }

    pub fn same_set(a: &[Mark], b: &[Mark]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
    }

    /// Sort a list of marks into a valid set
    pub fn normalize_set(marks: Vec<Mark>) -> Vec<Mark> {
        marks
            .iter()
            .fold(Vec::with_capacity(marks.len()), |set, mark| mark.add_to_set(&set))
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.ty.name())
        } else {
            write!(f, "{}({:?})", self.ty.name(), self.attrs)
        }
    }
}

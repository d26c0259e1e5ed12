//! # Position mapping
//!
//! A [`StepMap`] records which ranges a step replaced and how large the new
//! content is, so positions in the old document can be carried over to the
//! new one. A [`Mapping`] chains the maps of several steps.

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// One replaced range: `old_size` positions starting at `start` became
/// `new_size` positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<MapRange>,
    inverted: bool,
}

impl StepMap {
    pub fn new(ranges: Vec<MapRange>) -> Self {
        Self {
            ranges,
            inverted: false,
        }
    }

    /// Map that leaves every position untouched (mark steps)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> impl Iterator<Item = MapRange> + '_ {
        self.ranges.iter().map(move |r| {
            if self.inverted {
                MapRange {
                    start: r.start,
                    old_size: r.new_size,
                    new_size: r.old_size,
                }
            } else {
                *r
            }
        })
    }

    pub fn invert(&self) -> StepMap {
        StepMap {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let mut diff: isize = 0;
        for range in self.ranges() {
            // Starts are stored in pre-step coordinates
            let start = if self.inverted {
                range.start as isize - diff
            } else {
                range.start as isize
            };
            let pos_i = pos as isize;
            if start > pos_i {
                break;
            }
            let end = start + range.old_size as isize;
            if pos_i <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos_i == start {
                    Assoc::Before
                } else if pos_i == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = start + diff;
                return match side {
                    Assoc::Before => base as usize,
                    Assoc::After => base as usize + range.new_size,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        (pos as isize + diff) as usize
    }
}

/// A sequence of step maps applied one after another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }

    /// Mapping that carries positions back from the last document to the first
    pub fn invert(&self) -> Mapping {
        Mapping {
            maps: self.maps.iter().rev().map(StepMap::invert).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_shifts_later_positions() {
        let map = StepMap::new(vec![MapRange {
            start: 3,
            old_size: 0,
            new_size: 2,
        }]);
        assert_eq!(map.map(1, Assoc::After), 1);
        assert_eq!(map.map(3, Assoc::Before), 3);
        assert_eq!(map.map(3, Assoc::After), 5);
        assert_eq!(map.map(4, Assoc::After), 6);
    }

    #[test]
    fn test_deletion_collapses_range() {
        let map = StepMap::new(vec![MapRange {
            start: 2,
            old_size: 4,
            new_size: 0,
        }]);
        assert_eq!(map.map(4, Assoc::Before), 2);
        assert_eq!(map.map(4, Assoc::After), 2);
        assert_eq!(map.map(8, Assoc::After), 4);
    }

    #[test]
    fn test_inverted_map_undoes_shift() {
        let map = StepMap::new(vec![MapRange {
            start: 3,
            old_size: 1,
            new_size: 4,
        }]);
        let inverse = map.invert();
        assert_eq!(inverse.map(map.map(10, Assoc::After), Assoc::After), 10);
        assert_eq!(inverse.map(map.map(1, Assoc::After), Assoc::After), 1);
    }

    #[test]
    fn test_mapping_chains_maps() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(vec![MapRange {
            start: 1,
            old_size: 0,
            new_size: 3,
        }]));
        mapping.push(StepMap::new(vec![MapRange {
            start: 6,
            old_size: 2,
            new_size: 0,
        }]));
        assert_eq!(mapping.map(5, Assoc::After), 6);
        assert_eq!(mapping.invert().map(6, Assoc::After), 5);
    }
}

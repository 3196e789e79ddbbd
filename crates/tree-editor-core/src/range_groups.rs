//! Overlap grouping and nesting of cursor ranges.

use std::collections::BTreeMap;

use crate::path::{EvenPathRange, Path, path_is_in_range};

/// Group ranges that share a parent and overlap without one containing the other.
///
/// Every input index appears in exactly one group; groups of size one are ranges that overlap
/// nothing. Within a parent, ranges are ordered by start index and merged while they overlap.
pub fn group_overlapping_non_nested(ranges: &[EvenPathRange]) -> Vec<Vec<usize>> {
    let mut by_parent: BTreeMap<Path, Vec<(usize, usize, usize)>> = BTreeMap::new();
    let mut groups = Vec::new();
    for (i, range) in ranges.iter().enumerate() {
        match range.index_span() {
            Some((first, last)) => by_parent
                .entry(range.parent().to_vec())
                .or_default()
                .push((first, last, i)),
            None => groups.push(vec![i]),
        }
    }

    for (_, mut spans) in by_parent {
        spans.sort();
        let mut current: Vec<usize> = Vec::new();
        let mut current_end = 0;
        for (first, last, i) in spans {
            if !current.is_empty() && first <= current_end {
                current.push(i);
                current_end = current_end.max(last);
            } else {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current.push(i);
                current_end = last;
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
    }
    groups
}

/// Whether any two ranges overlap without nesting.
pub fn has_overlapping_non_nested(ranges: &[EvenPathRange]) -> bool {
    group_overlapping_non_nested(ranges)
        .iter()
        .any(|group| group.len() > 1)
}

/// Document-order nesting of a set of non-overlapping ranges.
///
/// Ranges form a forest: a range is the parent of another if it contains it. Traversing the
/// forest in document order enters parents before children and exits children before parents.
#[derive(Debug, Clone)]
pub struct RangeNesting {
    order: Vec<usize>,
    parents: Vec<Option<usize>>,
    first_exited: Option<usize>,
}

impl RangeNesting {
    /// Build the forest. Ranges must not overlap without nesting.
    pub fn new(ranges: &[EvenPathRange]) -> Self {
        let forward: Vec<EvenPathRange> = ranges.iter().map(EvenPathRange::flip_forward).collect();
        let mut order: Vec<usize> = (0..ranges.len()).collect();
        order.sort_by(|&a, &b| forward[a].anchor.cmp(&forward[b].anchor).then(a.cmp(&b)));

        let contains = |outer: usize, inner: usize| {
            forward[inner].anchor.len() > forward[outer].anchor.len()
                && path_is_in_range(&forward[inner].anchor, &forward[outer])
        };

        let mut parents = vec![None; ranges.len()];
        let mut stack: Vec<usize> = Vec::new();
        let mut first_exited = None;
        for &i in &order {
            while let Some(&top) = stack.last() {
                if contains(top, i) {
                    break;
                }
                stack.pop();
                first_exited.get_or_insert(top);
            }
            parents[i] = stack.last().copied();
            stack.push(i);
        }
        if let Some(&top) = stack.last() {
            first_exited.get_or_insert(top);
        }

        Self {
            order,
            parents,
            first_exited,
        }
    }

    /// The range whose traversal finishes first: the first innermost range in document order.
    pub fn first_exited(&self) -> Option<usize> {
        self.first_exited
    }

    /// The range entered last: the last range in document order.
    pub fn last_entered(&self) -> Option<usize> {
        self.order.last().copied()
    }

    /// Ranges that contain no other range, in document order.
    pub fn inner(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&i| !self.parents.contains(&Some(i)))
            .collect()
    }

    /// Ranges contained in no other range, in document order.
    pub fn outer(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&i| self.parents[i].is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    #[test]
    fn test_grouping() {
        let ranges = [
            r(&[0, 1], 1),    // 0: [1, 2]
            r(&[0, 3], -1),   // 1: [2, 3] overlaps 0
            r(&[0, 5], 0),    // 2: alone
            r(&[0, 1, 0], 0), // 3: nested inside 0, other parent
            r(&[], 0),        // 4: root
        ];
        let mut groups = group_overlapping_non_nested(&ranges);
        groups.sort();
        assert_eq!(groups, vec![vec![0, 1], vec![2], vec![3], vec![4]]);
        assert!(has_overlapping_non_nested(&ranges));
        assert!(!has_overlapping_non_nested(&ranges[2..]));
    }

    #[test]
    fn test_identical_ranges_overlap() {
        assert!(has_overlapping_non_nested(&[r(&[1], 0), r(&[1], 0)]));
    }

    #[test]
    fn test_nesting() {
        let ranges = [
            r(&[1], 0),       // 0: outer, contains 1 and 2
            r(&[1, 0], 0),    // 1: inner
            r(&[1, 2, 0], 0), // 2: inner
            r(&[0], 0),       // 3: alone, first in document order
            r(&[2], 1),       // 4: alone, last
        ];
        let nesting = RangeNesting::new(&ranges);
        assert_eq!(nesting.first_exited(), Some(3));
        assert_eq!(nesting.last_entered(), Some(4));
        assert_eq!(nesting.inner(), vec![3, 1, 2, 4]);
        assert_eq!(nesting.outer(), vec![3, 0, 4]);

        let nested_first = RangeNesting::new(&ranges[..3]);
        assert_eq!(nested_first.first_exited(), Some(1));
        assert_eq!(nested_first.last_entered(), Some(2));
    }
}

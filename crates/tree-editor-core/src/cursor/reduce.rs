//! Shrinking a selection, and shrinking a set of cursors.

use std::collections::BTreeMap;

use crate::error::Warning;
use crate::focus::{is_focus_on_empty_list_content, normalize_in};
use crate::node::Node;
use crate::path::EvenPathRange;
use crate::range_groups::{RangeNesting, group_overlapping_non_nested};

use super::{Cursor, Outcome};

/// Which end of a selection to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceSide {
    /// The first selected node.
    First,
    /// The last selected node.
    Last,
    /// The end the last extension moved. Only available right after extending.
    JustExtended,
}

/// Which cursors of a lineage group survive [`reduce_across`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceAcrossSide {
    /// The first innermost cursor in document order.
    First,
    /// The last cursor in document order.
    Last,
    /// Cursors that contain no other cursor.
    Inner,
    /// Cursors contained in no other cursor.
    Outer,
    /// Keep one cursor per group of overlapping cursors. Lineage is ignored.
    FixOverlap,
}

/// Reduce the selection to a single node at one of its ends.
///
/// A single list is first opened, so reducing `(a, b)` selects `a` rather than the list.
pub fn reduce_selection(root: &Node, cursor: &Cursor, side: ReduceSide) -> Cursor {
    if (side == ReduceSide::JustExtended && !cursor.enable_reduce_to_tip)
        || is_focus_on_empty_list_content(root, &cursor.focus)
    {
        return cursor.settled();
    }
    let target = match side {
        ReduceSide::First => Ok(skip_into_lists(root, &cursor.focus).anchor),
        ReduceSide::Last => skip_into_lists(root, &cursor.focus).path_to_tip(),
        ReduceSide::JustExtended => cursor.focus.path_to_tip(),
    };
    match target {
        Ok(path) if root.get_by_path(&path).is_some() => {
            cursor.with_focus(normalize_in(root, &EvenPathRange::at(path)))
        }
        _ => cursor.settled(),
    }
}

/// Open single-node selections of lists until a range or a leaf is selected. Stops right
/// after opening a delimited list.
fn skip_into_lists(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    let mut focus = focus.flip_forward();
    while focus.offset == 0 {
        let Some(Node::List(list)) = root.get_by_path(&focus.anchor) else {
            break;
        };
        if list.content.is_empty() {
            break;
        }
        let mut anchor = focus.anchor.clone();
        anchor.push(0);
        focus = EvenPathRange::new(anchor, list.content.len() as isize - 1);
        if !list.equivalent_to_content {
            break;
        }
    }
    focus
}

/// Keep only some of the cursors split off by the most recent distinguishing search.
///
/// Cursors are grouped by the newest lineage entry that tells them apart; within every group
/// `side` picks the survivors, which then lose that lineage entry. Overlapping cursors block
/// the reduction unless `side` is [`ReduceAcrossSide::FixOverlap`], which keeps the
/// earliest-starting cursor of every overlap group and returns the survivors in their input
/// order.
pub fn reduce_across(cursors: &[Cursor], side: ReduceAcrossSide) -> Outcome<Vec<Cursor>> {
    let mut cursors: Vec<Cursor> = cursors
        .iter()
        .map(|c| c.with_focus(c.focus.flip_forward()))
        .collect();
    let focuses: Vec<EvenPathRange> = cursors.iter().map(|c| c.focus.clone()).collect();
    let overlap_groups = group_overlapping_non_nested(&focuses);

    if side == ReduceAcrossSide::FixOverlap {
        let mut keep: Vec<usize> = overlap_groups.iter().filter_map(|g| g.first().copied()).collect();
        // Groups come out by parent and start index.
        keep.sort_unstable();
        return Outcome::Done(keep.into_iter().map(|i| cursors[i].clone()).collect());
    }
    if overlap_groups.iter().any(|g| g.len() > 1) {
        return Outcome::Rejected(Warning::OverlappingCursors);
    }

    let groups = loop {
        let mut groups: BTreeMap<Option<u64>, Vec<usize>> = BTreeMap::new();
        for (i, cursor) in cursors.iter().enumerate() {
            groups.entry(cursor.parent_path.last().copied()).or_default().push(i);
        }
        if groups.values().any(|g| g.len() > 1) {
            break groups;
        }
        if cursors.iter().all(|c| c.parent_path.is_empty()) {
            return Outcome::Rejected(Warning::NoCursorLineage);
        }
        for cursor in &mut cursors {
            cursor.parent_path.pop();
        }
    };

    let mut result = Vec::new();
    for members in groups.values() {
        let ranges: Vec<EvenPathRange> = members.iter().map(|&i| cursors[i].focus.clone()).collect();
        let nesting = RangeNesting::new(&ranges);
        let picked: Vec<usize> = match side {
            ReduceAcrossSide::First => nesting.first_exited().into_iter().collect(),
            ReduceAcrossSide::Last => nesting.last_entered().into_iter().collect(),
            ReduceAcrossSide::Inner => nesting.inner(),
            ReduceAcrossSide::Outer => nesting.outer(),
            ReduceAcrossSide::FixOverlap => Vec::new(),
        };
        for local in picked {
            let mut cursor = cursors[members[local]].clone();
            cursor.parent_path.pop();
            result.push(cursor);
        }
    }
    Outcome::Done(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;
    use pretty_assertions::assert_eq;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn sample() -> Node {
        // f(x, y) z
        doc(file(vec![
            tight(vec![tok("f"), args(vec![tok("x"), tok("y")])]),
            tok("z"),
        ]))
        .root_node()
    }

    fn with_lineage(focus: EvenPathRange, lineage: &[u64]) -> Cursor {
        let mut cursor = Cursor::new(focus);
        cursor.parent_path = lineage.to_vec();
        cursor
    }

    fn done<T>(outcome: Outcome<T>) -> T {
        match outcome {
            Outcome::Done(value) => value,
            Outcome::Rejected(warning) => panic!("rejected: {warning}"),
        }
    }

    #[test]
    fn test_reduce_to_first_and_last() {
        let root = sample();
        let cursor = Cursor::new(r(&[1], -1));
        assert_eq!(reduce_selection(&root, &cursor, ReduceSide::First).focus, r(&[0, 0], 1));
        assert_eq!(reduce_selection(&root, &cursor, ReduceSide::Last).focus, r(&[1], 0));

        // A single delimited list is opened first.
        let list = Cursor::new(r(&[0, 1], 0));
        assert_eq!(reduce_selection(&root, &list, ReduceSide::First).focus, r(&[0, 1, 0], 0));
        assert_eq!(reduce_selection(&root, &list, ReduceSide::Last).focus, r(&[0, 1, 1], 0));
    }

    #[test]
    fn test_reduce_to_tip_needs_extension() {
        let root = sample();
        let mut cursor = Cursor::new(r(&[0, 1, 0], 1));
        assert_eq!(
            reduce_selection(&root, &cursor, ReduceSide::JustExtended).focus,
            cursor.focus
        );
        cursor.enable_reduce_to_tip = true;
        let reduced = reduce_selection(&root, &cursor, ReduceSide::JustExtended);
        assert_eq!(reduced.focus, r(&[0, 1, 1], 0));
        assert!(!reduced.enable_reduce_to_tip);
    }

    #[test]
    fn test_reduce_across_picks_per_lineage_group() {
        let cursors = vec![
            with_lineage(r(&[0], 0), &[7, 1]),
            with_lineage(r(&[0, 1], 0), &[7, 1]),
            with_lineage(r(&[2], 0), &[7, 2]),
            with_lineage(r(&[3], 0), &[7, 2]),
        ];
        let first = done(reduce_across(&cursors, ReduceAcrossSide::First));
        assert_eq!(
            first.iter().map(|c| c.focus.clone()).collect::<Vec<_>>(),
            vec![r(&[0, 1], 0), r(&[2], 0)]
        );
        assert!(first.iter().all(|c| c.parent_path == vec![7]));

        let outer = done(reduce_across(&cursors, ReduceAcrossSide::Outer));
        assert_eq!(
            outer.iter().map(|c| c.focus.clone()).collect::<Vec<_>>(),
            vec![r(&[0], 0), r(&[2], 0), r(&[3], 0)]
        );
    }

    #[test]
    fn test_reduce_across_skips_undistinguishing_lineage() {
        let cursors = vec![
            with_lineage(r(&[0], 0), &[4, 9]),
            with_lineage(r(&[1], 0), &[4, 9]),
        ];
        // Both share 9, so the group is found at that level already.
        let last = done(reduce_across(&cursors, ReduceAcrossSide::Last));
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].focus, r(&[1], 0));
        assert_eq!(last[0].parent_path, vec![4]);

        let lonely = vec![with_lineage(r(&[0], 0), &[])];
        assert!(matches!(
            reduce_across(&lonely, ReduceAcrossSide::First),
            Outcome::Rejected(Warning::NoCursorLineage)
        ));
    }

    #[test]
    fn test_reduce_across_fails_closed_on_overlap() {
        let cursors = vec![
            with_lineage(r(&[0], 1), &[1]),
            with_lineage(r(&[2], -1), &[1]),
            with_lineage(r(&[4], 0), &[1]),
        ];
        assert!(matches!(
            reduce_across(&cursors, ReduceAcrossSide::Inner),
            Outcome::Rejected(Warning::OverlappingCursors)
        ));
        let fixed = done(reduce_across(&cursors, ReduceAcrossSide::FixOverlap));
        assert_eq!(
            fixed.iter().map(|c| c.focus.clone()).collect::<Vec<_>>(),
            vec![r(&[0], 1), r(&[4], 0)]
        );
    }

    #[test]
    fn test_fix_overlap_keeps_input_order() {
        let cursors = vec![
            with_lineage(r(&[4], 0), &[1]),
            with_lineage(r(&[2], -1), &[1]),
            with_lineage(r(&[0], 1), &[1]),
        ];
        let fixed = done(reduce_across(&cursors, ReduceAcrossSide::FixOverlap));
        assert_eq!(
            fixed.iter().map(|c| c.focus.clone()).collect::<Vec<_>>(),
            vec![r(&[4], 0), r(&[0], 1)]
        );
        assert_eq!(fixed[0].id, cursors[0].id);
        assert_eq!(fixed[1].id, cursors[2].id);
    }
}

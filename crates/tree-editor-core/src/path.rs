//! Path algebra.
//!
//! A [`Path`] addresses a node by the child indices leading to it from the root. Selections are
//! ranges of siblings, stored in one of two encodings:
//!
//! - [`EvenPathRange`]: an anchor path plus a signed sibling offset. Both ends share a parent.
//! - [`UnevenPathRange`]: two arbitrary paths. Converting to the even form factors out the
//!   longest common prefix; the first diverging index pair becomes the variable index.
//!
//! All functions here are pure.

use std::collections::HashSet;

use thiserror::Error;

use crate::node::Node;

/// Child indices from the root to a node.
pub type Path = Vec<usize>;

/// Errors raised by path conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The root has no siblings, so a non-zero offset at the root is meaningless.
    #[error("offset {0} is not allowed on the root path")]
    OffsetAtRoot(isize),
    /// `anchor + offset` would point before the first sibling.
    #[error("range {anchor:?}{offset:+} starts before the first sibling")]
    NegativeIndex {
        /// Anchor of the offending range.
        anchor: Path,
        /// Offset of the offending range.
        offset: isize,
    },
    /// A containing range was requested for an empty path set.
    #[error("no paths given")]
    NoPaths,
}

/// Sibling range `[last(anchor), last(anchor) + offset]` under the anchor's parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct EvenPathRange {
    /// Path of the node the range starts at (the side the selection grew from).
    pub anchor: Path,
    /// Signed distance from the anchor to the tip.
    pub offset: isize,
}

/// Two arbitrary paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnevenPathRange {
    /// Fixed end.
    pub anchor: Path,
    /// Moving end.
    pub tip: Path,
}

/// Either range encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathRange {
    /// Sibling range.
    Even(EvenPathRange),
    /// Arbitrary path pair.
    Uneven(UnevenPathRange),
}

impl PathRange {
    /// Even form of the range.
    pub fn to_even(&self) -> EvenPathRange {
        match self {
            PathRange::Even(r) => r.clone(),
            PathRange::Uneven(r) => r.as_even(),
        }
    }
}

impl From<EvenPathRange> for PathRange {
    fn from(r: EvenPathRange) -> Self {
        PathRange::Even(r)
    }
}

impl From<UnevenPathRange> for PathRange {
    fn from(r: UnevenPathRange) -> Self {
        PathRange::Uneven(r)
    }
}

impl EvenPathRange {
    /// Create a range.
    pub fn new(anchor: Path, offset: isize) -> Self {
        Self { anchor, offset }
    }

    /// Zero-offset range selecting exactly the node at `path`.
    pub fn at(path: impl Into<Path>) -> Self {
        Self {
            anchor: path.into(),
            offset: 0,
        }
    }

    /// Path of the parent shared by every selected sibling.
    pub fn parent(&self) -> &[usize] {
        match self.anchor.split_last() {
            Some((_, parent)) => parent,
            None => &[],
        }
    }

    /// `(first, last)` sibling indices, in ascending order. `None` at the root.
    pub fn index_span(&self) -> Option<(usize, usize)> {
        let &anchor = self.anchor.last()?;
        let tip = anchor.checked_add_signed(self.offset)?;
        Some((anchor.min(tip), anchor.max(tip)))
    }

    /// Uneven form; fails for non-zero offsets at the root or negative tips.
    pub fn as_uneven(&self) -> Result<UnevenPathRange, PathError> {
        Ok(UnevenPathRange {
            anchor: self.anchor.clone(),
            tip: self.path_to_tip()?,
        })
    }

    /// Path of the tip end of the range.
    pub fn path_to_tip(&self) -> Result<Path, PathError> {
        if self.offset == 0 {
            return Ok(self.anchor.clone());
        }
        let Some((&last, parent)) = self.anchor.split_last() else {
            return Err(PathError::OffsetAtRoot(self.offset));
        };
        let tip = last
            .checked_add_signed(self.offset)
            .ok_or_else(|| PathError::NegativeIndex {
                anchor: self.anchor.clone(),
                offset: self.offset,
            })?;
        let mut path = parent.to_vec();
        path.push(tip);
        Ok(path)
    }

    /// Same siblings, anchor and tip swapped.
    pub fn flip(&self) -> EvenPathRange {
        if self.offset == 0 {
            return self.clone();
        }
        match self.path_to_tip() {
            Ok(tip) => EvenPathRange {
                anchor: tip,
                offset: -self.offset,
            },
            Err(_) => self.clone(),
        }
    }

    /// Same siblings with a non-negative offset.
    pub fn flip_forward(&self) -> EvenPathRange {
        if self.offset < 0 { self.flip() } else { self.clone() }
    }

    /// Same siblings with a non-positive offset.
    pub fn flip_backward(&self) -> EvenPathRange {
        if self.offset > 0 { self.flip() } else { self.clone() }
    }

    /// Equality that ignores which end is the anchor.
    pub fn same_siblings(&self, other: &EvenPathRange) -> bool {
        self.flip_forward() == other.flip_forward()
    }

    /// Whether the range resolves against `root`.
    pub fn is_valid(&self, root: &Node) -> bool {
        if self.anchor.is_empty() {
            return self.offset == 0;
        }
        let Some((first, last)) = self.index_span() else {
            return false;
        };
        match root.get_by_path(self.parent()) {
            Some(Node::List(list)) => first < list.content.len() && last < list.content.len(),
            _ => false,
        }
    }
}

impl UnevenPathRange {
    /// Even form: factor out the common prefix.
    pub fn as_even(&self) -> EvenPathRange {
        let mut prefix = Vec::new();
        for (&a, &t) in self.anchor.iter().zip(&self.tip) {
            if a != t {
                prefix.push(a);
                return EvenPathRange {
                    anchor: prefix,
                    offset: t as isize - a as isize,
                };
            }
            prefix.push(a);
        }
        let len = self.anchor.len().min(self.tip.len());
        EvenPathRange {
            anchor: self.anchor[..len].to_vec(),
            offset: 0,
        }
    }
}

/// Parent of a path; the root is its own parent.
pub fn parent_path(path: &[usize]) -> &[usize] {
    match path.split_last() {
        Some((_, parent)) => parent,
        None => &[],
    }
}

/// Longest prefix shared by every path.
pub fn common_prefix<'a>(paths: impl IntoIterator<Item = &'a [usize]>) -> Path {
    let mut iter = paths.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut len = first.len();
    for path in iter {
        len = len.min(
            first
                .iter()
                .zip(path)
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    first[..len].to_vec()
}

/// Minimal even range covering every path in the set.
///
/// If one of the paths is the common prefix itself the result selects that ancestor, not a
/// range of its children.
pub fn smallest_containing_range(paths: &[Path]) -> Result<EvenPathRange, PathError> {
    if paths.is_empty() {
        return Err(PathError::NoPaths);
    }
    let prefix = common_prefix(paths.iter().map(Vec::as_slice));
    if paths.iter().any(|p| p.len() == prefix.len()) {
        return Ok(EvenPathRange::at(prefix));
    }
    let depth = prefix.len();
    let first = paths.iter().map(|p| p[depth]).min().unwrap_or_default();
    let last = paths.iter().map(|p| p[depth]).max().unwrap_or_default();
    let mut anchor = prefix;
    anchor.push(first);
    Ok(EvenPathRange {
        anchor,
        offset: (last - first) as isize,
    })
}

/// Whether `path` is one of the selected siblings or a descendant of one.
pub fn path_is_in_range(path: &[usize], range: &EvenPathRange) -> bool {
    let Some((first, last)) = range.index_span() else {
        return true;
    };
    let parent = range.parent();
    if path.len() <= parent.len() || !path.starts_with(parent) {
        return false;
    }
    let index = path[parent.len()];
    first <= index && index <= last
}

/// Document order: ancestors come before descendants, siblings by index.
pub fn path_less_than(a: &[usize], b: &[usize]) -> bool {
    a < b
}

/// Drop duplicate paths, keeping the first occurrence.
pub fn unique_by_path(paths: Vec<Path>) -> Vec<Path> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    #[test]
    fn test_as_uneven_and_back() {
        for range in [r(&[0, 2], 3), r(&[1, 4], -2), r(&[0], 0), r(&[], 0)] {
            assert_eq!(range.as_uneven().unwrap().as_even(), range);
        }
        assert_eq!(r(&[], 1).as_uneven(), Err(PathError::OffsetAtRoot(1)));
        assert!(matches!(
            r(&[0, 1], -2).as_uneven(),
            Err(PathError::NegativeIndex { .. })
        ));
    }

    #[test]
    fn test_uneven_to_even_factors_common_prefix() {
        let uneven = UnevenPathRange {
            anchor: vec![0, 1, 4, 2],
            tip: vec![0, 3, 0],
        };
        assert_eq!(uneven.as_even(), r(&[0, 1], 2));

        let nested = UnevenPathRange {
            anchor: vec![2, 1],
            tip: vec![2, 1, 0],
        };
        assert_eq!(nested.as_even(), r(&[2, 1], 0));
    }

    #[test]
    fn test_flip() {
        assert_eq!(r(&[0, 1], 2).flip(), r(&[0, 3], -2));
        assert_eq!(r(&[0, 3], -2).flip_forward(), r(&[0, 1], 2));
        assert_eq!(r(&[0, 1], 2).flip_backward(), r(&[0, 3], -2));
        assert_eq!(r(&[0, 1], 0).flip(), r(&[0, 1], 0));
        assert!(r(&[0, 1], 2).same_siblings(&r(&[0, 3], -2)));
    }

    #[test]
    fn test_common_prefix() {
        let paths = [vec![0, 1, 2], vec![0, 1, 5, 1], vec![0, 1]];
        assert_eq!(common_prefix(paths.iter().map(Vec::as_slice)), vec![0, 1]);
        assert_eq!(common_prefix(std::iter::empty::<&[usize]>()), Vec::<usize>::new());
    }

    #[test]
    fn test_smallest_containing_range() {
        assert_eq!(
            smallest_containing_range(&[vec![0, 3, 1], vec![0, 1], vec![0, 2, 0]]).unwrap(),
            r(&[0, 1], 2)
        );
        // A path equal to the common prefix selects the ancestor itself.
        assert_eq!(
            smallest_containing_range(&[vec![0, 1], vec![0, 1, 0]]).unwrap(),
            r(&[0, 1], 0)
        );
        assert_eq!(
            smallest_containing_range(&[vec![2, 0]]).unwrap(),
            r(&[2, 0], 0)
        );
        assert_eq!(smallest_containing_range(&[]), Err(PathError::NoPaths));
    }

    #[test]
    fn test_path_is_in_range() {
        let range = r(&[0, 3], -2);
        assert!(path_is_in_range(&[0, 1], &range));
        assert!(path_is_in_range(&[0, 2, 7], &range));
        assert!(!path_is_in_range(&[0, 4], &range));
        assert!(!path_is_in_range(&[0], &range));
        assert!(!path_is_in_range(&[1, 2], &range));
        assert!(path_is_in_range(&[5, 5], &r(&[], 0)));
    }

    #[test]
    fn test_is_valid() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b")])]));
        let root = d.root_node();
        assert!(r(&[0, 0], 1).is_valid(&root));
        assert!(r(&[0, 1], -1).is_valid(&root));
        assert!(!r(&[0, 1], 1).is_valid(&root));
        assert!(!r(&[0, 0, 0], 0).is_valid(&root));
        assert!(r(&[], 0).is_valid(&root));
        assert!(!r(&[], 1).is_valid(&root));
    }

    #[test]
    fn test_path_less_than() {
        assert!(path_less_than(&[0], &[0, 0]));
        assert!(path_less_than(&[0, 5], &[1]));
        assert!(!path_less_than(&[1, 0], &[1, 0]));
        assert!(path_less_than(&[], &[0]));
    }

    #[test]
    fn test_unique_by_path() {
        let paths = vec![vec![1], vec![0, 2], vec![1], vec![0, 2], vec![3]];
        assert_eq!(unique_by_path(paths), vec![vec![1], vec![0, 2], vec![3]]);
    }
}

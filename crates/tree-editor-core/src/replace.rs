//! Multi-replace engine.
//!
//! Applies a batch of sibling-range replacements to a tree in one pass. Every replacement is
//! resolved against the same input tree, so the outcome does not depend on the order of the
//! batch unless two replacements genuinely claim the same node. That case is reported through
//! [`ReplaceOutcome::ambiguous_overlap`] rather than treated as an error: within each run of
//! contested indices the replacement listed first keeps the claim.

use std::sync::Arc;

use thiserror::Error;

use crate::node::{ListNode, Node};
use crate::path::{EvenPathRange, Path};

/// Replace the siblings selected by `range` with `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItemReplacement {
    /// Siblings to replace. Must not be the root.
    pub range: EvenPathRange,
    /// New children; may be empty.
    pub content: Vec<Node>,
    /// Struct keys for `content`, required iff the target list is a struct list.
    pub struct_keys: Option<Vec<&'static str>>,
}

impl ListItemReplacement {
    /// Replacement for a non-struct list.
    pub fn new(range: EvenPathRange, content: Vec<Node>) -> Self {
        Self {
            range,
            content,
            struct_keys: None,
        }
    }
}

/// Where the content of a replacement ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewContentRange {
    /// The inserted siblings.
    Range(EvenPathRange),
    /// Nothing was inserted; the gap sits before `index` inside the list at `parent`.
    EmptyPoint {
        /// Path of the list that lost children.
        parent: Path,
        /// Index the removed run started at.
        index: usize,
    },
}

/// Result of [`replace_multiple`].
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// New root. Shares every untouched subtree with the input.
    pub root: Arc<ListNode>,
    /// Per replacement: whether its content was spliced in.
    pub used: Vec<bool>,
    /// Some index was claimed by more than one replacement.
    pub ambiguous_overlap: bool,
    /// Per replacement: where its content landed (`None` when unused).
    pub new_ranges: Vec<Option<NewContentRange>>,
}

/// Invalid replacement batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    /// Replacement targets the root itself.
    #[error("replacement {0} targets the root")]
    RootTarget(usize),
    /// Replacement range does not resolve.
    #[error("replacement {0} has a range that does not resolve")]
    InvalidRange(usize),
    /// Struct key count differs from content length.
    #[error("replacement {index} has {keys} struct keys for {content} nodes")]
    StructKeyCount {
        /// Offending replacement.
        index: usize,
        /// Number of keys.
        keys: usize,
        /// Number of content nodes.
        content: usize,
    },
    /// Struct keys given for a plain list, or missing for a struct list.
    #[error("replacement {0} disagrees with its target list about struct keys")]
    StructKeyPresence(usize),
}

struct Target {
    parent: Path,
    first: usize,
    last: usize,
}

struct Walk<'a> {
    targets: Vec<Target>,
    replacements: &'a [ListItemReplacement],
    used: Vec<bool>,
    new_ranges: Vec<Option<NewContentRange>>,
    ambiguous_overlap: bool,
}

/// Apply every replacement to `root` in a single pass.
pub fn replace_multiple(
    root: &Arc<ListNode>,
    replacements: &[ListItemReplacement],
) -> Result<ReplaceOutcome, ReplaceError> {
    let root_node = Node::List(root.clone());
    let mut targets = Vec::with_capacity(replacements.len());
    for (index, replacement) in replacements.iter().enumerate() {
        let range = replacement.range.flip_forward();
        if range.anchor.is_empty() {
            return Err(ReplaceError::RootTarget(index));
        }
        if !range.is_valid(&root_node) {
            return Err(ReplaceError::InvalidRange(index));
        }
        if let Some(keys) = &replacement.struct_keys
            && keys.len() != replacement.content.len()
        {
            return Err(ReplaceError::StructKeyCount {
                index,
                keys: keys.len(),
                content: replacement.content.len(),
            });
        }
        let parent_has_keys = root_node
            .get_by_path(range.parent())
            .and_then(Node::as_list)
            .is_some_and(|list| list.struct_keys.is_some());
        if parent_has_keys != replacement.struct_keys.is_some() {
            return Err(ReplaceError::StructKeyPresence(index));
        }
        let (first, last) = range
            .index_span()
            .ok_or(ReplaceError::InvalidRange(index))?;
        targets.push(Target {
            parent: range.parent().to_vec(),
            first,
            last,
        });
    }

    let mut walk = Walk {
        targets,
        replacements,
        used: vec![false; replacements.len()],
        new_ranges: vec![None; replacements.len()],
        ambiguous_overlap: false,
    };
    let mut old_path = Vec::new();
    let new_root = walk.rebuild(root, &mut old_path, &[]);
    Ok(ReplaceOutcome {
        root: new_root,
        used: walk.used,
        ambiguous_overlap: walk.ambiguous_overlap,
        new_ranges: walk.new_ranges,
    })
}

impl Walk<'_> {
    fn rebuild(&mut self, list: &Arc<ListNode>, old_path: &mut Path, new_path: &[usize]) -> Arc<ListNode> {
        let here: Vec<usize> = (0..self.targets.len())
            .filter(|&i| self.targets[i].parent == *old_path)
            .collect();
        let below = self
            .targets
            .iter()
            .any(|t| t.parent.len() > old_path.len() && t.parent.starts_with(old_path));
        if here.is_empty() && !below {
            return list.clone();
        }

        let mut content = Vec::with_capacity(list.content.len());
        let mut keys = list.struct_keys.as_ref().map(|_| Vec::new());
        let mut chosen: Option<usize> = None;

        for (i, child) in list.content.iter().enumerate() {
            let claimants: Vec<usize> = here
                .iter()
                .copied()
                .filter(|&r| self.targets[r].first <= i && i <= self.targets[r].last)
                .collect();
            if claimants.len() > 1 {
                self.ambiguous_overlap = true;
            }
            if claimants.is_empty() {
                chosen = None;
                let new_child = match child {
                    Node::List(child_list) if below => {
                        old_path.push(i);
                        let mut child_new_path = new_path.to_vec();
                        child_new_path.push(content.len());
                        let rebuilt = self.rebuild(child_list, old_path, &child_new_path);
                        old_path.pop();
                        Node::List(rebuilt)
                    }
                    _ => child.clone(),
                };
                content.push(new_child);
                if let (Some(keys), Some(key)) = (&mut keys, list.struct_key(i)) {
                    keys.push(key);
                }
                continue;
            }

            let pick = match chosen {
                Some(current) if claimants.contains(&current) => current,
                _ => claimants[0],
            };
            if chosen != Some(pick) && !self.used[pick] {
                let replacement = &self.replacements[pick];
                let start = content.len();
                content.extend(replacement.content.iter().cloned());
                if let (Some(keys), Some(new_keys)) = (&mut keys, &replacement.struct_keys) {
                    keys.extend(new_keys.iter().copied());
                }
                self.used[pick] = true;
                self.new_ranges[pick] = Some(if replacement.content.is_empty() {
                    NewContentRange::EmptyPoint {
                        parent: new_path.to_vec(),
                        index: start,
                    }
                } else {
                    let mut anchor = new_path.to_vec();
                    anchor.push(start);
                    NewContentRange::Range(EvenPathRange::new(
                        anchor,
                        replacement.content.len() as isize - 1,
                    ))
                });
            }
            chosen = Some(pick);
        }

        Arc::new(list.with_content(content, keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;
    use crate::node::check_struct_keys;
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn texts(node: &Node) -> Vec<String> {
        let mut out = Vec::new();
        node.visit_deep(&mut |n, _| {
            if let Some(t) = n.as_token() {
                out.push(t.text.to_string());
            }
        });
        out
    }

    fn sample() -> Arc<ListNode> {
        // g(a, b, c) h(d)
        doc(file(vec![
            tight(vec![tok("g"), args(vec![tok("a"), tok("b"), tok("c")])]),
            tight(vec![tok("h"), args(vec![tok("d")])]),
        ]))
        .root
    }

    #[test]
    fn test_single_replacement_keeps_untouched_subtrees() {
        let root = sample();
        let outcome = replace_multiple(
            &root,
            &[ListItemReplacement::new(r(&[0, 1, 1], 0), vec![tok("x"), tok("y")])],
        )
        .unwrap();
        let new_root = Node::List(outcome.root.clone());
        assert_eq!(texts(&new_root), ["g", "a", "x", "y", "c", "h", "d"]);
        assert_eq!(outcome.used, vec![true]);
        assert!(!outcome.ambiguous_overlap);
        assert_eq!(
            outcome.new_ranges[0],
            Some(NewContentRange::Range(r(&[0, 1, 1], 1)))
        );
        assert_eq!(outcome.root.id, root.id);
        assert!(outcome.root.content[1].ptr_eq(&root.content[1]));
    }

    #[test]
    fn test_deletion_reports_empty_point() {
        let root = sample();
        let outcome =
            replace_multiple(&root, &[ListItemReplacement::new(r(&[0, 1, 2], -2), vec![])]).unwrap();
        assert_eq!(texts(&Node::List(outcome.root)), ["g", "h", "d"]);
        assert_eq!(
            outcome.new_ranges[0],
            Some(NewContentRange::EmptyPoint { parent: vec![0, 1], index: 0 })
        );
    }

    #[test]
    fn test_disjoint_replacements_are_order_independent() {
        let root = sample();
        let batch = vec![
            ListItemReplacement::new(r(&[0, 1, 0], 0), vec![tok("b2")]),
            ListItemReplacement::new(r(&[0, 1, 1], 0), vec![tok("a2")]),
            ListItemReplacement::new(r(&[1, 1, 0], 0), vec![]),
            ListItemReplacement::new(r(&[0, 0], 0), vec![tok("k")]),
        ];
        let expected = texts(&Node::List(replace_multiple(&root, &batch).unwrap().root));
        assert_eq!(expected, ["k", "b2", "a2", "c", "h"]);

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut shuffled = batch.clone();
            shuffled.shuffle(&mut rng);
            let outcome = replace_multiple(&root, &shuffled).unwrap();
            assert!(!outcome.ambiguous_overlap);
            assert!(outcome.used.iter().all(|u| *u));
            assert_eq!(texts(&Node::List(outcome.root)), expected);
        }
    }

    #[test]
    fn test_overlap_earlier_replacement_wins() {
        let root = sample();
        // [a, b] and [b, c] both claim `b`.
        let outcome = replace_multiple(
            &root,
            &[
                ListItemReplacement::new(r(&[0, 1, 0], 1), vec![tok("first")]),
                ListItemReplacement::new(r(&[0, 1, 1], 1), vec![tok("second")]),
            ],
        )
        .unwrap();
        assert!(outcome.ambiguous_overlap);
        assert_eq!(outcome.used, vec![true, true]);
        assert_eq!(texts(&Node::List(outcome.root)), ["g", "first", "second", "h", "d"]);

        // A range fully inside an earlier one loses completely.
        let outcome = replace_multiple(
            &root,
            &[
                ListItemReplacement::new(r(&[0, 1, 0], 2), vec![tok("all")]),
                ListItemReplacement::new(r(&[0, 1, 1], 0), vec![tok("inner")]),
            ],
        )
        .unwrap();
        assert!(outcome.ambiguous_overlap);
        assert_eq!(outcome.used, vec![true, false]);
        assert_eq!(outcome.new_ranges[1], None);
        assert_eq!(texts(&Node::List(outcome.root)), ["g", "all", "h", "d"]);
    }

    #[test]
    fn test_nested_replacement_is_unused() {
        let root = sample();
        let outcome = replace_multiple(
            &root,
            &[
                ListItemReplacement::new(r(&[0, 1, 0], 0), vec![tok("deep")]),
                ListItemReplacement::new(r(&[0, 1], 0), vec![tok("shallow")]),
            ],
        )
        .unwrap();
        assert!(!outcome.ambiguous_overlap);
        assert_eq!(outcome.used, vec![false, true]);
        assert_eq!(texts(&Node::List(outcome.root)), ["g", "shallow", "h", "d"]);
    }

    #[test]
    fn test_index_shift_is_reflected_in_new_ranges() {
        let root = sample();
        let outcome = replace_multiple(
            &root,
            &[
                ListItemReplacement::new(r(&[0], 0), vec![tok("p"), tok("q")]),
                ListItemReplacement::new(r(&[1, 1, 0], 0), vec![tok("e")]),
            ],
        )
        .unwrap();
        assert_eq!(
            outcome.new_ranges,
            vec![
                Some(NewContentRange::Range(r(&[0], 1))),
                Some(NewContentRange::Range(r(&[2, 1, 0], 0))),
            ]
        );
    }

    #[test]
    fn test_struct_keys() {
        let root = doc(file(vec![record(vec!["name", "value"], vec![tok("a"), tok("b")])])).root;
        let mut replacement = ListItemReplacement::new(r(&[0, 1], 0), vec![tok("c")]);
        assert_eq!(
            replace_multiple(&root, std::slice::from_ref(&replacement)).unwrap_err(),
            ReplaceError::StructKeyPresence(0)
        );
        replacement.struct_keys = Some(vec!["value", "extra"]);
        assert!(matches!(
            replace_multiple(&root, std::slice::from_ref(&replacement)),
            Err(ReplaceError::StructKeyCount { index: 0, keys: 2, content: 1 })
        ));
        replacement.struct_keys = Some(vec!["value"]);
        let outcome = replace_multiple(&root, &[replacement]).unwrap();
        let new_root = Node::List(outcome.root);
        assert!(check_struct_keys(&new_root).is_ok());
        assert_eq!(texts(&new_root), ["a", "c"]);
    }

    #[test]
    fn test_invalid_batches() {
        let root = sample();
        assert_eq!(
            replace_multiple(&root, &[ListItemReplacement::new(r(&[], 0), vec![])]).unwrap_err(),
            ReplaceError::RootTarget(0)
        );
        assert_eq!(
            replace_multiple(&root, &[ListItemReplacement::new(r(&[0, 1, 2], 1), vec![])])
                .unwrap_err(),
            ReplaceError::InvalidRange(0)
        );
    }
}

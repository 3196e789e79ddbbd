//! Range tracking across tree revisions.

use std::collections::{HashMap, HashSet};

use crate::node::{Node, NodeId};
use crate::path::{EvenPathRange, Path, smallest_containing_range};

/// Relocate ranges of `old_root` onto `new_root` by node identity.
///
/// For each range the identities of the selected nodes (and their descendants) are looked up
/// in the new tree; the result is the smallest range covering every surviving node, or `None`
/// if none survived.
pub fn track_ranges(
    old_root: &Node,
    new_root: &Node,
    old_ranges: &[EvenPathRange],
) -> Vec<Option<EvenPathRange>> {
    let mut new_paths: HashMap<NodeId, Path> = HashMap::new();
    new_root.visit_deep(&mut |node, path| {
        new_paths.insert(node.id(), path.to_vec());
    });

    old_ranges
        .iter()
        .map(|range| {
            let ids = ids_in_range(old_root, range)?;
            let paths: Vec<Path> = ids
                .iter()
                .filter_map(|id| new_paths.get(id).cloned())
                .collect();
            smallest_containing_range(&paths).ok()
        })
        .collect()
}

fn ids_in_range(root: &Node, range: &EvenPathRange) -> Option<HashSet<NodeId>> {
    let mut ids = HashSet::new();
    let forward = range.flip_forward();
    let Some((first, last)) = forward.index_span() else {
        root.collect_ids(&mut ids);
        return Some(ids);
    };
    let parent = root.get_by_path(forward.parent())?;
    for child in parent.content().get(first..=last)? {
        child.collect_ids(&mut ids);
    }
    Some(ids)
}

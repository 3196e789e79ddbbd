//! Old-path to new-path bookkeeping for tree rewrites.

use crate::path::{EvenPathRange, Path, UnevenPathRange};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    old: Path,
    new: Path,
    removed: bool,
}

/// Records where nodes moved during a rewrite and maps stale paths onto the new tree.
///
/// Mapping is rough: a path is translated through the record with the longest matching
/// prefix, and whatever follows the prefix is carried over unchanged. Paths below a removed
/// node map to the node's former parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapper {
    records: Vec<Record>,
}

impl PathMapper {
    /// Empty mapper; maps every path to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the node at `old` now lives at `new`.
    pub fn record(&mut self, old: Path, new: Path) {
        self.records.push(Record {
            old,
            new,
            removed: false,
        });
    }

    /// Record that the node at `old` was removed from the list now at `parent`.
    pub fn record_removed(&mut self, old: Path, parent: Path) {
        self.records.push(Record {
            old,
            new: parent,
            removed: true,
        });
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Translate `path` through the longest recorded prefix.
    pub fn map_rough(&self, path: &[usize]) -> Path {
        let best = self
            .records
            .iter()
            .filter(|r| path.starts_with(&r.old))
            .max_by_key(|r| r.old.len());
        match best {
            Some(r) if r.removed => r.new.clone(),
            Some(r) => {
                let mut mapped = r.new.clone();
                mapped.extend_from_slice(&path[r.old.len()..]);
                mapped
            }
            None => path.to_vec(),
        }
    }

    /// Translate both ends of a range and re-even it.
    pub fn map_range(&self, range: &EvenPathRange) -> EvenPathRange {
        match range.as_uneven() {
            Ok(uneven) => UnevenPathRange {
                anchor: self.map_rough(&uneven.anchor),
                tip: self.map_rough(&uneven.tip),
            }
            .as_even(),
            Err(_) => EvenPathRange::at(self.map_rough(&range.anchor)),
        }
    }
}

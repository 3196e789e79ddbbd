//! Structural search across cursors.

use tracing::{debug, warn};

use crate::error::Warning;
use crate::focus::{is_focus_on_empty_list_content, normalize_in};
use crate::node::Doc;
use crate::path::EvenPathRange;
use crate::search::{SearchQuery, Searcher};

use super::{Cursor, CursorId, Outcome, fresh_group_id};

/// Replace every cursor with one cursor per match inside its selection.
///
/// Cursors split off the same cursor share a new lineage entry, which
/// [`reduce_across`](super::reduce_across) uses to regroup them. With `strict`, a cursor
/// without matches rejects the whole search; otherwise it just disappears. A search without
/// any match is always rejected.
pub fn search(
    doc: &Doc,
    cursors: &[Cursor],
    query: &SearchQuery,
    shallow: bool,
    strict: bool,
) -> Outcome<Vec<Cursor>> {
    let mut searcher = match Searcher::new(doc, query) {
        Ok(searcher) => searcher,
        Err(err) => return Outcome::Rejected(err.into()),
    };
    let root = doc.root_node();

    let mut found = Vec::new();
    let mut missed = 0;
    for cursor in cursors {
        let matches = if is_focus_on_empty_list_content(&root, &cursor.focus) {
            Vec::new()
        } else {
            searcher.find_in(&cursor.focus, shallow)
        };
        if matches.is_empty() {
            missed += 1;
            continue;
        }
        debug!(focus = ?cursor.focus, matches = matches.len(), "search matches");
        let group = fresh_group_id();
        for path in matches {
            let mut parent_path = cursor.parent_path.clone();
            parent_path.push(group);
            found.push(Cursor {
                id: CursorId::fresh(),
                focus: normalize_in(&root, &EvenPathRange::at(path)),
                marks: cursor.marks.clone(),
                clipboard: cursor.clipboard.clone(),
                enable_reduce_to_tip: false,
                parent_path,
            });
        }
    }

    if found.is_empty() {
        warn!("no search matches within any cursor");
        return Outcome::Rejected(Warning::NoSearchMatches);
    }
    if strict && missed > 0 {
        warn!(missed, "some cursors had no search matches");
        return Outcome::Rejected(Warning::PartialSearchMatches(missed));
    }
    Outcome::Done(found)
}

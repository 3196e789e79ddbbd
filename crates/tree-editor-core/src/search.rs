//! Structural search.
//!
//! A query is matched against nodes rather than text:
//!
//! - [`SearchQuery::Exact`]: subtrees structurally equal to a given node (kinds, token text,
//!   delimiters and shape; identities and ranges are ignored)
//! - [`SearchQuery::Kind`]: every node of a syntax kind
//! - [`SearchQuery::Text`]: tokens whose text matches a plain or regex pattern
//!
//! Deep searches do not descend into a node that already matched, so matches never nest.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::focus::{equivalent_focuses, normalize_in};
use crate::node::{Doc, Node, NodeId, SyntaxKind};
use crate::path::{EvenPathRange, Path, unique_by_path};

/// Options that control how text queries are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// What to look for.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Subtrees structurally equal to this node.
    Exact(Node),
    /// Nodes of this kind.
    Kind(SyntaxKind),
    /// Tokens whose text contains a match of `query`.
    Text {
        /// Pattern; escaped unless `options.regex` is set.
        query: String,
        /// Matching options.
        options: SearchOptions,
    },
}

/// Search errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
    /// Text queries must not be empty.
    #[error("empty search query")]
    EmptyQuery,
}

fn compile_search_regex(query: &str, options: SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()?)
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    if start >= end {
        return false;
    }
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

enum Matcher {
    Exact { node: Node, fingerprint: u64 },
    Kind(SyntaxKind),
    Text { regex: Regex, whole_word: bool },
}

/// A compiled query bound to one document revision.
///
/// Exact queries hash every visited subtree once; the hashes are cached by [`NodeId`] for the
/// lifetime of the searcher, which must not outlive the revision it was built for.
pub struct Searcher<'d> {
    doc: &'d Doc,
    matcher: Matcher,
    fingerprints: HashMap<NodeId, u64>,
}

impl<'d> Searcher<'d> {
    /// Compile `query` for searching `doc`.
    pub fn new(doc: &'d Doc, query: &SearchQuery) -> Result<Self, SearchError> {
        let matcher = match query {
            SearchQuery::Exact(node) => {
                // The query node lives outside the document; keep its hashes out of the cache.
                let mut scratch = HashMap::new();
                let fingerprint = fingerprint(node, &mut scratch);
                Matcher::Exact {
                    node: node.clone(),
                    fingerprint,
                }
            }
            SearchQuery::Kind(kind) => Matcher::Kind(*kind),
            SearchQuery::Text { query, options } => {
                if query.is_empty() {
                    return Err(SearchError::EmptyQuery);
                }
                Matcher::Text {
                    regex: compile_search_regex(query, *options)?,
                    whole_word: options.whole_word,
                }
            }
        };
        Ok(Self {
            doc,
            matcher,
            fingerprints: HashMap::new(),
        })
    }

    /// Whether `node` matches the query.
    pub fn matches(&mut self, node: &Node) -> bool {
        match &self.matcher {
            Matcher::Kind(kind) => node.kind() == *kind,
            Matcher::Text { regex, whole_word } => {
                let Some(token) = node.as_token() else {
                    return false;
                };
                regex.find_iter(&token.text).any(|m| {
                    !m.is_empty() && (!whole_word || is_whole_word(&token.text, m.start(), m.end()))
                })
            }
            Matcher::Exact {
                node: query,
                fingerprint: expected,
            } => fingerprint(node, &mut self.fingerprints) == *expected && node.structurally_equal(query),
        }
    }

    /// Paths of the matches inside `focus`, in document order.
    ///
    /// A shallow search only considers the nodes `focus` selects (in any of its equivalent
    /// forms); a deep search also considers every descendant.
    pub fn find_in(&mut self, focus: &EvenPathRange, shallow: bool) -> Vec<Path> {
        let root = self.doc.root_node();
        if shallow {
            let mut found = Vec::new();
            for equivalent in equivalent_focuses(&root, focus) {
                for (path, node) in selected(&root, &equivalent) {
                    if self.matches(&node) {
                        found.push(path);
                    }
                }
            }
            return unique_by_path(found);
        }

        let mut found = Vec::new();
        let focus = normalize_in(&root, focus);
        for (mut path, node) in selected(&root, &focus) {
            self.collect_deep(&node, &mut path, &mut found);
        }
        found
    }

    fn collect_deep(&mut self, node: &Node, path: &mut Path, found: &mut Vec<Path>) {
        if self.matches(node) {
            found.push(path.clone());
            return;
        }
        for (i, child) in node.content().iter().enumerate() {
            path.push(i);
            self.collect_deep(child, path, found);
            path.pop();
        }
    }
}

fn selected(root: &Node, focus: &EvenPathRange) -> Vec<(Path, Node)> {
    let Some((first, last)) = focus.index_span() else {
        return vec![(Vec::new(), root.clone())];
    };
    let parent = focus.parent();
    let Some(list) = root.get_by_path(parent) else {
        return Vec::new();
    };
    list.content()
        .iter()
        .enumerate()
        .skip(first)
        .take(last + 1 - first)
        .map(|(i, child)| {
            let mut path = parent.to_vec();
            path.push(i);
            (path, child.clone())
        })
        .collect()
}

fn fingerprint(node: &Node, cache: &mut HashMap<NodeId, u64>) -> u64 {
    if let Some(&hash) = cache.get(&node.id()) {
        return hash;
    }
    let mut hasher = DefaultHasher::new();
    match node {
        Node::Token(token) => {
            0u8.hash(&mut hasher);
            token.kind.hash(&mut hasher);
            token.text.hash(&mut hasher);
        }
        Node::List(list) => {
            1u8.hash(&mut hasher);
            list.kind.hash(&mut hasher);
            list.delimiters.hash(&mut hasher);
            list.equivalent_to_content.hash(&mut hasher);
            list.struct_keys.hash(&mut hasher);
            for child in &list.content {
                fingerprint(child, cache).hash(&mut hasher);
            }
        }
    }
    let hash = hasher.finish();
    cache.insert(node.id(), hash);
    hash
}

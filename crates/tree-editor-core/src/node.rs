//! Document model.
//!
//! A document is a persistent tree of [`Node`]s: tokens are leaves, lists hold ordered children.
//! Nodes are shared through [`Arc`], so cloning a subtree is O(1) and an edit only rebuilds the
//! chain of ancestors above the changed node. Every node carries a [`NodeId`] that survives
//! rebuilds of its ancestors and reparses of unchanged text; identity (not structural equality)
//! is what relocates marks and cursors across revisions.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::EngineError;
use crate::path::Path;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, stable identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates an identity that has never been handed out before.
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (useful for logging).
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Grammar-defined tag of a token or list.
///
/// The engine never interprets kinds; it only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxKind(pub u16);

/// Half-open byte range `[pos, end)` into [`Doc::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TextRange {
    /// Inclusive start byte offset.
    pub pos: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl TextRange {
    /// Create a new range.
    pub fn new(pos: usize, end: usize) -> Self {
        Self { pos, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    /// Returns `true` for zero-length ranges.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    /// Returns `true` if `other` lies completely inside `self`.
    pub fn contains_range(&self, other: TextRange) -> bool {
        self.pos <= other.pos && other.end <= self.end
    }
}

/// Leaf node.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenNode {
    /// Stable identity.
    pub id: NodeId,
    /// Grammar tag (identifier, number, operator, ...).
    pub kind: SyntaxKind,
    /// Rendered text of the token; enough for the grammar to reprint it.
    pub text: Arc<str>,
    /// Position in the document text.
    pub range: TextRange,
    /// Synthetic node that only exists to keep the tree printable.
    pub is_placeholder: bool,
}

impl TokenNode {
    /// Create a token with a fresh identity and an empty range.
    pub fn new(kind: SyntaxKind, text: impl Into<Arc<str>>) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            text: text.into(),
            range: TextRange::default(),
            is_placeholder: false,
        }
    }

    /// Builder: set the text range.
    pub fn with_range(mut self, range: TextRange) -> Self {
        self.range = range;
        self
    }

    /// Builder: flag the token as a placeholder.
    pub fn placeholder(mut self) -> Self {
        self.is_placeholder = true;
        self
    }
}

/// Interior node: an ordered sequence of children.
#[derive(Debug, Clone, PartialEq)]
pub struct ListNode {
    /// Stable identity.
    pub id: NodeId,
    /// Grammar tag.
    pub kind: SyntaxKind,
    /// Opening and closing delimiter text (both may be empty).
    pub delimiters: (&'static str, &'static str),
    /// Children in document order.
    pub content: Vec<Node>,
    /// Field names of a fixed-shape record, one per child.
    pub struct_keys: Option<Vec<&'static str>>,
    /// Transparent list: renders as its children with no delimiters of its own.
    pub equivalent_to_content: bool,
    /// Position in the document text, delimiters included.
    pub range: TextRange,
    /// Synthetic node that only exists to keep the tree printable.
    pub is_placeholder: bool,
}

impl ListNode {
    /// Create a list with a fresh identity.
    pub fn new(
        kind: SyntaxKind,
        delimiters: (&'static str, &'static str),
        content: Vec<Node>,
    ) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            delimiters,
            content,
            struct_keys: None,
            equivalent_to_content: false,
            range: TextRange::default(),
            is_placeholder: false,
        }
    }

    /// Builder: mark as transparent.
    pub fn transparent(mut self) -> Self {
        self.equivalent_to_content = true;
        self
    }

    /// Builder: attach struct keys.
    pub fn with_struct_keys(mut self, keys: Vec<&'static str>) -> Self {
        self.struct_keys = Some(keys);
        self
    }

    /// Builder: set the text range.
    pub fn with_range(mut self, range: TextRange) -> Self {
        self.range = range;
        self
    }

    /// Builder: flag the list as a placeholder.
    pub fn placeholder(mut self) -> Self {
        self.is_placeholder = true;
        self
    }

    /// Same list (same identity) with different children.
    pub fn with_content(
        &self,
        content: Vec<Node>,
        struct_keys: Option<Vec<&'static str>>,
    ) -> ListNode {
        ListNode {
            content,
            struct_keys,
            ..self.clone_shallow()
        }
    }

    fn clone_shallow(&self) -> ListNode {
        ListNode {
            id: self.id,
            kind: self.kind,
            delimiters: self.delimiters,
            content: Vec::new(),
            struct_keys: None,
            equivalent_to_content: self.equivalent_to_content,
            range: self.range,
            is_placeholder: self.is_placeholder,
        }
    }

    /// Struct key of the child at `index`, if this is a struct list.
    pub fn struct_key(&self, index: usize) -> Option<&'static str> {
        self.struct_keys.as_ref()?.get(index).copied()
    }

    /// Child with the given struct key.
    pub fn struct_field(&self, key: &str) -> Option<&Node> {
        let index = self.struct_keys.as_ref()?.iter().position(|k| *k == key)?;
        self.content.get(index)
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf.
    Token(Arc<TokenNode>),
    /// Interior node.
    List(Arc<ListNode>),
}

impl From<TokenNode> for Node {
    fn from(token: TokenNode) -> Self {
        Node::Token(Arc::new(token))
    }
}

impl From<ListNode> for Node {
    fn from(list: ListNode) -> Self {
        Node::List(Arc::new(list))
    }
}

impl Node {
    /// Identity of the node.
    pub fn id(&self) -> NodeId {
        match self {
            Node::Token(t) => t.id,
            Node::List(l) => l.id,
        }
    }

    /// Grammar tag of the node.
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Node::Token(t) => t.kind,
            Node::List(l) => l.kind,
        }
    }

    /// Text range of the node.
    pub fn range(&self) -> TextRange {
        match self {
            Node::Token(t) => t.range,
            Node::List(l) => l.range,
        }
    }

    /// Returns `true` for placeholder nodes.
    pub fn is_placeholder(&self) -> bool {
        match self {
            Node::Token(t) => t.is_placeholder,
            Node::List(l) => l.is_placeholder,
        }
    }

    /// The list payload, if this is a list.
    pub fn as_list(&self) -> Option<&Arc<ListNode>> {
        match self {
            Node::List(l) => Some(l),
            Node::Token(_) => None,
        }
    }

    /// The token payload, if this is a token.
    pub fn as_token(&self) -> Option<&Arc<TokenNode>> {
        match self {
            Node::Token(t) => Some(t),
            Node::List(_) => None,
        }
    }

    /// Children of a list; empty for tokens.
    pub fn content(&self) -> &[Node] {
        match self {
            Node::List(l) => &l.content,
            Node::Token(_) => &[],
        }
    }

    /// Returns `true` for transparent lists.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Node::List(l) if l.equivalent_to_content)
    }

    /// Same node with identity and placeholder flag replaced.
    pub fn with_identity(&self, id: NodeId, is_placeholder: bool) -> Node {
        match self {
            Node::Token(t) => Node::Token(Arc::new(TokenNode {
                id,
                is_placeholder,
                ..(**t).clone()
            })),
            Node::List(l) => Node::List(Arc::new(ListNode {
                id,
                is_placeholder,
                ..(**l).clone()
            })),
        }
    }

    /// Same node, flagged as a placeholder.
    pub fn into_placeholder(self) -> Node {
        if self.is_placeholder() {
            return self;
        }
        let id = self.id();
        self.with_identity(id, true)
    }

    /// Deep copy with a fresh identity on every node.
    pub fn with_fresh_ids(&self) -> Node {
        match self {
            Node::Token(t) => Node::Token(Arc::new(TokenNode {
                id: NodeId::fresh(),
                ..(**t).clone()
            })),
            Node::List(l) => {
                let content = l.content.iter().map(Node::with_fresh_ids).collect();
                Node::List(Arc::new(ListNode {
                    id: NodeId::fresh(),
                    ..l.with_content(content, l.struct_keys.clone())
                }))
            }
        }
    }

    /// Node at `path`, if it resolves.
    pub fn get_by_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.content().get(index)?;
        }
        Some(node)
    }

    /// Deepest node along `path`, together with the prefix of `path` that resolved.
    pub fn try_get_deepest_by_path(&self, path: &[usize]) -> (Path, &Node) {
        let mut node = self;
        let mut resolved = Vec::with_capacity(path.len());
        for &index in path {
            match node.content().get(index) {
                Some(child) => {
                    node = child;
                    resolved.push(index);
                }
                None => break,
            }
        }
        (resolved, node)
    }

    /// Rebuild the ancestor chain of `path` with `replacement` at the end of it.
    pub fn set_by_path(&self, path: &[usize], replacement: Node) -> Option<Node> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(replacement);
        };
        let list = self.as_list()?;
        let child = list.content.get(first)?;
        let new_child = child.set_by_path(rest, replacement)?;
        let mut content = list.content.clone();
        content[first] = new_child;
        Some(Node::List(Arc::new(
            list.with_content(content, list.struct_keys.clone()),
        )))
    }

    /// Pre-order visit of every node together with its path.
    pub fn visit_deep(&self, visit: &mut impl FnMut(&Node, &[usize])) {
        let mut path = Vec::new();
        self.visit_deep_at(&mut path, visit);
    }

    fn visit_deep_at(&self, path: &mut Path, visit: &mut impl FnMut(&Node, &[usize])) {
        visit(self, path);
        for (i, child) in self.content().iter().enumerate() {
            path.push(i);
            child.visit_deep_at(path, visit);
            path.pop();
        }
    }

    /// Bottom-up rebuild: children are mapped first, then `map` sees the rebuilt node.
    pub fn map_deep(&self, map: &mut impl FnMut(Node, &[usize]) -> Node) -> Node {
        let mut path = Vec::new();
        self.map_deep_at(&mut path, map)
    }

    fn map_deep_at(&self, path: &mut Path, map: &mut impl FnMut(Node, &[usize]) -> Node) -> Node {
        let rebuilt = match self {
            Node::Token(_) => self.clone(),
            Node::List(list) => {
                let mut changed = false;
                let mut content = Vec::with_capacity(list.content.len());
                for (i, child) in list.content.iter().enumerate() {
                    path.push(i);
                    let new_child = child.map_deep_at(path, map);
                    path.pop();
                    changed |= !new_child.ptr_eq(child);
                    content.push(new_child);
                }
                if changed {
                    Node::List(Arc::new(
                        list.with_content(content, list.struct_keys.clone()),
                    ))
                } else {
                    self.clone()
                }
            }
        };
        map(rebuilt, path)
    }

    /// Returns `true` if both values share the same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Token(a), Node::Token(b)) => Arc::ptr_eq(a, b),
            (Node::List(a), Node::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Structural equality: kinds, token text, delimiters, struct keys and shape.
    ///
    /// Identities, ranges and placeholder flags are ignored.
    pub fn structurally_equal(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Token(a), Node::Token(b)) => a.kind == b.kind && a.text == b.text,
            (Node::List(a), Node::List(b)) => {
                a.kind == b.kind
                    && a.delimiters == b.delimiters
                    && a.equivalent_to_content == b.equivalent_to_content
                    && a.struct_keys == b.struct_keys
                    && a.content.len() == b.content.len()
                    && a
                        .content
                        .iter()
                        .zip(&b.content)
                        .all(|(x, y)| x.structurally_equal(y))
            }
            _ => false,
        }
    }

    /// Identities of this node and every descendant.
    pub fn collect_ids(&self, ids: &mut HashSet<NodeId>) {
        self.visit_deep(&mut |node, _| {
            ids.insert(node.id());
        });
    }
}

/// Verify that every struct list has exactly one unique key per child.
pub fn check_struct_keys(root: &Node) -> Result<(), EngineError> {
    let mut result = Ok(());
    root.visit_deep(&mut |node, path| {
        if result.is_err() {
            return;
        }
        let Some(list) = node.as_list() else { return };
        let Some(keys) = &list.struct_keys else { return };
        if keys.len() != list.content.len() {
            result = Err(EngineError::StructKeyCount {
                path: path.to_vec(),
                keys: keys.len(),
                content: list.content.len(),
            });
            return;
        }
        let mut seen = HashSet::new();
        for key in keys {
            if !seen.insert(*key) {
                result = Err(EngineError::DuplicateStructKey {
                    path: path.to_vec(),
                    key: *key,
                });
                return;
            }
        }
    });
    result
}

/// A document revision: the tree and the text it renders to.
#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    /// Root list.
    pub root: Arc<ListNode>,
    /// Rendered text; every node range indexes into it.
    pub text: String,
}

impl Doc {
    /// Create a document from a root list and its text.
    pub fn new(root: Arc<ListNode>, text: impl Into<String>) -> Self {
        Self {
            root,
            text: text.into(),
        }
    }

    /// Empty document: a transparent root of `kind` with no children and no text.
    pub fn empty(kind: SyntaxKind) -> Self {
        Self::new(Arc::new(ListNode::new(kind, ("", ""), Vec::new()).transparent()), "")
    }

    /// Create a document from an arbitrary root node, which must be a list.
    pub fn from_node(root: Node, text: impl Into<String>) -> Result<Self, EngineError> {
        match root {
            Node::List(list) => Ok(Self::new(list, text)),
            Node::Token(_) => Err(EngineError::RootNotList),
        }
    }

    /// Root as a [`Node`].
    pub fn root_node(&self) -> Node {
        Node::List(self.root.clone())
    }

    /// Text rendered by `node`.
    pub fn slice(&self, range: TextRange) -> &str {
        self.text.get(range.pos..range.end).unwrap_or("")
    }
}

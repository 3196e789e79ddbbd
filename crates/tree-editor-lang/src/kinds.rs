//! Syntax kinds of the mini-JS tree.

use tree_editor_core::{Node, SyntaxKind};

/// Identifier, including `this`.
pub const IDENT: SyntaxKind = SyntaxKind(1);
/// Number literal.
pub const NUMBER: SyntaxKind = SyntaxKind(2);
/// String literal, quotes included.
pub const STRING: SyntaxKind = SyntaxKind(3);
/// Binary operator, `=` included.
pub const OPERATOR: SyntaxKind = SyntaxKind(4);
/// `let`, `const` or `var`.
pub const KEYWORD: SyntaxKind = SyntaxKind(5);
/// Property access `.name`, dot included.
pub const MEMBER: SyntaxKind = SyntaxKind(6);

/// Statements. Transparent root.
pub const FILE: SyntaxKind = SyntaxKind(100);
/// Flat binary chain `a + b * c`. Transparent.
pub const LOOSE: SyntaxKind = SyntaxKind(101);
/// Postfix chain `f(x).y`. Transparent.
pub const TIGHT: SyntaxKind = SyntaxKind(102);
/// Call arguments `( ... )`.
pub const ARGUMENTS: SyntaxKind = SyntaxKind(103);
/// Parenthesized expression `( ... )`.
pub const PARENTHESIZED: SyntaxKind = SyntaxKind(104);
/// Array literal `[ ... ]`.
pub const ARRAY: SyntaxKind = SyntaxKind(105);
/// Object literal `{ ... }`.
pub const OBJECT: SyntaxKind = SyntaxKind(106);
/// `name: value` record inside an object.
pub const PROPERTY: SyntaxKind = SyntaxKind(107);
/// `let a = 1, b` statement.
pub const DECLARATION: SyntaxKind = SyntaxKind(108);
/// `name = initializer` record inside a declaration.
pub const DECLARATOR: SyntaxKind = SyntaxKind(109);

/// Struct keys of [`PROPERTY`] and [`DECLARATOR`] records.
pub const NAME_KEY: &str = "name";
/// Value of a [`PROPERTY`].
pub const VALUE_KEY: &str = "value";
/// Initializer of a [`DECLARATOR`].
pub const INITIALIZER_KEY: &str = "initializer";

/// Anything that can stand where a value is expected.
pub fn is_expression(node: &Node) -> bool {
    matches!(
        node.kind(),
        IDENT | NUMBER | STRING | LOOSE | TIGHT | PARENTHESIZED | ARRAY | OBJECT
    )
}

/// Anything that can start a postfix chain without parentheses.
pub fn is_chain_head(node: &Node) -> bool {
    matches!(
        node.kind(),
        IDENT | NUMBER | STRING | PARENTHESIZED | ARRAY | OBJECT
    )
}

/// Property access or call arguments.
pub fn is_chain_link(node: &Node) -> bool {
    matches!(node.kind(), MEMBER | ARGUMENTS)
}

/// Expression or declaration.
pub fn is_statement(node: &Node) -> bool {
    is_expression(node) || node.kind() == DECLARATION
}

/// Binary operator token.
pub fn is_operator(node: &Node) -> bool {
    node.kind() == OPERATOR
}

/// Declaration keyword token.
pub fn is_keyword(node: &Node) -> bool {
    node.kind() == KEYWORD
}

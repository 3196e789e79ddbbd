//! Canonical printer.
//!
//! Layout is fixed: one statement per line, single spaces around binary operators and after
//! commas. Printing ignores the ranges stored in the tree.

use tree_editor_core::{ListNode, Node};

use crate::kinds::*;

/// Print a whole tree.
pub fn print(root: &ListNode) -> String {
    let mut out = String::new();
    print_list(root, &mut out);
    out
}

fn print_node(node: &Node, out: &mut String) {
    match node {
        Node::Token(token) => out.push_str(&token.text),
        Node::List(list) => print_list(list, out),
    }
}

fn print_list(list: &ListNode, out: &mut String) {
    match list.kind {
        FILE => join(&list.content, "\n", out),
        LOOSE => join(&list.content, " ", out),
        TIGHT => join(&list.content, "", out),
        OBJECT if list.content.is_empty() => out.push_str("{}"),
        OBJECT => {
            out.push_str("{ ");
            join(&list.content, ", ", out);
            out.push_str(" }");
        }
        PROPERTY => join(&list.content, ": ", out),
        DECLARATOR => join(&list.content, " = ", out),
        DECLARATION => {
            if let Some((keyword, declarators)) = list.content.split_first() {
                print_node(keyword, out);
                out.push(' ');
                join(declarators, ", ", out);
            }
        }
        _ => {
            out.push_str(list.delimiters.0);
            join(&list.content, ", ", out);
            out.push_str(list.delimiters.1);
        }
    }
}

fn join(nodes: &[Node], separator: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        print_node(node, out);
    }
}

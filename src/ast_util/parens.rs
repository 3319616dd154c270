//! Parenthesis boundary checks over the token sequence.
//!
//! Both checks verify the surrounding tokens by value AND by position, so a
//! sibling's adjacent parenthesis (as in `(a) + (b)`) never counts as an
//! enclosing pair.

use crate::ast::{NodeId, SyntaxTree, Token};

/// Whether the node is wrapped in exactly bracketing `(` and `)` tokens.
pub fn is_parenthesised(tree: &SyntaxTree, id: NodeId) -> bool {
    brackets(tree, id, 0)
}

/// Whether the node is wrapped in two full nested parenthesis layers.
pub fn is_parenthesised_twice(tree: &SyntaxTree, id: NodeId) -> bool {
    is_parenthesised(tree, id) && brackets(tree, id, 1)
}

fn brackets(tree: &SyntaxTree, id: NodeId, skip: usize) -> bool {
    let span = tree.get(id).span;

    let encloses = |before: &Token, after: &Token| {
        before.value == "("
            && before.span.end <= span.start
            && after.value == ")"
            && after.span.start >= span.end
    };

    match (tree.token_before(id, skip), tree.token_after(id, skip)) {
        (Some(before), Some(after)) => encloses(before, after),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser;

    fn identifier(tree: &crate::ast::SyntaxTree, name: &str) -> NodeId {
        let mut found = None;
        tree.visit(&mut |id| {
            if matches!(&tree.get(id).kind, NodeKind::Identifier { name: n } if n == name) {
                found = Some(id);
            }
        });
        found.unwrap()
    }

    #[test]
    fn detects_single_and_double_wrapping() {
        let tree = parser::parse("((a)); (b); c;").unwrap();

        let a = identifier(&tree, "a");
        let b = identifier(&tree, "b");
        let c = identifier(&tree, "c");

        assert!(is_parenthesised(&tree, a));
        assert!(is_parenthesised_twice(&tree, a));
        assert!(is_parenthesised(&tree, b));
        assert!(!is_parenthesised_twice(&tree, b));
        assert!(!is_parenthesised(&tree, c));
    }

    #[test]
    fn sibling_parens_are_not_an_enclosing_pair() {
        // The binary expression sits between `)` and `(`, but neither
        // brackets its full range.
        let tree = parser::parse("x = (a) + (b);").unwrap();

        let mut binary = None;
        tree.visit(&mut |id| {
            if matches!(tree.get(id).kind, NodeKind::BinaryExpression { .. }) {
                binary = Some(id);
            }
        });

        assert!(!is_parenthesised(&tree, binary.unwrap()));
    }

    #[test]
    fn call_parens_count_as_a_wrapping_layer() {
        let tree = parser::parse("f((a)); g(b);").unwrap();

        let a = identifier(&tree, "a");
        let b = identifier(&tree, "b");

        assert!(is_parenthesised_twice(&tree, a));
        assert!(is_parenthesised(&tree, b));
        assert!(!is_parenthesised_twice(&tree, b));
    }

    #[test]
    fn twice_implies_once_for_every_node() {
        let tree =
            parser::parse("if (((x))) { f((y), ((z))); } a = ((b + c)) * d;").unwrap();

        tree.visit(&mut |id| {
            if is_parenthesised_twice(&tree, id) {
                assert!(is_parenthesised(&tree, id));
            }
        });
    }
}

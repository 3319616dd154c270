//! Resolves whether a node contributes the first token of an expression
//! statement.
//!
//! A function or class expression in that position needs one parenthesis pair
//! to avoid being read as a declaration, so that pair is never redundant.

use super::parens::is_parenthesised;
use crate::ast::{NodeId, NodeKind, SyntaxTree};

/// Walks parent links while the node stays in leftmost evaluated position.
/// Reaching an expression statement means the node's first token is the
/// statement's first token; any other shape, or an intervening parenthesis,
/// ends the walk with `false`.
pub fn is_head_of_expression_statement(tree: &SyntaxTree, id: NodeId) -> bool {
    let mut current = id;

    loop {
        let Some(parent) = tree.parent(current) else {
            // Expressions always hang off a statement; a missing chain means
            // the host handed over a tree without wiring parents.
            panic!("expression is not rooted in a statement");
        };

        match &tree.get(parent).kind {
            NodeKind::SequenceExpression { expressions } => {
                if expressions[0] != current || is_parenthesised(tree, current) {
                    return false;
                }
            }

            // A prefix operator owns the statement's first token instead.
            NodeKind::UnaryExpression { .. } => return false,

            NodeKind::UpdateExpression { prefix, .. } => {
                if *prefix || is_parenthesised(tree, current) {
                    return false;
                }
            }

            NodeKind::BinaryExpression { left, .. }
            | NodeKind::LogicalExpression { left, .. } => {
                if *left != current || is_parenthesised(tree, current) {
                    return false;
                }
            }

            NodeKind::ConditionalExpression { test, .. } => {
                if *test != current || is_parenthesised(tree, current) {
                    return false;
                }
            }

            NodeKind::CallExpression { callee, .. } => {
                if *callee != current || is_parenthesised(tree, current) {
                    return false;
                }
            }

            NodeKind::MemberExpression { object, .. } => {
                if *object != current || is_parenthesised(tree, current) {
                    return false;
                }
            }

            NodeKind::ExpressionStatement { .. } => return true,

            _ => return false,
        }

        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn function_parent(tree: &crate::ast::SyntaxTree) -> NodeId {
        let mut found = None;
        tree.visit(&mut |id| {
            if matches!(
                tree.get(id).kind,
                NodeKind::FunctionExpression { .. } | NodeKind::ClassExpression { .. }
            ) {
                found = tree.parent(id);
            }
        });
        found.unwrap()
    }

    #[test]
    fn member_object_at_statement_start_is_head() {
        let tree = parser::parse("(function() {}).call(this);").unwrap();

        assert!(is_head_of_expression_statement(
            &tree,
            function_parent(&tree)
        ));
    }

    #[test]
    fn assignment_target_position_is_not_head() {
        let tree = parser::parse("x = (function() {}).name;").unwrap();

        assert!(!is_head_of_expression_statement(
            &tree,
            function_parent(&tree)
        ));
    }

    #[test]
    fn walks_through_calls_and_binary_left_operands() {
        let tree = parser::parse("(function() {})().x + y;").unwrap();

        // Parent of the function expression is the IIFE call.
        assert!(is_head_of_expression_statement(
            &tree,
            function_parent(&tree)
        ));
    }

    #[test]
    fn right_operand_is_not_head() {
        let tree = parser::parse("a + (class {}).name;").unwrap();

        assert!(!is_head_of_expression_statement(
            &tree,
            function_parent(&tree)
        ));
    }
}

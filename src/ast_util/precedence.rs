//! Operator precedence, higher binds tighter.

use crate::ast::{BinaryOp, LogicalOp, NodeId, NodeKind, SyntaxTree};

pub const SEQUENCE: i8 = 0;
pub const ASSIGNMENT: i8 = 1;
pub const CONDITIONAL: i8 = 3;
pub const LOGICAL_OR: i8 = 4;
pub const LOGICAL_AND: i8 = 5;
pub const UNARY: i8 = 14;
pub const UPDATE: i8 = 15;
pub const CALL: i8 = 16;
pub const NEW: i8 = 17;
pub const PRIMARY: i8 = 18;

/// Lower than every real operator. Assigned to a call whose callee is a
/// function expression, so the callee check never fires for a plain IIFE.
pub const IIFE_SENTINEL: i8 = -1;

pub fn of(tree: &SyntaxTree, id: NodeId) -> i8 {
    match &tree.get(id).kind {
        NodeKind::SequenceExpression { .. } => SEQUENCE,

        NodeKind::AssignmentExpression { .. }
        | NodeKind::ArrowFunctionExpression { .. }
        | NodeKind::YieldExpression { .. } => ASSIGNMENT,

        NodeKind::ConditionalExpression { .. } => CONDITIONAL,

        NodeKind::LogicalExpression { operator, .. } => match operator {
            LogicalOp::Or => LOGICAL_OR,
            LogicalOp::And => LOGICAL_AND,
        },

        NodeKind::BinaryExpression { operator, .. } => binary(*operator),

        NodeKind::UnaryExpression { .. } => UNARY,
        NodeKind::UpdateExpression { .. } => UPDATE,

        NodeKind::CallExpression { callee, .. } => {
            if matches!(
                tree.get(*callee).kind,
                NodeKind::FunctionExpression { .. }
            ) {
                IIFE_SENTINEL
            } else {
                CALL
            }
        }

        NodeKind::NewExpression { .. } => NEW,

        _ => PRIMARY,
    }
}

pub fn binary(operator: BinaryOp) -> i8 {
    match operator {
        BinaryOp::BitOr => 6,
        BinaryOp::BitXor => 7,
        BinaryOp::BitAnd => 8,

        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::StrictEqual
        | BinaryOp::StrictNotEqual => 9,

        BinaryOp::Less
        | BinaryOp::LessEqual
        | BinaryOp::Greater
        | BinaryOp::GreaterEqual
        | BinaryOp::In
        | BinaryOp::Instanceof => 10,

        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::UnsignedShiftRight => 11,

        BinaryOp::Add | BinaryOp::Subtract => 12,

        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 13,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn operator_tiers_are_ordered() {
        assert!(binary(BinaryOp::Multiply) > binary(BinaryOp::Add));
        assert!(binary(BinaryOp::Add) > binary(BinaryOp::ShiftLeft));
        assert!(binary(BinaryOp::ShiftLeft) > binary(BinaryOp::Less));
        assert!(binary(BinaryOp::Less) > binary(BinaryOp::Equal));
        assert!(binary(BinaryOp::Equal) > binary(BinaryOp::BitOr));
        assert!(binary(BinaryOp::BitOr) > LOGICAL_AND);
        assert!(LOGICAL_AND > LOGICAL_OR);
    }

    #[test]
    fn every_node_gets_a_level_in_range() {
        let tree = parser::parse(
            "a = b ? c && d | e : -f[g]++ * new H() + (function() {})() / (i, j);",
        )
        .unwrap();

        tree.visit(&mut |id| {
            let level = of(&tree, id);
            assert!((IIFE_SENTINEL..=PRIMARY).contains(&level));
        });
    }

    #[test]
    fn iife_calls_use_the_sentinel() {
        let tree = parser::parse("(function() {})();").unwrap();

        let mut call = None;
        tree.visit(&mut |id| {
            if matches!(
                tree.get(id).kind,
                crate::ast::NodeKind::CallExpression { .. }
            ) {
                call = Some(id);
            }
        });

        assert_eq!(of(&tree, call.unwrap()), IIFE_SENTINEL);
    }
}

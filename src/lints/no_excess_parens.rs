use super::*;
use std::fmt;

use if_chain::if_chain;
use serde::Deserialize;

use crate::ast::{LiteralValue, NodeId, NodeKind, SyntaxTree};
use crate::ast_util::{
    parens,
    precedence::{self, ASSIGNMENT, LOGICAL_OR},
    statement_head::is_head_of_expression_statement,
};

const MESSAGE: &str = "Gratuitous parentheses around expression.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    Functions,
}

#[derive(Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NoExcessParensConfig {
    pub scope: Scope,
    /// `false` tolerates the wrapping pair around an assignment used as a
    /// conditional test, as in `if ((x = load())) {}`.
    pub conditional_assign: bool,
    /// `false` tolerates parentheses grouping operands of binary and logical
    /// expressions, deferring to the author's chain grouping.
    pub nested_binary_expressions: bool,
}

impl Default for NoExcessParensConfig {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            conditional_assign: true,
            nested_binary_expressions: true,
        }
    }
}

#[derive(Debug)]
pub enum NoExcessParensError {
    ExceptionsRequireAllScope,
}

impl fmt::Display for NoExcessParensError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NoExcessParensError::ExceptionsRequireAllScope => write!(
                formatter,
                "conditionalAssign and nestedBinaryExpressions only apply to the \"all\" scope",
            ),
        }
    }
}

impl std::error::Error for NoExcessParensError {}

pub struct NoExcessParensLint {
    config: NoExcessParensConfig,
}

impl Lint for NoExcessParensLint {
    type Config = NoExcessParensConfig;
    type Error = NoExcessParensError;

    const SEVERITY: Severity = Severity::Warning;
    const LINT_TYPE: LintType = LintType::Style;

    fn new(config: Self::Config) -> Result<Self, Self::Error> {
        if config.scope == Scope::Functions
            && (!config.conditional_assign || !config.nested_binary_expressions)
        {
            return Err(NoExcessParensError::ExceptionsRequireAllScope);
        }

        Ok(NoExcessParensLint { config })
    }

    fn pass(&self, tree: &SyntaxTree) -> Vec<Diagnostic> {
        let mut visitor = NoExcessParensVisitor {
            tree,
            config: self.config,
            positions: Vec::new(),
        };

        tree.visit(&mut |id| visitor.check_node(id));

        visitor
            .positions
            .iter()
            .map(|position| Diagnostic::new("no_excess_parens", MESSAGE.to_owned(), Label::new(*position)))
            .collect()
    }
}

struct NoExcessParensVisitor<'a> {
    tree: &'a SyntaxTree,
    config: NoExcessParensConfig,
    positions: Vec<(u32, u32)>,
}

impl<'a> NoExcessParensVisitor<'a> {
    fn rule_applies(&self, id: NodeId) -> bool {
        self.config.scope == Scope::All
            || matches!(
                self.tree.get(id).kind,
                NodeKind::FunctionExpression { .. } | NodeKind::ArrowFunctionExpression { .. }
            )
    }

    fn has_excess_parens(&self, id: NodeId) -> bool {
        self.rule_applies(id) && parens::is_parenthesised(self.tree, id)
    }

    fn has_double_excess_parens(&self, id: NodeId) -> bool {
        self.rule_applies(id) && parens::is_parenthesised_twice(self.tree, id)
    }

    /// For keyword-led constructs that terminate at a line break: a pair on
    /// the keyword's line is reportable, a pair protecting a later line is
    /// load-bearing and only a second pair is excess.
    fn has_excess_parens_no_line_terminator(&self, keyword_line: usize, id: NodeId) -> bool {
        let argument_line = self
            .tree
            .first_token(id)
            .map_or(keyword_line, |token| token.line);

        if keyword_line == argument_line {
            self.has_excess_parens(id)
        } else {
            self.has_double_excess_parens(id)
        }
    }

    fn is_conditional_assign_exception(&self, test: NodeId) -> bool {
        !self.config.conditional_assign
            && matches!(
                self.tree.get(test).kind,
                NodeKind::AssignmentExpression { .. }
            )
    }

    fn precedence(&self, id: NodeId) -> i8 {
        precedence::of(self.tree, id)
    }

    fn keyword_line(&self, id: NodeId) -> usize {
        self.tree
            .first_token(id)
            .expect("statement without tokens")
            .line
    }

    fn report(&mut self, id: NodeId) {
        let paren = self
            .tree
            .token_before(id, 0)
            .expect("reported node has no opening parenthesis");

        self.positions.push((paren.span.start, paren.span.end));
    }

    fn check_unary_update(&mut self, id: NodeId, argument: NodeId) {
        if self.has_excess_parens(argument) && self.precedence(argument) >= self.precedence(id) {
            self.report(argument);
        }
    }

    fn check_call_new(&mut self, id: NodeId, callee: NodeId, arguments: &[NodeId]) {
        let iife_allowance = matches!(self.tree.get(id).kind, NodeKind::CallExpression { .. })
            && matches!(
                self.tree.get(callee).kind,
                NodeKind::FunctionExpression { .. }
            )
            && !parens::is_parenthesised_twice(self.tree, callee);

        if self.has_excess_parens(callee)
            && self.precedence(callee) >= self.precedence(id)
            && !iife_allowance
        {
            self.report(callee);
        }

        // The call's own parentheses already count as one layer around a lone
        // argument.
        match arguments {
            [argument] => {
                if self.has_double_excess_parens(*argument)
                    && self.precedence(*argument) >= ASSIGNMENT
                {
                    self.report(*argument);
                }
            }

            _ => {
                for &argument in arguments {
                    if self.has_excess_parens(argument) && self.precedence(argument) >= ASSIGNMENT
                    {
                        self.report(argument);
                    }
                }
            }
        }
    }

    fn check_binary_logical(&mut self, id: NodeId, left: NodeId, right: NodeId) {
        if !self.config.nested_binary_expressions {
            return;
        }

        let own = self.precedence(id);

        if self.has_excess_parens(left) && self.precedence(left) >= own {
            self.report(left);
        }

        // Same-precedence parentheses on the right restructure the chain, so
        // only strictly tighter operands are redundant.
        if self.has_excess_parens(right) && self.precedence(right) > own {
            self.report(right);
        }
    }

    fn check_assignment_like(&mut self, id: NodeId) {
        if self.has_excess_parens(id) && self.precedence(id) >= ASSIGNMENT {
            self.report(id);
        }
    }

    fn is_regex_literal(&self, id: NodeId) -> bool {
        matches!(
            self.tree.get(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Regex { .. }
            }
        )
    }

    fn check_node(&mut self, id: NodeId) {
        let tree = self.tree;

        match &tree.get(id).kind {
            NodeKind::ArrayExpression { elements } => {
                for &element in elements {
                    self.check_assignment_like(element);
                }
            }

            NodeKind::ObjectExpression { properties } => {
                for &property in properties {
                    if let NodeKind::Property { value, .. } = tree.get(property).kind {
                        self.check_assignment_like(value);
                    }
                }
            }

            NodeKind::ArrowFunctionExpression { body, .. } => match tree.get(*body).kind {
                NodeKind::BlockStatement { .. } => {}

                // `() => ({})` needs one pair to keep the body an object
                // literal rather than a block.
                NodeKind::ObjectExpression { .. } => {
                    if self.has_double_excess_parens(*body) {
                        self.report(*body);
                    }
                }

                _ => self.check_assignment_like(*body),
            },

            NodeKind::AssignmentExpression { right, .. } => {
                if self.has_excess_parens(*right) && self.precedence(*right) >= self.precedence(id)
                {
                    self.report(*right);
                }
            }

            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. } => {
                self.check_binary_logical(id, *left, *right);
            }

            NodeKind::CallExpression { callee, arguments }
            | NodeKind::NewExpression { callee, arguments } => {
                self.check_call_new(id, *callee, arguments);
            }

            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                if self.has_excess_parens(*test) && self.precedence(*test) >= LOGICAL_OR {
                    self.report(*test);
                }

                self.check_assignment_like(*consequent);
                self.check_assignment_like(*alternate);
            }

            NodeKind::DoWhileStatement { test, .. }
            | NodeKind::WhileStatement { test, .. }
            | NodeKind::IfStatement { test, .. } => {
                if self.has_double_excess_parens(*test)
                    && !self.is_conditional_assign_exception(*test)
                {
                    self.report(*test);
                }
            }

            NodeKind::SwitchStatement { discriminant, .. } => {
                if self.has_double_excess_parens(*discriminant) {
                    self.report(*discriminant);
                }
            }

            NodeKind::SwitchCase {
                test: Some(test), ..
            } => {
                if self.has_excess_parens(*test) {
                    self.report(*test);
                }
            }

            NodeKind::WithStatement { object, .. } => {
                if self.has_double_excess_parens(*object) {
                    self.report(*object);
                }
            }

            NodeKind::ExpressionStatement { expression } => {
                if self.has_excess_parens(*expression) {
                    let first_tokens = tree.first_tokens(*expression, 2);

                    // Unwrapped, these heads would be misread as a block, a
                    // declaration, or a `let [` destructuring.
                    let ambiguous_head = match first_tokens.first() {
                        Some(first) => {
                            matches!(first.value.as_str(), "{" | "function" | "class")
                                || (first.value == "let"
                                    && first_tokens
                                        .get(1)
                                        .is_some_and(|second| second.value == "["))
                        }
                        None => false,
                    };

                    if !ambiguous_head {
                        self.report(*expression);
                    }
                }
            }

            NodeKind::ForInStatement { right, .. } | NodeKind::ForOfStatement { right, .. } => {
                if self.has_excess_parens(*right) {
                    self.report(*right);
                }
            }

            NodeKind::ForStatement {
                init, test, update, ..
            } => {
                if let Some(init) = init {
                    if self.has_excess_parens(*init) {
                        self.report(*init);
                    }
                }

                if let Some(test) = test {
                    if self.has_excess_parens(*test) && !self.is_conditional_assign_exception(*test)
                    {
                        self.report(*test);
                    }
                }

                if let Some(update) = update {
                    if self.has_excess_parens(*update) {
                        self.report(*update);
                    }
                }
            }

            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.check_member_object(id, *object, *computed);

                if *computed && self.has_excess_parens(*property) {
                    self.report(*property);
                }
            }

            NodeKind::ReturnStatement {
                argument: Some(argument),
            } => {
                let keyword_line = self.keyword_line(id);

                if self.has_excess_parens_no_line_terminator(keyword_line, *argument)
                    && !self.is_regex_literal(*argument)
                {
                    self.report(*argument);
                }
            }

            NodeKind::ThrowStatement { argument } => {
                let keyword_line = self.keyword_line(id);

                if self.has_excess_parens_no_line_terminator(keyword_line, *argument) {
                    self.report(*argument);
                }
            }

            NodeKind::SequenceExpression { expressions } => {
                let own = self.precedence(id);

                for &expression in expressions {
                    if self.has_excess_parens(expression) && self.precedence(expression) >= own {
                        self.report(expression);
                    }
                }
            }

            NodeKind::UnaryExpression { argument, .. }
            | NodeKind::UpdateExpression { argument, .. } => {
                self.check_unary_update(id, *argument);
            }

            NodeKind::VariableDeclarator {
                init: Some(init), ..
            } => {
                if self.has_excess_parens(*init)
                    && self.precedence(*init) >= ASSIGNMENT
                    && !self.is_regex_literal(*init)
                {
                    self.report(*init);
                }
            }

            NodeKind::YieldExpression {
                argument: Some(argument),
                ..
            } => {
                let keyword_line = self.keyword_line(id);

                if (self.precedence(*argument) >= self.precedence(id)
                    && self.has_excess_parens_no_line_terminator(keyword_line, *argument))
                    || self.has_double_excess_parens(*argument)
                {
                    self.report(*argument);
                }
            }

            _ => {}
        }
    }

    fn check_member_object(&mut self, id: NodeId, object: NodeId, computed: bool) {
        let tree = self.tree;

        if !self.has_excess_parens(object) || self.precedence(object) < self.precedence(id) {
            return;
        }

        // `(123).x` reads the dot as a decimal point without the parens, and
        // regex literal objects conventionally keep one pair.
        if !computed {
            if_chain! {
                if let NodeKind::Literal { value: LiteralValue::Number(_) } = &tree.get(object).kind;
                if let Some(token) = tree.first_token(object);
                if token.value.bytes().all(|byte| byte.is_ascii_digit());
                then {
                    return;
                }
            }

            if self.is_regex_literal(object) {
                return;
            }
        }

        // One pair around a function or class expression heading its
        // statement keeps it from parsing as a declaration.
        if matches!(
            tree.get(object).kind,
            NodeKind::FunctionExpression { .. } | NodeKind::ClassExpression { .. }
        ) && is_head_of_expression_statement(tree, id)
            && !self.has_double_excess_parens(object)
        {
            return;
        }

        self.report(object);
    }
}

#[cfg(test)]
mod tests {
    use super::{super::test_util::test_lint, *};
    use crate::parser;

    fn violations_with(config: NoExcessParensConfig, source: &str) -> Vec<(u32, u32)> {
        let tree = parser::parse(source).unwrap();
        let lint = NoExcessParensLint::new(config).unwrap();

        lint.pass(&tree)
            .iter()
            .map(|diagnostic| diagnostic.primary_label.range)
            .collect()
    }

    fn violations(source: &str) -> Vec<(u32, u32)> {
        violations_with(NoExcessParensConfig::default(), source)
    }

    #[test]
    fn doubled_condition_parens() {
        assert_eq!(violations("if (x) {}"), vec![]);
        assert_eq!(violations("if ((x)) {}"), vec![(4, 5)]);
        assert_eq!(violations("while ((x)) {}"), vec![(7, 8)]);
        assert_eq!(violations("with ((x)) {}"), vec![(6, 7)]);
    }

    #[test]
    fn conditional_assign_requires_opt_out() {
        assert_eq!(violations("if ((x = 1)) {}"), vec![(4, 5)]);

        let config = NoExcessParensConfig {
            conditional_assign: false,
            ..NoExcessParensConfig::default()
        };

        assert_eq!(violations_with(config, "if ((x = 1)) {}"), vec![]);
        assert_eq!(violations_with(config, "while ((x = next())) {}"), vec![]);
        assert_eq!(violations_with(config, "for (; (x = step()); ) {}"), vec![]);
    }

    #[test]
    fn iife_callee_keeps_one_pair() {
        assert_eq!(violations("(function() {})();"), vec![]);
        assert_eq!(violations("((function() {}))();"), vec![(1, 2)]);
    }

    #[test]
    fn grouping_that_changes_precedence_stays() {
        assert_eq!(violations("a = (b + c) * d;"), vec![]);
        assert_eq!(violations("a = (b * c) + d;"), vec![(4, 5)]);
    }

    #[test]
    fn same_precedence_right_operand_is_not_redundant() {
        assert_eq!(violations("a = b - (c - d);"), vec![]);
        assert_eq!(violations("a = (b - c) - d;"), vec![(4, 5)]);
    }

    #[test]
    fn nested_binary_opt_out_suppresses_operand_checks() {
        assert_eq!(violations("x = a || (b && c);"), vec![(9, 10)]);

        let config = NoExcessParensConfig {
            nested_binary_expressions: false,
            ..NoExcessParensConfig::default()
        };

        assert_eq!(violations_with(config, "x = a || (b && c);"), vec![]);
        assert_eq!(violations_with(config, "x = (a + b) + c;"), vec![]);
    }

    #[test]
    fn return_across_lines_keeps_one_pair() {
        assert_eq!(
            violations("function f() {\n    return (\n        a + b\n    );\n}"),
            vec![]
        );
        assert_eq!(violations("function f() {\n    return (a + b);\n}").len(), 1);
        assert_eq!(
            violations("function f() {\n    return ((\n        a + b\n    ));\n}").len(),
            1
        );
    }

    #[test]
    fn return_regex_keeps_its_parens() {
        assert_eq!(violations("function f() { return (/done/); }"), vec![]);
        assert_eq!(violations("function f() { return (x); }").len(), 1);
    }

    #[test]
    fn throw_uses_the_line_terminator_rule() {
        assert_eq!(violations("throw (a);"), vec![(6, 7)]);
        assert_eq!(violations("throw (\n    a\n);"), vec![]);
    }

    #[test]
    fn unary_operand() {
        assert_eq!(violations("typeof (a.b);"), vec![(7, 8)]);
        assert_eq!(violations("typeof (a + b);"), vec![]);
        assert_eq!(violations("(x)++;"), vec![(0, 1)]);
    }

    #[test]
    fn lone_call_argument_counts_the_call_parens() {
        assert_eq!(violations("f(a);"), vec![]);
        assert_eq!(violations("f((a));"), vec![(2, 3)]);
        assert_eq!(violations("f(a, (b));"), vec![(5, 6)]);
    }

    #[test]
    fn callee_parens() {
        assert_eq!(violations("(f)();"), vec![(0, 1)]);
        assert_eq!(violations("new (A)();"), vec![(4, 5)]);
    }

    #[test]
    fn member_objects() {
        assert_eq!(violations("(0).toString();"), vec![]);
        assert_eq!(violations("(0.5).toString();"), vec![(0, 1)]);
        assert_eq!(violations("(/re/).test(s);"), vec![]);
        assert_eq!(violations("(a + b).c;"), vec![]);
        assert_eq!(violations("a[(b)];"), vec![(2, 3)]);
    }

    #[test]
    fn statement_head_functions_keep_one_pair() {
        assert_eq!(violations("(function() {}).call(this);"), vec![]);
        assert_eq!(violations("x = (function() {}).name;"), vec![(4, 5)]);
    }

    #[test]
    fn expression_statement_disambiguation() {
        assert_eq!(violations("(a);"), vec![(0, 1)]);
        assert_eq!(violations("((a));"), vec![(1, 2)]);
        assert_eq!(violations("({});"), vec![]);
        assert_eq!(violations("(function() {});"), vec![]);
        assert_eq!(violations("(let[a] = b);"), vec![]);
    }

    #[test]
    fn declarator_initializers() {
        assert_eq!(violations("var x = (y);"), vec![(8, 9)]);
        assert_eq!(violations("var x = (/re/);"), vec![]);
        assert_eq!(violations("var x = (a, b);"), vec![]);
    }

    #[test]
    fn loop_clauses() {
        assert_eq!(
            violations("for ((x); (y); (z)) {}"),
            vec![(5, 6), (10, 11), (15, 16)]
        );
        assert_eq!(violations("for (x in (y)) {}"), vec![(10, 11)]);
        assert_eq!(violations("for (x of (y)) {}"), vec![(10, 11)]);
    }

    #[test]
    fn switch_positions() {
        assert_eq!(
            violations("switch ((x)) { case (y): break; }"),
            vec![(8, 9), (20, 21)]
        );
        assert_eq!(violations("switch (x) {}"), vec![]);
    }

    #[test]
    fn sequences_and_containers() {
        assert_eq!(violations("(a), b;"), vec![(0, 1)]);
        assert_eq!(violations("[(a)];"), vec![(1, 2)]);
        assert_eq!(violations("x = { a: (b) };"), vec![(9, 10)]);
    }

    #[test]
    fn conditional_positions() {
        assert_eq!(violations("(a || b) ? c : d;"), vec![(0, 1)]);
        assert_eq!(violations("a ? (b = c) : d;"), vec![(4, 5)]);
        assert_eq!(violations("a ? b : (c);"), vec![(8, 9)]);
    }

    #[test]
    fn arrow_bodies() {
        assert_eq!(violations("var f = () => (x);"), vec![(14, 15)]);
        assert_eq!(violations("var f = () => ({});"), vec![]);
        assert_eq!(violations("var f = () => (({}));").len(), 1);
    }

    #[test]
    fn yield_arguments() {
        assert_eq!(violations("function* g() { yield (a); }").len(), 1);
        assert_eq!(violations("function* g() { yield (a, b); }"), vec![]);
        assert_eq!(violations("function* g() { yield; }"), vec![]);
    }

    #[test]
    fn functions_scope_limits_checks_to_function_literals() {
        let config = NoExcessParensConfig {
            scope: Scope::Functions,
            ..NoExcessParensConfig::default()
        };

        assert_eq!(violations_with(config, "a = (b);"), vec![]);
        assert_eq!(violations_with(config, "if ((x)) {}"), vec![]);
        assert_eq!(violations_with(config, "a = (function() {});"), vec![(4, 5)]);
    }

    #[test]
    fn exceptions_are_rejected_outside_all_scope() {
        let result = NoExcessParensLint::new(NoExcessParensConfig {
            scope: Scope::Functions,
            conditional_assign: false,
            ..NoExcessParensConfig::default()
        });

        assert!(matches!(
            result,
            Err(NoExcessParensError::ExceptionsRequireAllScope)
        ));
    }

    #[test]
    fn analysis_is_idempotent() {
        let tree = parser::parse("a = ((b * c)) + d; if ((x)) { f((y)); }").unwrap();
        let lint = NoExcessParensLint::new(NoExcessParensConfig::default()).unwrap();

        let first: Vec<_> = lint
            .pass(&tree)
            .iter()
            .map(|diagnostic| diagnostic.primary_label.range)
            .collect();
        let second: Vec<_> = lint
            .pass(&tree)
            .iter()
            .map(|diagnostic| diagnostic.primary_label.range)
            .collect();

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_no_excess_parens() {
        test_lint(
            NoExcessParensLint::new(NoExcessParensConfig::default()).unwrap(),
            "no_excess_parens",
            "no_excess_parens",
        );
    }

    #[test]
    fn test_conditional_assign() {
        test_lint(
            NoExcessParensLint::new(NoExcessParensConfig {
                conditional_assign: false,
                ..NoExcessParensConfig::default()
            })
            .unwrap(),
            "no_excess_parens",
            "conditional_assign",
        );
    }

    #[test]
    fn test_nested_binary_expressions() {
        test_lint(
            NoExcessParensLint::new(NoExcessParensConfig {
                nested_binary_expressions: false,
                ..NoExcessParensConfig::default()
            })
            .unwrap(),
            "no_excess_parens",
            "nested_binary_expressions",
        );
    }

    #[test]
    fn test_functions_scope() {
        test_lint(
            NoExcessParensLint::new(NoExcessParensConfig {
                scope: Scope::Functions,
                ..NoExcessParensConfig::default()
            })
            .unwrap(),
            "no_excess_parens",
            "functions_scope",
        );
    }
}

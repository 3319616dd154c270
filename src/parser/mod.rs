//! Recursive-descent parser for the linted language.
//!
//! Parentheses never become tree nodes: a parenthesized expression is the
//! inner node with its own range, while the parentheses stay in the token
//! sequence. Composite nodes capture their start offset before descending, so
//! their ranges cover any parentheses wrapped around sub-expressions.

mod lexer;

use std::{error::Error, fmt};

use id_arena::Arena;

use crate::ast::{
    AssignmentOp, BinaryOp, DeclarationKind, LiteralValue, LogicalOp, Node, NodeId, NodeKind,
    Span, SyntaxTree, Token, TokenKind, UnaryOp, UpdateOp,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// 1-based.
    pub line: usize,
    /// 0-based.
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl Error for SyntaxError {}

pub fn parse(source: &str) -> Result<SyntaxTree, SyntaxError> {
    let tokens = lexer::tokenize(source)?;

    Parser {
        tokens,
        index: 0,
        arena: Arena::new(),
    }
    .parse_program(source.len() as u32)
}

#[derive(Clone, Copy)]
enum BinaryLike {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    arena: Arena<Node>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.index + ahead)
    }

    fn check(&self, value: &str) -> bool {
        self.peek().is_some_and(|token| token.value == value)
    }

    fn check_keyword(&self, value: &str) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Keyword && token.value == value)
    }

    fn eat(&mut self, value: &str) -> bool {
        if self.check(value) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, value: &str) -> Result<(), SyntaxError> {
        if self.eat(value) {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected `{value}`, found {}",
                self.peek()
                    .map_or("end of input".to_string(), |token| format!(
                        "`{}`",
                        token.value
                    ))
            )))
        }
    }

    fn error_here(&self, message: String) -> SyntaxError {
        let (line, column) = self
            .peek()
            .or_else(|| self.tokens.last())
            .map_or((1, 0), |token| (token.line, token.column));

        SyntaxError {
            message,
            line,
            column,
        }
    }

    /// Start offset of the next token, for span bookkeeping.
    fn peek_start(&self) -> u32 {
        match self.peek() {
            Some(token) => token.span.start,
            None => self.tokens.last().map_or(0, |token| token.span.end),
        }
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn finish(&mut self, kind: NodeKind, start: u32) -> NodeId {
        let end = self.previous().span.end;
        self.arena.alloc(Node {
            kind,
            span: Span::new(start, end),
            parent: None,
        })
    }

    fn parse_program(mut self, source_len: u32) -> Result<SyntaxTree, SyntaxError> {
        let mut body = Vec::new();

        while self.index < self.tokens.len() {
            body.push(self.parse_statement()?);
        }

        let root = self.arena.alloc(Node {
            kind: NodeKind::Program { body },
            span: Span::new(0, source_len),
            parent: None,
        });

        Ok(SyntaxTree::new(self.arena, self.tokens, root))
    }

    // Statements

    fn parse_statement(&mut self) -> Result<NodeId, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expected a statement".to_string()));
        };

        if token.kind == TokenKind::Keyword {
            match token.value.as_str() {
                "var" | "const" => return self.parse_variable_statement(),
                // `let` only heads a declaration when a binding name follows;
                // anywhere else it is an ordinary identifier.
                "let" if self.peek_at(1).is_some_and(|next| next.kind == TokenKind::Identifier) => {
                    return self.parse_variable_statement()
                }
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "switch" => return self.parse_switch(),
                "with" => return self.parse_with(),
                "return" => return self.parse_return(),
                "throw" => return self.parse_throw(),
                "break" => return self.parse_jump(NodeKind::BreakStatement),
                "continue" => return self.parse_jump(NodeKind::ContinueStatement),
                "function" => return self.parse_function_declaration(),
                "class" => return self.parse_class_declaration(),
                _ => {}
            }
        }

        match token.value.as_str() {
            "{" => self.parse_block(),
            ";" => {
                let start = self.peek_start();
                self.index += 1;
                Ok(self.finish(NodeKind::EmptyStatement, start))
            }
            _ => {
                let start = self.peek_start();
                let expression = self.parse_expression(false)?;
                self.eat(";");
                Ok(self.finish(NodeKind::ExpressionStatement { expression }, start))
            }
        }
    }

    fn parse_block(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.expect("{")?;

        let mut body = Vec::new();
        while !self.check("}") {
            if self.peek().is_none() {
                return Err(self.error_here("unclosed block".to_string()));
            }
            body.push(self.parse_statement()?);
        }

        self.expect("}")?;
        Ok(self.finish(NodeKind::BlockStatement { body }, start))
    }

    fn parse_variable_statement(&mut self) -> Result<NodeId, SyntaxError> {
        let declaration = self.parse_variable_declaration(false)?;
        self.eat(";");
        Ok(declaration)
    }

    fn parse_variable_declaration(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let kind = match self.peek().map(|token| token.value.as_str()) {
            Some("var") => DeclarationKind::Var,
            Some("let") => DeclarationKind::Let,
            _ => DeclarationKind::Const,
        };
        self.index += 1;

        let mut declarations = Vec::new();
        loop {
            let declarator_start = self.peek_start();
            let id = self.parse_binding_identifier()?;

            let init = if self.eat("=") {
                Some(self.parse_assignment(no_in)?)
            } else {
                None
            };

            declarations.push(self.finish(
                NodeKind::VariableDeclarator { id, init },
                declarator_start,
            ));

            if !self.eat(",") {
                break;
            }
        }

        Ok(self.finish(
            NodeKind::VariableDeclaration { kind, declarations },
            start,
        ))
    }

    fn parse_binding_identifier(&mut self) -> Result<NodeId, SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let start = token.span.start;
                let name = token.value.clone();
                self.index += 1;
                Ok(self.finish(NodeKind::Identifier { name }, start))
            }
            _ => Err(self.error_here("expected a binding name".to_string())),
        }
    }

    fn parse_if(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.expect("(")?;
        let test = self.parse_expression(false)?;
        self.expect(")")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.check_keyword("else") {
            self.index += 1;
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.expect("(")?;
        let test = self.parse_expression(false)?;
        self.expect(")")?;
        let body = self.parse_statement()?;

        Ok(self.finish(NodeKind::WhileStatement { test, body }, start))
    }

    fn parse_do_while(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        let body = self.parse_statement()?;

        if !self.check_keyword("while") {
            return Err(self.error_here("expected `while` after `do` body".to_string()));
        }
        self.index += 1;

        self.expect("(")?;
        let test = self.parse_expression(false)?;
        self.expect(")")?;
        self.eat(";");

        Ok(self.finish(NodeKind::DoWhileStatement { body, test }, start))
    }

    fn parse_for(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.expect("(")?;

        let init = if self.eat(";") {
            None
        } else {
            let is_declaration = self.check_keyword("var")
                || self.check_keyword("const")
                || (self.check_keyword("let")
                    && self
                        .peek_at(1)
                        .is_some_and(|next| next.kind == TokenKind::Identifier));

            let left = if is_declaration {
                self.parse_variable_declaration(true)?
            } else {
                self.parse_expression(true)?
            };

            if self.check_keyword("in") {
                self.index += 1;
                let right = self.parse_expression(false)?;
                self.expect(")")?;
                let body = self.parse_statement()?;
                return Ok(self.finish(NodeKind::ForInStatement { left, right, body }, start));
            }

            if self.check("of") {
                self.index += 1;
                let right = self.parse_assignment(false)?;
                self.expect(")")?;
                let body = self.parse_statement()?;
                return Ok(self.finish(NodeKind::ForOfStatement { left, right, body }, start));
            }

            self.expect(";")?;
            Some(left)
        };

        let test = if self.check(";") {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(";")?;

        let update = if self.check(")") {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(")")?;

        let body = self.parse_statement()?;
        Ok(self.finish(
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_switch(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.expect("(")?;
        let discriminant = self.parse_expression(false)?;
        self.expect(")")?;
        self.expect("{")?;

        let mut cases = Vec::new();
        while !self.check("}") {
            let case_start = self.peek_start();

            let test = if self.check_keyword("case") {
                self.index += 1;
                Some(self.parse_expression(false)?)
            } else if self.check_keyword("default") {
                self.index += 1;
                None
            } else {
                return Err(self.error_here("expected `case` or `default`".to_string()));
            };
            self.expect(":")?;

            let mut consequent = Vec::new();
            while !self.check("}") && !self.check_keyword("case") && !self.check_keyword("default")
            {
                consequent.push(self.parse_statement()?);
            }

            cases.push(self.finish(NodeKind::SwitchCase { test, consequent }, case_start));
        }

        self.expect("}")?;
        Ok(self.finish(
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            },
            start,
        ))
    }

    fn parse_with(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.expect("(")?;
        let object = self.parse_expression(false)?;
        self.expect(")")?;
        let body = self.parse_statement()?;

        Ok(self.finish(NodeKind::WithStatement { object, body }, start))
    }

    fn parse_return(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let keyword_line = self.peek().map_or(1, |token| token.line);
        self.index += 1;

        // A line break after `return` terminates the statement.
        let argument = if self.argument_follows(keyword_line) {
            Some(self.parse_expression(false)?)
        } else {
            None
        };
        self.eat(";");

        Ok(self.finish(NodeKind::ReturnStatement { argument }, start))
    }

    fn parse_throw(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let keyword_line = self.peek().map_or(1, |token| token.line);
        self.index += 1;

        if !self.argument_follows(keyword_line) {
            return Err(self.error_here("expected an expression after `throw`".to_string()));
        }

        let argument = self.parse_expression(false)?;
        self.eat(";");

        Ok(self.finish(NodeKind::ThrowStatement { argument }, start))
    }

    fn argument_follows(&self, keyword_line: usize) -> bool {
        match self.peek() {
            Some(token) => {
                token.line == keyword_line && !matches!(token.value.as_str(), ";" | "}" | ")")
            }
            None => false,
        }
    }

    fn parse_jump(&mut self, kind: NodeKind) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        self.eat(";");
        Ok(self.finish(kind, start))
    }

    fn parse_function_declaration(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        let generator = self.eat("*");
        let id = Some(self.parse_binding_identifier()?);
        let params = self.parse_params()?;
        let body = self.parse_block()?;

        Ok(self.finish(
            NodeKind::FunctionDeclaration {
                id,
                params,
                body,
                generator,
            },
            start,
        ))
    }

    fn parse_class_declaration(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;
        let (id, superclass, body) = self.parse_class_tail(true)?;

        Ok(self.finish(
            NodeKind::ClassDeclaration {
                id,
                superclass,
                body,
            },
            start,
        ))
    }

    fn parse_class_tail(
        &mut self,
        require_name: bool,
    ) -> Result<(Option<NodeId>, Option<NodeId>, Vec<NodeId>), SyntaxError> {
        let id = if self
            .peek()
            .is_some_and(|token| token.kind == TokenKind::Identifier)
        {
            Some(self.parse_binding_identifier()?)
        } else if require_name {
            return Err(self.error_here("expected a class name".to_string()));
        } else {
            None
        };

        let superclass = if self.check_keyword("extends") {
            self.index += 1;
            Some(self.parse_call_member(true)?)
        } else {
            None
        };

        self.expect("{")?;
        let mut body = Vec::new();

        while !self.check("}") {
            if self.eat(";") {
                continue;
            }

            let method_start = self.peek_start();
            let generator = self.eat("*");
            let key = self.parse_identifier_name()?;

            let value_start = self.peek_start();
            let params = self.parse_params()?;
            let method_body = self.parse_block()?;
            let value = self.finish(
                NodeKind::FunctionExpression {
                    id: None,
                    params,
                    body: method_body,
                    generator,
                },
                value_start,
            );

            body.push(self.finish(NodeKind::MethodDefinition { key, value }, method_start));
        }

        self.expect("}")?;
        Ok((id, superclass, body))
    }

    fn parse_params(&mut self) -> Result<Vec<NodeId>, SyntaxError> {
        self.expect("(")?;

        let mut params = Vec::new();
        if !self.check(")") {
            loop {
                params.push(self.parse_binding_identifier()?);
                if !self.eat(",") {
                    break;
                }
            }
        }

        self.expect(")")?;
        Ok(params)
    }

    // Expressions

    fn parse_expression(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let first = self.parse_assignment(no_in)?;

        if !self.check(",") {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat(",") {
            expressions.push(self.parse_assignment(no_in)?);
        }

        Ok(self.finish(NodeKind::SequenceExpression { expressions }, start))
    }

    fn parse_assignment(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        if self.check_keyword("yield") {
            return self.parse_yield(no_in);
        }

        if let Some(arrow) = self.try_parse_arrow(no_in)? {
            return Ok(arrow);
        }

        let start = self.peek_start();
        let left = self.parse_conditional(no_in)?;

        let Some(operator) = self.peek_assignment_op() else {
            return Ok(left);
        };
        self.index += 1;

        let right = self.parse_assignment(no_in)?;
        Ok(self.finish(
            NodeKind::AssignmentExpression {
                operator,
                left,
                right,
            },
            start,
        ))
    }

    fn peek_assignment_op(&self) -> Option<AssignmentOp> {
        let token = self.peek()?;
        if token.kind != TokenKind::Punctuator {
            return None;
        }

        Some(match token.value.as_str() {
            "=" => AssignmentOp::Assign,
            "+=" => AssignmentOp::AddAssign,
            "-=" => AssignmentOp::SubtractAssign,
            "*=" => AssignmentOp::MultiplyAssign,
            "/=" => AssignmentOp::DivideAssign,
            "%=" => AssignmentOp::ModuloAssign,
            "<<=" => AssignmentOp::ShiftLeftAssign,
            ">>=" => AssignmentOp::ShiftRightAssign,
            ">>>=" => AssignmentOp::UnsignedShiftRightAssign,
            "&=" => AssignmentOp::BitAndAssign,
            "|=" => AssignmentOp::BitOrAssign,
            "^=" => AssignmentOp::BitXorAssign,
            _ => return None,
        })
    }

    fn parse_yield(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let keyword_line = self.peek().map_or(1, |token| token.line);
        self.index += 1;

        let delegate = self.eat("*");

        let argument = if delegate || self.yield_argument_follows(keyword_line) {
            Some(self.parse_assignment(no_in)?)
        } else {
            None
        };

        Ok(self.finish(NodeKind::YieldExpression { argument, delegate }, start))
    }

    fn yield_argument_follows(&self, keyword_line: usize) -> bool {
        match self.peek() {
            Some(token) => {
                token.line == keyword_line
                    && !matches!(
                        token.value.as_str(),
                        ";" | "}" | ")" | "]" | "," | ":" | "=>"
                    )
            }
            None => false,
        }
    }

    /// Looks for `ident =>` or a balanced `( ... ) =>` from the current token.
    fn at_arrow(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };

        if token.kind == TokenKind::Identifier {
            return self.peek_at(1).is_some_and(|next| next.value == "=>");
        }

        if token.value != "(" {
            return false;
        }

        let mut depth = 0usize;
        for ahead in 0.. {
            let Some(token) = self.peek_at(ahead) else {
                return false;
            };

            match token.value.as_str() {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .peek_at(ahead + 1)
                            .is_some_and(|next| next.value == "=>");
                    }
                }
                _ => {}
            }
        }

        false
    }

    fn try_parse_arrow(&mut self, no_in: bool) -> Result<Option<NodeId>, SyntaxError> {
        if !self.at_arrow() {
            return Ok(None);
        }

        let start = self.peek_start();

        let params = if self.check("(") {
            self.parse_params()?
        } else {
            vec![self.parse_binding_identifier()?]
        };

        self.expect("=>")?;

        let body = if self.check("{") {
            self.parse_block()?
        } else {
            self.parse_assignment(no_in)?
        };

        Ok(Some(self.finish(
            NodeKind::ArrowFunctionExpression { params, body },
            start,
        )))
    }

    fn parse_conditional(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let test = self.parse_binary(no_in, 0)?;

        if !self.eat("?") {
            return Ok(test);
        }

        let consequent = self.parse_assignment(false)?;
        self.expect(":")?;
        let alternate = self.parse_assignment(no_in)?;

        Ok(self.finish(
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn peek_binary_op(&self, no_in: bool) -> Option<(u8, BinaryLike)> {
        let token = self.peek()?;

        let (level, op) = match (token.kind, token.value.as_str()) {
            (TokenKind::Punctuator, "||") => (4, BinaryLike::Logical(LogicalOp::Or)),
            (TokenKind::Punctuator, "&&") => (5, BinaryLike::Logical(LogicalOp::And)),
            (TokenKind::Punctuator, "|") => (6, BinaryLike::Binary(BinaryOp::BitOr)),
            (TokenKind::Punctuator, "^") => (7, BinaryLike::Binary(BinaryOp::BitXor)),
            (TokenKind::Punctuator, "&") => (8, BinaryLike::Binary(BinaryOp::BitAnd)),
            (TokenKind::Punctuator, "==") => (9, BinaryLike::Binary(BinaryOp::Equal)),
            (TokenKind::Punctuator, "!=") => (9, BinaryLike::Binary(BinaryOp::NotEqual)),
            (TokenKind::Punctuator, "===") => (9, BinaryLike::Binary(BinaryOp::StrictEqual)),
            (TokenKind::Punctuator, "!==") => (9, BinaryLike::Binary(BinaryOp::StrictNotEqual)),
            (TokenKind::Punctuator, "<") => (10, BinaryLike::Binary(BinaryOp::Less)),
            (TokenKind::Punctuator, "<=") => (10, BinaryLike::Binary(BinaryOp::LessEqual)),
            (TokenKind::Punctuator, ">") => (10, BinaryLike::Binary(BinaryOp::Greater)),
            (TokenKind::Punctuator, ">=") => (10, BinaryLike::Binary(BinaryOp::GreaterEqual)),
            (TokenKind::Keyword, "instanceof") => (10, BinaryLike::Binary(BinaryOp::Instanceof)),
            (TokenKind::Keyword, "in") if !no_in => (10, BinaryLike::Binary(BinaryOp::In)),
            (TokenKind::Punctuator, "<<") => (11, BinaryLike::Binary(BinaryOp::ShiftLeft)),
            (TokenKind::Punctuator, ">>") => (11, BinaryLike::Binary(BinaryOp::ShiftRight)),
            (TokenKind::Punctuator, ">>>") => {
                (11, BinaryLike::Binary(BinaryOp::UnsignedShiftRight))
            }
            (TokenKind::Punctuator, "+") => (12, BinaryLike::Binary(BinaryOp::Add)),
            (TokenKind::Punctuator, "-") => (12, BinaryLike::Binary(BinaryOp::Subtract)),
            (TokenKind::Punctuator, "*") => (13, BinaryLike::Binary(BinaryOp::Multiply)),
            (TokenKind::Punctuator, "/") => (13, BinaryLike::Binary(BinaryOp::Divide)),
            (TokenKind::Punctuator, "%") => (13, BinaryLike::Binary(BinaryOp::Modulo)),
            _ => return None,
        };

        Some((level, op))
    }

    fn parse_binary(&mut self, no_in: bool, min_level: u8) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let mut left = self.parse_unary(no_in)?;

        loop {
            let Some((level, op)) = self.peek_binary_op(no_in) else {
                break;
            };
            if level < min_level {
                break;
            }
            self.index += 1;

            let right = self.parse_binary(no_in, level + 1)?;
            left = match op {
                BinaryLike::Logical(operator) => self.finish(
                    NodeKind::LogicalExpression {
                        operator,
                        left,
                        right,
                    },
                    start,
                ),
                BinaryLike::Binary(operator) => self.finish(
                    NodeKind::BinaryExpression {
                        operator,
                        left,
                        right,
                    },
                    start,
                ),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self, no_in: bool) -> Result<NodeId, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expected an expression".to_string()));
        };

        let unary_op = match (token.kind, token.value.as_str()) {
            (TokenKind::Punctuator, "-") => Some(UnaryOp::Minus),
            (TokenKind::Punctuator, "+") => Some(UnaryOp::Plus),
            (TokenKind::Punctuator, "!") => Some(UnaryOp::Not),
            (TokenKind::Punctuator, "~") => Some(UnaryOp::BitNot),
            (TokenKind::Keyword, "typeof") => Some(UnaryOp::Typeof),
            (TokenKind::Keyword, "void") => Some(UnaryOp::Void),
            (TokenKind::Keyword, "delete") => Some(UnaryOp::Delete),
            _ => None,
        };

        if let Some(operator) = unary_op {
            let start = self.peek_start();
            self.index += 1;
            let argument = self.parse_unary(no_in)?;
            return Ok(self.finish(NodeKind::UnaryExpression { operator, argument }, start));
        }

        if let Some(operator) = self.peek_update_op() {
            let start = self.peek_start();
            self.index += 1;
            let argument = self.parse_unary(no_in)?;
            return Ok(self.finish(
                NodeKind::UpdateExpression {
                    operator,
                    prefix: true,
                    argument,
                },
                start,
            ));
        }

        self.parse_postfix()
    }

    fn peek_update_op(&self) -> Option<UpdateOp> {
        match self.peek().map(|token| token.value.as_str()) {
            Some("++") => Some(UpdateOp::Increment),
            Some("--") => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn parse_postfix(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        let argument = self.parse_call_member(true)?;

        if let Some(operator) = self.peek_update_op() {
            // Postfix operators bind only without an intervening line break.
            let same_line = self
                .peek()
                .is_some_and(|token| token.line == self.previous().line);

            if same_line {
                self.index += 1;
                return Ok(self.finish(
                    NodeKind::UpdateExpression {
                        operator,
                        prefix: false,
                        argument,
                    },
                    start,
                ));
            }
        }

        Ok(argument)
    }

    fn parse_call_member(&mut self, allow_call: bool) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();

        let mut expr = if self.check_keyword("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            if self.eat(".") {
                let property = self.parse_identifier_name()?;
                expr = self.finish(
                    NodeKind::MemberExpression {
                        object: expr,
                        property,
                        computed: false,
                    },
                    start,
                );
            } else if self.eat("[") {
                let property = self.parse_expression(false)?;
                self.expect("]")?;
                expr = self.finish(
                    NodeKind::MemberExpression {
                        object: expr,
                        property,
                        computed: true,
                    },
                    start,
                );
            } else if allow_call && self.check("(") {
                let arguments = self.parse_arguments()?;
                expr = self.finish(
                    NodeKind::CallExpression {
                        callee: expr,
                        arguments,
                    },
                    start,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.index += 1;

        let callee = self.parse_call_member(false)?;
        let arguments = if self.check("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(self.finish(NodeKind::NewExpression { callee, arguments }, start))
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeId>, SyntaxError> {
        self.expect("(")?;

        let mut arguments = Vec::new();
        if !self.check(")") {
            loop {
                arguments.push(self.parse_assignment(false)?);
                if !self.eat(",") {
                    break;
                }
            }
        }

        self.expect(")")?;
        Ok(arguments)
    }

    fn parse_identifier_name(&mut self) -> Result<NodeId, SyntaxError> {
        match self.peek() {
            Some(token)
                if matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) =>
            {
                let start = token.span.start;
                let name = token.value.clone();
                self.index += 1;
                Ok(self.finish(NodeKind::Identifier { name }, start))
            }
            _ => Err(self.error_here("expected a property name".to_string())),
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expected an expression".to_string()));
        };

        let start = token.span.start;
        let value = token.value.clone();

        match token.kind {
            TokenKind::Punctuator => match value.as_str() {
                // Grouping: the parentheses stay tokens, the inner node keeps
                // its own range.
                "(" => {
                    self.index += 1;
                    let expression = self.parse_expression(false)?;
                    self.expect(")")?;
                    Ok(expression)
                }

                "[" => self.parse_array(),
                "{" => self.parse_object(),

                _ => Err(self.error_here(format!("unexpected token `{value}`"))),
            },

            TokenKind::Keyword => match value.as_str() {
                "function" => {
                    self.index += 1;
                    let generator = self.eat("*");
                    let id = if self
                        .peek()
                        .is_some_and(|token| token.kind == TokenKind::Identifier)
                    {
                        Some(self.parse_binding_identifier()?)
                    } else {
                        None
                    };
                    let params = self.parse_params()?;
                    let body = self.parse_block()?;

                    Ok(self.finish(
                        NodeKind::FunctionExpression {
                            id,
                            params,
                            body,
                            generator,
                        },
                        start,
                    ))
                }

                "class" => {
                    self.index += 1;
                    let (id, superclass, body) = self.parse_class_tail(false)?;
                    Ok(self.finish(
                        NodeKind::ClassExpression {
                            id,
                            superclass,
                            body,
                        },
                        start,
                    ))
                }

                "this" => {
                    self.index += 1;
                    Ok(self.finish(NodeKind::ThisExpression, start))
                }

                "true" | "false" => {
                    self.index += 1;
                    Ok(self.finish(
                        NodeKind::Literal {
                            value: LiteralValue::Boolean(value == "true"),
                        },
                        start,
                    ))
                }

                "null" => {
                    self.index += 1;
                    Ok(self.finish(
                        NodeKind::Literal {
                            value: LiteralValue::Null,
                        },
                        start,
                    ))
                }

                // Contextual: outside a declaration head, `let` is a name.
                "let" => {
                    self.index += 1;
                    Ok(self.finish(NodeKind::Identifier { name: value }, start))
                }

                _ => Err(self.error_here(format!("unexpected keyword `{value}`"))),
            },

            TokenKind::Identifier => {
                self.index += 1;
                Ok(self.finish(NodeKind::Identifier { name: value }, start))
            }

            TokenKind::Number => {
                self.index += 1;

                let number = if value.starts_with("0x") || value.starts_with("0X") {
                    u64::from_str_radix(&value[2..], 16).map(|hex| hex as f64)
                        .map_err(|_| self.error_here(format!("invalid number `{value}`")))?
                } else {
                    value
                        .parse::<f64>()
                        .map_err(|_| self.error_here(format!("invalid number `{value}`")))?
                };

                Ok(self.finish(
                    NodeKind::Literal {
                        value: LiteralValue::Number(number),
                    },
                    start,
                ))
            }

            TokenKind::String => {
                self.index += 1;
                Ok(self.finish(
                    NodeKind::Literal {
                        value: LiteralValue::String(value[1..value.len() - 1].to_string()),
                    },
                    start,
                ))
            }

            TokenKind::Regex => {
                self.index += 1;
                let close = value.rfind('/').expect("regex token without closing slash");
                Ok(self.finish(
                    NodeKind::Literal {
                        value: LiteralValue::Regex {
                            pattern: value[1..close].to_string(),
                            flags: value[close + 1..].to_string(),
                        },
                    },
                    start,
                ))
            }
        }
    }

    fn parse_array(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.expect("[")?;

        let mut elements = Vec::new();
        while !self.check("]") {
            if self.eat(",") {
                continue;
            }

            if self.peek().is_none() {
                return Err(self.error_here("unclosed array literal".to_string()));
            }

            elements.push(self.parse_assignment(false)?);

            if !self.check("]") {
                self.expect(",")?;
            }
        }

        self.expect("]")?;
        Ok(self.finish(NodeKind::ArrayExpression { elements }, start))
    }

    fn parse_object(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.peek_start();
        self.expect("{")?;

        let mut properties = Vec::new();
        while !self.check("}") {
            let property_start = self.peek_start();

            let (key, computed) = if self.eat("[") {
                let key = self.parse_assignment(false)?;
                self.expect("]")?;
                (key, true)
            } else {
                let Some(token) = self.peek() else {
                    return Err(self.error_here("unclosed object literal".to_string()));
                };

                let key = match token.kind {
                    TokenKind::Identifier | TokenKind::Keyword => self.parse_identifier_name()?,
                    TokenKind::Number | TokenKind::String => self.parse_primary()?,
                    _ => {
                        return Err(
                            self.error_here(format!("unexpected token `{}`", token.value))
                        )
                    }
                };

                (key, false)
            };

            let (value, shorthand) = if self.eat(":") {
                (self.parse_assignment(false)?, false)
            } else {
                // Shorthand `{ a }`: the value is a fresh identifier node over
                // the same range as the key.
                let key_node = &self.arena[key];
                let NodeKind::Identifier { name } = &key_node.kind else {
                    return Err(self.error_here("expected `:`".to_string()));
                };

                let name = name.clone();
                let span = key_node.span;
                let value = self.arena.alloc(Node {
                    kind: NodeKind::Identifier { name },
                    span,
                    parent: None,
                });

                (value, true)
            };

            properties.push(self.finish(
                NodeKind::Property {
                    key,
                    value,
                    computed,
                    shorthand,
                },
                property_start,
            ));

            if !self.check("}") {
                self.expect(",")?;
            }
        }

        self.expect("}")?;
        Ok(self.finish(NodeKind::ObjectExpression { properties }, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SyntaxTree;

    fn find_kind<'a>(
        tree: &'a SyntaxTree,
        matcher: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut found = None;
        tree.visit(&mut |id| {
            if found.is_none() && matcher(&tree.get(id).kind) {
                found = Some(id);
            }
        });
        found
    }

    #[test]
    fn parenthesized_expression_spans_exclude_the_parens() {
        let tree = parse("a = (b + c);").unwrap();

        let binary =
            find_kind(&tree, |kind| matches!(kind, NodeKind::BinaryExpression { .. })).unwrap();
        let span = tree.get(binary).span;

        assert_eq!(span.start, 5);
        assert_eq!(span.end, 10);
    }

    #[test]
    fn parent_spans_cover_child_parens() {
        // The assignment must reach back to the `(` so that adjacent parens
        // are never mistaken for an enclosing pair.
        let tree = parse("x = (a) + (b);").unwrap();

        let binary =
            find_kind(&tree, |kind| matches!(kind, NodeKind::BinaryExpression { .. })).unwrap();
        let span = tree.get(binary).span;

        assert_eq!(span.start, 4);
        assert_eq!(span.end, 13);
    }

    #[test]
    fn classic_for_and_for_in_disambiguate() {
        let tree = parse("for (x in y) {} for (a; a; a) {}").unwrap();

        assert!(find_kind(&tree, |kind| matches!(kind, NodeKind::ForInStatement { .. })).is_some());
        assert!(find_kind(&tree, |kind| matches!(kind, NodeKind::ForStatement { .. })).is_some());
    }

    #[test]
    fn arrow_functions_are_detected_through_parens() {
        let tree = parse("f((a, b) => a + b, (c));").unwrap();

        assert!(find_kind(&tree, |kind| {
            matches!(kind, NodeKind::ArrowFunctionExpression { .. })
        })
        .is_some());
    }

    #[test]
    fn return_without_same_line_argument_ends_the_statement() {
        let tree = parse("function f() {\n    return\n}").unwrap();

        let return_statement =
            find_kind(&tree, |kind| matches!(kind, NodeKind::ReturnStatement { .. })).unwrap();

        match tree.get(return_statement).kind {
            NodeKind::ReturnStatement { argument } => assert!(argument.is_none()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn new_binds_arguments_to_the_callee() {
        let tree = parse("new A.B(c)(d);").unwrap();

        let call =
            find_kind(&tree, |kind| matches!(kind, NodeKind::CallExpression { .. })).unwrap();

        match &tree.get(call).kind {
            NodeKind::CallExpression { callee, .. } => {
                assert!(matches!(
                    tree.get(*callee).kind,
                    NodeKind::NewExpression { .. }
                ));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn reports_positions_for_errors() {
        let error = parse("a = ;").unwrap_err();

        assert_eq!(error.line, 1);
        assert_eq!(error.column, 4);
    }

    #[test]
    fn let_is_an_identifier_in_expression_position() {
        let tree = parse("(let[a] = b);").unwrap();

        let member =
            find_kind(&tree, |kind| matches!(kind, NodeKind::MemberExpression { .. })).unwrap();

        match &tree.get(member).kind {
            NodeKind::MemberExpression {
                object, computed, ..
            } => {
                assert!(*computed);
                assert!(matches!(
                    &tree.get(*object).kind,
                    NodeKind::Identifier { name } if name == "let"
                ));
            }
            _ => unreachable!(),
        }
    }
}

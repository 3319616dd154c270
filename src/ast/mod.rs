use id_arena::{Arena, Id};

pub type NodeId = Id<Node>;

/// Byte range into the original source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }
}

/// A lexical unit. `value` is the raw source slice, so punctuation tokens
/// compare directly against strings like `"("`.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
    /// 1-based line the token starts on.
    pub line: usize,
    /// 0-based column of the token's first character.
    pub column: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    String,
    Regex,
    Punctuator,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub(crate) parent: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    Instanceof,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    Or,
    And,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
    UnsignedShiftRightAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

/// One case per syntactic construct. The grammar is closed, so rule dispatch
/// over this enum is exhaustive by construction.
#[derive(Debug)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },

    // Statements
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    EmptyStatement,
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    WithStatement {
        object: NodeId,
        body: NodeId,
    },
    ReturnStatement {
        argument: Option<NodeId>,
    },
    ThrowStatement {
        argument: NodeId,
    },
    BreakStatement,
    ContinueStatement,
    FunctionDeclaration {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        generator: bool,
    },
    ClassDeclaration {
        id: Option<NodeId>,
        superclass: Option<NodeId>,
        body: Vec<NodeId>,
    },
    MethodDefinition {
        key: NodeId,
        value: NodeId,
    },

    // Expressions
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    ThisExpression,
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    AssignmentExpression {
        operator: AssignmentOp,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    LogicalExpression {
        operator: LogicalOp,
        left: NodeId,
        right: NodeId,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    UnaryExpression {
        operator: UnaryOp,
        argument: NodeId,
    },
    UpdateExpression {
        operator: UpdateOp,
        prefix: bool,
        argument: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
    },
    ArrayExpression {
        elements: Vec<NodeId>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    Property {
        key: NodeId,
        value: NodeId,
        computed: bool,
        shorthand: bool,
    },
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        generator: bool,
    },
    ArrowFunctionExpression {
        params: Vec<NodeId>,
        body: NodeId,
    },
    ClassExpression {
        id: Option<NodeId>,
        superclass: Option<NodeId>,
        body: Vec<NodeId>,
    },
    YieldExpression {
        argument: Option<NodeId>,
        delegate: bool,
    },
}

/// An immutable parsed source: the node arena, the full token sequence, and
/// parent back-references wired once at construction.
///
/// Parents are arena indices rather than owning links; ownership of the tree
/// is strictly top-down.
#[derive(Debug)]
pub struct SyntaxTree {
    arena: Arena<Node>,
    tokens: Vec<Token>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn new(mut arena: Arena<Node>, tokens: Vec<Token>, root: NodeId) -> Self {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            for child in children_of(&arena[id].kind) {
                arena[child].parent = Some(id);
                stack.push(child);
            }
        }

        SyntaxTree {
            arena,
            tokens,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        children_of(&self.arena[id].kind)
    }

    /// Visits every node top-down, left-to-right, starting at the root.
    pub fn visit<F: FnMut(NodeId)>(&self, callback: &mut F) {
        self.visit_from(self.root, callback);
    }

    fn visit_from<F: FnMut(NodeId)>(&self, id: NodeId, callback: &mut F) {
        callback(id);

        for child in self.children(id) {
            self.visit_from(child, callback);
        }
    }

    /// The `skip`th token strictly before the node's range, counting backwards
    /// from the token immediately preceding it.
    pub fn token_before(&self, id: NodeId, skip: usize) -> Option<&Token> {
        let start = self.arena[id].span.start;
        let first_inside = self
            .tokens
            .partition_point(|token| token.span.start < start);

        first_inside
            .checked_sub(1 + skip)
            .map(|index| &self.tokens[index])
    }

    /// The `skip`th token strictly after the node's range.
    pub fn token_after(&self, id: NodeId, skip: usize) -> Option<&Token> {
        let end = self.arena[id].span.end;
        let first_after = self.tokens.partition_point(|token| token.span.start < end);

        self.tokens.get(first_after + skip)
    }

    /// Up to `count` tokens from the start of the node's own range.
    pub fn first_tokens(&self, id: NodeId, count: usize) -> Vec<&Token> {
        let span = self.arena[id].span;
        let first_inside = self
            .tokens
            .partition_point(|token| token.span.start < span.start);

        self.tokens[first_inside..]
            .iter()
            .take_while(|token| token.span.end <= span.end)
            .take(count)
            .collect()
    }

    pub fn first_token(&self, id: NodeId) -> Option<&Token> {
        self.first_tokens(id, 1).first().copied()
    }
}

fn children_of(kind: &NodeKind) -> Vec<NodeId> {
    let mut children = Vec::new();

    match kind {
        NodeKind::Program { body } | NodeKind::BlockStatement { body } => {
            children.extend(body.iter().copied());
        }

        NodeKind::ExpressionStatement { expression } => children.push(*expression),

        NodeKind::EmptyStatement
        | NodeKind::BreakStatement
        | NodeKind::ContinueStatement
        | NodeKind::Identifier { .. }
        | NodeKind::Literal { .. }
        | NodeKind::ThisExpression => {}

        NodeKind::VariableDeclaration { declarations, .. } => {
            children.extend(declarations.iter().copied());
        }

        NodeKind::VariableDeclarator { id, init } => {
            children.push(*id);
            children.extend(init.iter().copied());
        }

        NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        } => {
            children.push(*test);
            children.push(*consequent);
            children.extend(alternate.iter().copied());
        }

        NodeKind::WhileStatement { test, body } => {
            children.push(*test);
            children.push(*body);
        }

        NodeKind::DoWhileStatement { body, test } => {
            children.push(*body);
            children.push(*test);
        }

        NodeKind::ForStatement {
            init,
            test,
            update,
            body,
        } => {
            children.extend(init.iter().copied());
            children.extend(test.iter().copied());
            children.extend(update.iter().copied());
            children.push(*body);
        }

        NodeKind::ForInStatement { left, right, body }
        | NodeKind::ForOfStatement { left, right, body } => {
            children.push(*left);
            children.push(*right);
            children.push(*body);
        }

        NodeKind::SwitchStatement {
            discriminant,
            cases,
        } => {
            children.push(*discriminant);
            children.extend(cases.iter().copied());
        }

        NodeKind::SwitchCase { test, consequent } => {
            children.extend(test.iter().copied());
            children.extend(consequent.iter().copied());
        }

        NodeKind::WithStatement { object, body } => {
            children.push(*object);
            children.push(*body);
        }

        NodeKind::ReturnStatement { argument } => {
            children.extend(argument.iter().copied());
        }

        NodeKind::ThrowStatement { argument } => children.push(*argument),

        NodeKind::FunctionDeclaration {
            id, params, body, ..
        }
        | NodeKind::FunctionExpression {
            id, params, body, ..
        } => {
            children.extend(id.iter().copied());
            children.extend(params.iter().copied());
            children.push(*body);
        }

        NodeKind::ClassDeclaration {
            id,
            superclass,
            body,
        }
        | NodeKind::ClassExpression {
            id,
            superclass,
            body,
        } => {
            children.extend(id.iter().copied());
            children.extend(superclass.iter().copied());
            children.extend(body.iter().copied());
        }

        NodeKind::MethodDefinition { key, value } => {
            children.push(*key);
            children.push(*value);
        }

        NodeKind::SequenceExpression { expressions } => {
            children.extend(expressions.iter().copied());
        }

        NodeKind::AssignmentExpression { left, right, .. }
        | NodeKind::LogicalExpression { left, right, .. }
        | NodeKind::BinaryExpression { left, right, .. } => {
            children.push(*left);
            children.push(*right);
        }

        NodeKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            children.push(*test);
            children.push(*consequent);
            children.push(*alternate);
        }

        NodeKind::UnaryExpression { argument, .. }
        | NodeKind::UpdateExpression { argument, .. } => children.push(*argument),

        NodeKind::CallExpression { callee, arguments }
        | NodeKind::NewExpression { callee, arguments } => {
            children.push(*callee);
            children.extend(arguments.iter().copied());
        }

        NodeKind::MemberExpression {
            object, property, ..
        } => {
            children.push(*object);
            children.push(*property);
        }

        NodeKind::ArrayExpression { elements } => {
            children.extend(elements.iter().copied());
        }

        NodeKind::ObjectExpression { properties } => {
            children.extend(properties.iter().copied());
        }

        NodeKind::Property { key, value, .. } => {
            children.push(*key);
            children.push(*value);
        }

        NodeKind::ArrowFunctionExpression { params, body } => {
            children.extend(params.iter().copied());
            children.push(*body);
        }

        NodeKind::YieldExpression { argument, .. } => {
            children.extend(argument.iter().copied());
        }
    }

    children
}

use std::rc::Rc;

use crate::value::{SourcePos, Value};

/// One declared lambda parameter. The default expression, if any, is
/// evaluated lazily in the callee environment at invocation time. A rest
/// parameter must be last and collects overflow positionals into a List.
#[derive(Debug, Clone)]
pub(crate) struct ParamDef {
    pub(crate) name: String,
    pub(crate) default: Option<Node>,
    pub(crate) rest: bool,
}

/// Parameter list plus body of a `fn` literal. Shared via Rc so every closure
/// created from the same literal reuses one body tree.
#[derive(Debug)]
pub(crate) struct LambdaDef {
    pub(crate) params: Vec<ParamDef>,
    pub(crate) body: Node,
}

/// One argument at a call site. `name` is set for `name=expr` arguments;
/// a `...expr` spread is represented by a `Node::Spread` value.
#[derive(Debug, Clone)]
pub(crate) struct CallArg {
    pub(crate) name: Option<String>,
    pub(crate) value: Node,
}

/// A `catch` clause of a block. `etype: None` is `catch all`.
#[derive(Debug, Clone)]
pub(crate) struct CatchClause {
    pub(crate) etype: Option<Node>,
    pub(crate) body: Node,
}

/// Which view of a Map/Object a `for` loop iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForWhat {
    Default,
    Keys,
    Values,
    Entries,
}

/// The closed AST node set. Nodes are immutable after construction, own
/// their children outright and carry the source position of their first
/// token for diagnostics.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Literal {
        value: Value,
        pos: SourcePos,
    },
    Identifier {
        name: String,
        pos: SourcePos,
    },
    Def {
        name: String,
        value: Box<Node>,
        pos: SourcePos,
    },
    DefDestructuring {
        names: Vec<String>,
        value: Box<Node>,
        pos: SourcePos,
    },
    Assign {
        name: String,
        value: Box<Node>,
        pos: SourcePos,
    },
    DestructuringAssign {
        names: Vec<String>,
        value: Box<Node>,
        pos: SourcePos,
    },
    Deref {
        base: Box<Node>,
        index: Box<Node>,
        default: Option<Box<Node>>,
        pos: SourcePos,
    },
    DerefAssign {
        base: Box<Node>,
        index: Box<Node>,
        value: Box<Node>,
        pos: SourcePos,
    },
    DerefSlice {
        base: Box<Node>,
        from: Option<Box<Node>>,
        to: Option<Box<Node>>,
        pos: SourcePos,
    },
    DerefInvoke {
        base: Box<Node>,
        member: String,
        args: Vec<CallArg>,
        pos: SourcePos,
    },
    Funcall {
        func: Box<Node>,
        args: Vec<CallArg>,
        pos: SourcePos,
    },
    Lambda {
        def: Rc<LambdaDef>,
        pos: SourcePos,
    },
    Block {
        statements: Vec<Node>,
        catches: Vec<CatchClause>,
        finally_stmts: Vec<Node>,
        pos: SourcePos,
    },
    If {
        branches: Vec<(Node, Node)>,
        else_branch: Option<Box<Node>>,
        pos: SourcePos,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
        pos: SourcePos,
    },
    For {
        idents: Vec<String>,
        what: ForWhat,
        source: Box<Node>,
        body: Box<Node>,
        pos: SourcePos,
    },
    ListLiteral {
        items: Vec<Node>,
        pos: SourcePos,
    },
    SetLiteral {
        items: Vec<Node>,
        pos: SourcePos,
    },
    MapLiteral {
        entries: Vec<(Node, Node)>,
        pos: SourcePos,
    },
    ObjectLiteral {
        entries: Vec<(String, Node)>,
        pos: SourcePos,
    },
    ListComprehension {
        expr: Box<Node>,
        var: String,
        source: Box<Node>,
        cond: Option<Box<Node>>,
        pos: SourcePos,
    },
    SetComprehension {
        expr: Box<Node>,
        var: String,
        source: Box<Node>,
        cond: Option<Box<Node>>,
        pos: SourcePos,
    },
    MapComprehension {
        key: Box<Node>,
        value: Box<Node>,
        var: String,
        source: Box<Node>,
        cond: Option<Box<Node>>,
        pos: SourcePos,
    },
    SetComprehensionProduct {
        expr: Box<Node>,
        var1: String,
        source1: Box<Node>,
        var2: String,
        source2: Box<Node>,
        cond: Option<Box<Node>>,
        pos: SourcePos,
    },
    MapComprehensionProduct {
        key: Box<Node>,
        value: Box<Node>,
        var1: String,
        source1: Box<Node>,
        var2: String,
        source2: Box<Node>,
        cond: Option<Box<Node>>,
        pos: SourcePos,
    },
    Spread {
        expr: Box<Node>,
        pos: SourcePos,
    },
    And {
        left: Box<Node>,
        right: Box<Node>,
        pos: SourcePos,
    },
    Or {
        left: Box<Node>,
        right: Box<Node>,
        pos: SourcePos,
    },
    Xor {
        left: Box<Node>,
        right: Box<Node>,
        pos: SourcePos,
    },
    Not {
        expr: Box<Node>,
        pos: SourcePos,
    },
    Return {
        expr: Option<Box<Node>>,
        pos: SourcePos,
    },
    Break {
        pos: SourcePos,
    },
    Continue {
        pos: SourcePos,
    },
    Raise {
        expr: Box<Node>,
        pos: SourcePos,
    },
    Require {
        spec: String,
        alias: Option<String>,
        pos: SourcePos,
    },
}

impl Node {
    pub(crate) fn pos(&self) -> &SourcePos {
        match self {
            Node::Literal { pos, .. }
            | Node::Identifier { pos, .. }
            | Node::Def { pos, .. }
            | Node::DefDestructuring { pos, .. }
            | Node::Assign { pos, .. }
            | Node::DestructuringAssign { pos, .. }
            | Node::Deref { pos, .. }
            | Node::DerefAssign { pos, .. }
            | Node::DerefSlice { pos, .. }
            | Node::DerefInvoke { pos, .. }
            | Node::Funcall { pos, .. }
            | Node::Lambda { pos, .. }
            | Node::Block { pos, .. }
            | Node::If { pos, .. }
            | Node::While { pos, .. }
            | Node::For { pos, .. }
            | Node::ListLiteral { pos, .. }
            | Node::SetLiteral { pos, .. }
            | Node::MapLiteral { pos, .. }
            | Node::ObjectLiteral { pos, .. }
            | Node::ListComprehension { pos, .. }
            | Node::SetComprehension { pos, .. }
            | Node::MapComprehension { pos, .. }
            | Node::SetComprehensionProduct { pos, .. }
            | Node::MapComprehensionProduct { pos, .. }
            | Node::Spread { pos, .. }
            | Node::And { pos, .. }
            | Node::Or { pos, .. }
            | Node::Xor { pos, .. }
            | Node::Not { pos, .. }
            | Node::Return { pos, .. }
            | Node::Break { pos }
            | Node::Continue { pos }
            | Node::Raise { pos, .. }
            | Node::Require { pos, .. } => pos,
        }
    }
}

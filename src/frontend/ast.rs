//! Declaration tree for Creed
//!
//! The tree is produced by the parser and never changes shape afterwards.
//! Declarations live in one arena per file and are addressed by [`DeclId`];
//! the resolver only flips their [`ResolutionState`] and fills in the
//! back-references of named types, both through `Cell`s so a shared borrow
//! of the file is enough for every pass.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PrimitiveType;
use crate::utils::Span;

/// Index of a declaration in its file's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub usize);

/// A complete compilation unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    /// Every declaration of the file, top-level and local
    pub declarations: Vec<Declaration>,
    /// Top-level declarations in document order
    pub items: Vec<DeclId>,
}

impl SourceFile {
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.0]
    }

    /// Top-level declarations in document order
    pub fn top_level(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.items.iter().map(move |&id| (id, self.decl(id)))
    }
}

/// Three-state marker used for cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionState {
    #[default]
    Uninitialized,
    Initializing,
    Initialized,
}

/// Named binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: Ident,
    pub kind: DeclKind,
    pub span: Span,
    /// Owned by the resolver; input always starts `Uninitialized`
    #[serde(default, skip_deserializing)]
    pub state: Cell<ResolutionState>,
}

impl Declaration {
    pub fn new(name: Ident, kind: DeclKind, span: Span) -> Self {
        Self { name, kind, span, state: Cell::new(ResolutionState::Uninitialized) }
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, DeclKind::Var(_))
    }

    /// True for constants initialized with a function literal
    pub fn is_function(&self) -> bool {
        matches!(
            &self.kind,
            DeclKind::Var(VarDecl::Constant { value: Expr::Function { .. }, .. })
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeclKind {
    Var(VarDecl),
    Enum { members: Vec<Ident> },
    Struct { members: Vec<Member> },
    Union { members: Vec<Member> },
    Sum { members: Vec<SumMember> },
}

impl DeclKind {
    /// Source keyword of the declaration kind
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Var(VarDecl::Constant { .. }) => "constant",
            DeclKind::Var(VarDecl::Mutable { .. }) => "variable",
            DeclKind::Enum { .. } => "enum",
            DeclKind::Struct { .. } => "struct",
            DeclKind::Union { .. } => "union",
            DeclKind::Sum { .. } => "sum",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VarDecl {
    /// `name :: value` or `name: type : value`
    Constant { ty: Option<Type>, value: Expr },
    /// `name: type` or `name: type = value`
    Mutable { ty: Type, value: Option<Expr> },
}

/// Struct or union member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub name: Ident,
    pub ty: Type,
    pub span: Span,
}

/// Sum type member, optionally carrying a payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumMember {
    pub name: Ident,
    pub ty: Option<Type>,
    pub span: Span,
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

// ==================== Types ====================

/// Type representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType, Span),
    /// `*T`
    Pointer(Box<Type>, Span),
    /// `?T`
    NullablePointer(Box<Type>, Span),
    /// `[]T`
    Array(Box<Type>, Span),
    /// Reference to a struct, union or enum by name
    Named(NamedType),
    Function(FunctionType),
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Primitive(_, s) => *s,
            Type::Pointer(_, s) => *s,
            Type::NullablePointer(_, s) => *s,
            Type::Array(_, s) => *s,
            Type::Named(named) => named.name.span,
            Type::Function(func) => func.span,
        }
    }
}

impl fmt::Display for Type {
    /// Source-language spelling, used in diagnostics and logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p, _) => f.write_str(p.keyword()),
            Type::Pointer(base, _) => write!(f, "*{}", base),
            Type::NullablePointer(base, _) => write!(f, "?{}", base),
            Type::Array(elem, _) => write!(f, "[]{}", elem),
            Type::Named(named) => f.write_str(&named.name.name),
            Type::Function(func) => {
                f.write_str("(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", param.name.name, param.ty)?;
                }
                write!(f, ") {}", func.result)
            }
        }
    }
}

/// Named type reference; `resolved` is filled in by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedType {
    pub name: Ident,
    #[serde(default, skip_deserializing)]
    pub resolved: Cell<Option<DeclId>>,
}

impl NamedType {
    pub fn new(name: Ident) -> Self {
        Self { name, resolved: Cell::new(None) }
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Param>,
    pub result: Box<Type>,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
    pub span: Span,
}

// ==================== Expressions ====================

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Explicitly parenthesized expression
    Paren {
        expr: Box<Expr>,
        span: Span,
    },
    /// Unary operation
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    /// Binary operation
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    /// Cast (expr as Type)
    Cast {
        expr: Box<Expr>,
        ty: Type,
        span: Span,
    },
    /// Member access (expr.member)
    Field {
        expr: Box<Expr>,
        field: Ident,
        span: Span,
    },
    /// Index access (expr[index])
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// Function literal: signature plus body
    Function {
        ty: FunctionType,
        body: Box<Scope>,
        span: Span,
    },
    /// Function call
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// Identifier
    Ident(Ident),
    /// Literal value
    Literal(Literal),
    /// `true` / `false`
    Bool(bool, Span),
    /// Array literal `[count T: a, b, c]`
    Array {
        count: Option<Box<Expr>>,
        elem_ty: Type,
        elements: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Paren { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Field { span, .. }
            | Expr::Index { span, .. }
            | Expr::Function { span, .. }
            | Expr::Call { span, .. }
            | Expr::Array { span, .. } => *span,
            Expr::Ident(ident) => ident.span,
            Expr::Literal(lit) => lit.span,
            Expr::Bool(_, span) => *span,
        }
    }
}

/// Literal value with its source width and signedness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    String(String),
    Char(u8),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl LiteralValue {
    /// Primitive type of a numeric or char literal; strings have none
    pub fn primitive(&self) -> Option<PrimitiveType> {
        Some(match self {
            LiteralValue::String(_) => return None,
            LiteralValue::Char(_) => PrimitiveType::Char,
            LiteralValue::I8(_) => PrimitiveType::I8,
            LiteralValue::I16(_) => PrimitiveType::I16,
            LiteralValue::I32(_) => PrimitiveType::I32,
            LiteralValue::I64(_) => PrimitiveType::I64,
            LiteralValue::U8(_) => PrimitiveType::U8,
            LiteralValue::U16(_) => PrimitiveType::U16,
            LiteralValue::U32(_) => PrimitiveType::U32,
            LiteralValue::U64(_) => PrimitiveType::U64,
            LiteralValue::F32(_) => PrimitiveType::F32,
            LiteralValue::F64(_) => PrimitiveType::F64,
        })
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// Logical not (!)
    Not,
    /// Bitwise not (~)
    BitNot,
    /// Negation (-)
    Neg,
    /// Dereference (*)
    Deref,
    /// Address-of (&)
    Ref,
}

/// Binary operator, in the order of the operator-symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Assignment operator, in the order of the assignment-operator table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AndAssign,
    OrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

// ==================== Statements & Scopes ====================

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Local declaration, stored in the file arena
    Declaration(DeclId, Span),
    /// `++expr`
    Increment(Expr, Span),
    /// `--expr`
    Decrement(Expr, Span),
    /// `target op value`
    Assign {
        op: AssignOp,
        target: Expr,
        value: Expr,
        span: Span,
    },
    /// Expression statement
    Expr(Expr),
    /// `label name`
    Label(Ident),
    /// `goto name`
    Goto(Ident),
    /// `return [expr]`
    Return {
        value: Option<Expr>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declaration(_, span)
            | Stmt::Increment(_, span)
            | Stmt::Decrement(_, span)
            | Stmt::Assign { span, .. }
            | Stmt::Return { span, .. } => *span,
            Stmt::Expr(expr) => expr.span(),
            Stmt::Label(ident) | Stmt::Goto(ident) => ident.span,
        }
    }
}

/// Structural unit of control flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scope {
    /// A single statement terminated by `;`
    Statement(Stmt),
    /// `{ ... }`
    Block {
        scopes: Vec<Scope>,
        span: Span,
    },
    /// `if cond then [else otherwise]`; `otherwise` may itself be a
    /// conditional, which forms an else-if chain
    Conditional {
        cond: Expr,
        then_scope: Box<Scope>,
        else_scope: Option<Box<Scope>>,
        span: Span,
    },
    /// `for init; cond; step body`
    For {
        init: Stmt,
        cond: Expr,
        step: Stmt,
        body: Box<Scope>,
        span: Span,
    },
    /// `while cond body`
    While {
        cond: Expr,
        body: Box<Scope>,
        span: Span,
    },
    /// `for element in iterable body`
    ForEach {
        element: Ident,
        iterable: Expr,
        body: Box<Scope>,
        span: Span,
    },
    /// `match expr { | case -> scopes ... }`
    Match {
        expr: Expr,
        cases: Vec<MatchCase>,
        span: Span,
    },
}

impl Scope {
    pub fn span(&self) -> Span {
        match self {
            Scope::Statement(stmt) => stmt.span(),
            Scope::Block { span, .. }
            | Scope::Conditional { span, .. }
            | Scope::For { span, .. }
            | Scope::While { span, .. }
            | Scope::ForEach { span, .. }
            | Scope::Match { span, .. } => *span,
        }
    }
}

/// One `| name -> ...` arm of a match scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCase {
    pub name: Ident,
    pub scopes: Vec<Scope>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Type {
        Type::Named(NamedType::new(Ident::new(name, Span::dummy())))
    }

    #[test]
    fn test_type_display_uses_source_syntax() {
        let span = Span::dummy();
        let ty = Type::Pointer(
            Box::new(Type::Array(Box::new(Type::Primitive(PrimitiveType::I64, span)), span)),
            span,
        );
        assert_eq!(ty.to_string(), "*[]int64");
        assert_eq!(Type::NullablePointer(Box::new(named("Node")), span).to_string(), "?Node");
    }

    #[test]
    fn test_declaration_starts_uninitialized() {
        let decl = Declaration::new(
            Ident::new("Point", Span::dummy()),
            DeclKind::Struct { members: vec![] },
            Span::dummy(),
        );
        assert_eq!(decl.state.get(), ResolutionState::Uninitialized);
        assert!(!decl.is_var());
        assert_eq!(decl.kind.keyword(), "struct");
    }

    #[test]
    fn test_tree_deserializes_without_resolution_fields() {
        let json = r#"{
            "declarations": [{
                "name": { "name": "p", "span": { "line": 1, "column": 1, "end_line": 1, "end_column": 2 } },
                "kind": { "Var": { "Mutable": {
                    "ty": { "Named": { "name": { "name": "Point", "span": { "line": 1, "column": 4, "end_line": 1, "end_column": 9 } } } },
                    "value": null
                } } },
                "span": { "line": 1, "column": 1, "end_line": 1, "end_column": 9 }
            }],
            "items": [0]
        }"#;
        let file: SourceFile = serde_json::from_str(json).unwrap();
        let decl = file.decl(DeclId(0));
        assert_eq!(decl.state.get(), ResolutionState::Uninitialized);
        match &decl.kind {
            DeclKind::Var(VarDecl::Mutable { ty: Type::Named(named), value: None }) => {
                assert_eq!(named.name.name, "Point");
                assert_eq!(named.resolved.get(), None);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}

//! Programmatic construction of declaration trees
//!
//! Fixtures and tests build their input with these helpers instead of going
//! through a parser. Every node gets a dummy span.

use crate::frontend::ast::*;
use crate::types::PrimitiveType;
use crate::utils::Span;

/// Helper to build a [`SourceFile`]
pub struct SourceFileBuilder {
    file: SourceFile,
}

impl SourceFileBuilder {
    pub fn new() -> Self {
        Self { file: SourceFile::default() }
    }

    /// Allocates a top-level declaration
    pub fn item(&mut self, decl: Declaration) -> DeclId {
        let id = self.local(decl);
        self.file.items.push(id);
        id
    }

    /// Allocates a declaration that a `Stmt::Declaration` will refer to
    pub fn local(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.file.declarations.len());
        self.file.declarations.push(decl);
        id
    }

    /// Consumes the builder and returns the file
    pub fn finish(self) -> SourceFile {
        self.file
    }
}

impl Default for SourceFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn sp() -> Span {
    Span::dummy()
}

pub fn ident(name: &str) -> Ident {
    Ident::new(name, sp())
}

// ==================== Types ====================

pub fn prim(p: PrimitiveType) -> Type {
    Type::Primitive(p, sp())
}

pub fn int() -> Type {
    prim(PrimitiveType::I32)
}

pub fn named(name: &str) -> Type {
    Type::Named(NamedType::new(ident(name)))
}

pub fn ptr(base: Type) -> Type {
    Type::Pointer(Box::new(base), sp())
}

pub fn nullable(base: Type) -> Type {
    Type::NullablePointer(Box::new(base), sp())
}

pub fn array(elem: Type) -> Type {
    Type::Array(Box::new(elem), sp())
}

pub fn fn_type(params: Vec<(&str, Type)>, result: Type) -> FunctionType {
    FunctionType {
        params: params
            .into_iter()
            .map(|(name, ty)| Param { name: ident(name), ty, span: sp() })
            .collect(),
        result: Box::new(result),
        span: sp(),
    }
}

// ==================== Declarations ====================

pub fn constant(name: &str, ty: Option<Type>, value: Expr) -> Declaration {
    Declaration::new(ident(name), DeclKind::Var(VarDecl::Constant { ty, value }), sp())
}

pub fn mutable(name: &str, ty: Type, value: Option<Expr>) -> Declaration {
    Declaration::new(ident(name), DeclKind::Var(VarDecl::Mutable { ty, value }), sp())
}

/// `name :: (params) result body`
pub fn function(name: &str, params: Vec<(&str, Type)>, result: Type, body: Scope) -> Declaration {
    constant(name, None, func_lit(fn_type(params, result), body))
}

fn members(members: Vec<(&str, Type)>) -> Vec<Member> {
    members
        .into_iter()
        .map(|(name, ty)| Member { name: ident(name), ty, span: sp() })
        .collect()
}

pub fn structure(name: &str, fields: Vec<(&str, Type)>) -> Declaration {
    Declaration::new(ident(name), DeclKind::Struct { members: members(fields) }, sp())
}

pub fn union(name: &str, fields: Vec<(&str, Type)>) -> Declaration {
    Declaration::new(ident(name), DeclKind::Union { members: members(fields) }, sp())
}

pub fn enumeration(name: &str, variants: &[&str]) -> Declaration {
    let members = variants.iter().map(|v| ident(v)).collect();
    Declaration::new(ident(name), DeclKind::Enum { members }, sp())
}

pub fn sum(name: &str, variants: Vec<(&str, Option<Type>)>) -> Declaration {
    let members = variants
        .into_iter()
        .map(|(name, ty)| SumMember { name: ident(name), ty, span: sp() })
        .collect();
    Declaration::new(ident(name), DeclKind::Sum { members }, sp())
}

// ==================== Expressions ====================

pub fn id(name: &str) -> Expr {
    Expr::Ident(ident(name))
}

pub fn lit(value: LiteralValue) -> Expr {
    Expr::Literal(Literal { value, span: sp() })
}

pub fn int_lit(value: i32) -> Expr {
    lit(LiteralValue::I32(value))
}

pub fn boolean(value: bool) -> Expr {
    Expr::Bool(value, sp())
}

pub fn paren(expr: Expr) -> Expr {
    Expr::Paren { expr: Box::new(expr), span: sp() }
}

pub fn unary(op: UnOp, expr: Expr) -> Expr {
    Expr::Unary { op, expr: Box::new(expr), span: sp() }
}

pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary { left: Box::new(left), op, right: Box::new(right), span: sp() }
}

pub fn cast(expr: Expr, ty: Type) -> Expr {
    Expr::Cast { expr: Box::new(expr), ty, span: sp() }
}

pub fn field(expr: Expr, name: &str) -> Expr {
    Expr::Field { expr: Box::new(expr), field: ident(name), span: sp() }
}

pub fn index(expr: Expr, idx: Expr) -> Expr {
    Expr::Index { expr: Box::new(expr), index: Box::new(idx), span: sp() }
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call { func: Box::new(func), args, span: sp() }
}

pub fn func_lit(ty: FunctionType, body: Scope) -> Expr {
    Expr::Function { ty, body: Box::new(body), span: sp() }
}

pub fn array_lit(count: Option<Expr>, elem_ty: Type, elements: Vec<Expr>) -> Expr {
    Expr::Array { count: count.map(Box::new), elem_ty, elements, span: sp() }
}

// ==================== Statements & Scopes ====================

pub fn assign(op: AssignOp, target: Expr, value: Expr) -> Stmt {
    Stmt::Assign { op, target, value, span: sp() }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return { value, span: sp() }
}

pub fn decl_stmt(id: DeclId) -> Stmt {
    Stmt::Declaration(id, sp())
}

pub fn increment(expr: Expr) -> Stmt {
    Stmt::Increment(expr, sp())
}

pub fn decrement(expr: Expr) -> Stmt {
    Stmt::Decrement(expr, sp())
}

pub fn label(name: &str) -> Stmt {
    Stmt::Label(ident(name))
}

pub fn goto(name: &str) -> Stmt {
    Stmt::Goto(ident(name))
}

pub fn stmt(stmt: Stmt) -> Scope {
    Scope::Statement(stmt)
}

pub fn block(scopes: Vec<Scope>) -> Scope {
    Scope::Block { scopes, span: sp() }
}

pub fn if_else(cond: Expr, then_scope: Scope, else_scope: Option<Scope>) -> Scope {
    Scope::Conditional {
        cond,
        then_scope: Box::new(then_scope),
        else_scope: else_scope.map(Box::new),
        span: sp(),
    }
}

pub fn for_loop(init: Stmt, cond: Expr, step: Stmt, body: Scope) -> Scope {
    Scope::For { init, cond, step, body: Box::new(body), span: sp() }
}

pub fn while_loop(cond: Expr, body: Scope) -> Scope {
    Scope::While { cond, body: Box::new(body), span: sp() }
}

pub fn for_each(element: &str, iterable: Expr, body: Scope) -> Scope {
    Scope::ForEach { element: ident(element), iterable, body: Box::new(body), span: sp() }
}

pub fn match_scope(expr: Expr, cases: Vec<(&str, Vec<Scope>)>) -> Scope {
    let cases = cases
        .into_iter()
        .map(|(name, scopes)| MatchCase { name: ident(name), scopes, span: sp() })
        .collect();
    Scope::Match { expr, cases, span: sp() }
}

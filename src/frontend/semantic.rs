//! Semantic Analysis for Creed
//!
//! Performs:
//! - Symbol table management (scope-local tables chained to their parent)
//! - Named type resolution, with duplicate and cycle detection

use std::hash::{Hash, Hasher};

use log::{debug, trace};
use rustc_hash::FxHasher;

use crate::frontend::ast::*;
use crate::utils::{Error, Result};

// ==================== Symbol Table ====================

/// Number of buckets in every scope-local table
pub const BUCKET_COUNT: usize = 64;

/// Scope-local registry of declarations.
///
/// The table only indexes declarations; the file arena owns them. Lookups
/// that miss locally continue in the enclosing table, so inner scopes shadow
/// outer ones.
pub struct SymbolTable<'a> {
    buckets: Vec<Vec<(DeclId, &'a Declaration)>>,
    parent: Option<&'a SymbolTable<'a>>,
}

impl<'a> SymbolTable<'a> {
    /// Create a root table
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            parent: None,
        }
    }

    /// Create a table for a scope nested in `parent`
    pub fn with_parent(parent: &'a SymbolTable<'a>) -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            parent: Some(parent),
        }
    }

    fn bucket(name: &str) -> usize {
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        (hasher.finish() % BUCKET_COUNT as u64) as usize
    }

    /// Add a declaration to this scope. Returns false, leaving the table
    /// untouched, if this scope already holds a declaration of that name.
    pub fn insert(&mut self, id: DeclId, decl: &'a Declaration) -> bool {
        let bucket = &mut self.buckets[Self::bucket(&decl.name.name)];
        if bucket.iter().any(|(_, existing)| existing.name.name == decl.name.name) {
            trace!("symbol table: `{}` already declared", decl.name.name);
            return false;
        }
        trace!("symbol table: declared `{}`", decl.name.name);
        bucket.push((id, decl));
        true
    }

    /// Look up a name in this scope only
    pub fn lookup_local(&self, name: &str) -> Option<DeclId> {
        self.buckets[Self::bucket(name)]
            .iter()
            .find(|(_, decl)| decl.name.name == name)
            .map(|(id, _)| *id)
    }

    /// Look up a name, searching from this scope outward
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        let mut table = Some(self);
        while let Some(current) = table {
            if let Some(id) = current.lookup_local(name) {
                return Some(id);
            }
            table = current.parent;
        }
        None
    }

    /// Number of declarations in this scope
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

impl Default for SymbolTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Type Resolver ====================

/// How a named type is reached from the declaration being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Stored inline: the target must be complete first
    ByValue,
    /// Behind a pointer: the target only has to exist
    Indirect,
}

/// Resolves every declaration of a file
pub fn resolve_file(file: &SourceFile) -> Result<()> {
    Resolver::new(file).resolve_all()
}

/// Links named types to their declarations and checks declaration shapes.
///
/// Resolution is a depth-first walk using each declaration's
/// [`ResolutionState`] as a white/gray/black mark: meeting a declaration that
/// is still `Initializing` means the walk came back around a cycle.
pub struct Resolver<'a> {
    file: &'a SourceFile,
}

impl<'a> Resolver<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Self { file }
    }

    /// Resolve the whole file: register top-level names, then resolve type
    /// declarations before variable declarations.
    pub fn resolve_all(&self) -> Result<()> {
        let mut globals = SymbolTable::new();
        for &id in &self.file.items {
            self.declare(&mut globals, id)?;
        }
        debug!("root scope holds {} declarations", globals.len());

        let (vars, types): (Vec<_>, Vec<_>) = self
            .file
            .top_level()
            .partition(|(_, decl)| decl.is_var());
        for (id, _) in types.into_iter().chain(vars) {
            self.resolve(&globals, id)?;
        }
        Ok(())
    }

    fn declare<'t>(&self, table: &mut SymbolTable<'t>, id: DeclId) -> Result<()>
    where
        'a: 't,
    {
        let decl = self.file.decl(id);
        if decl.name.name.is_empty() {
            return Err(Error::MissingIdentifier { span: decl.span });
        }
        if !table.insert(id, decl) {
            return Err(Error::DuplicateDeclaration {
                name: decl.name.name.clone(),
                span: decl.span,
            });
        }
        Ok(())
    }

    /// Resolve one declaration, looking names up in `table`.
    ///
    /// Idempotent: an `Initialized` declaration is left alone.
    pub fn resolve(&self, table: &SymbolTable<'_>, id: DeclId) -> Result<()> {
        let decl = self.file.decl(id);
        match decl.state.get() {
            ResolutionState::Initialized => return Ok(()),
            ResolutionState::Initializing => {
                return Err(Error::CircularTypeReference {
                    name: decl.name.name.clone(),
                    span: decl.span,
                });
            }
            ResolutionState::Uninitialized => {}
        }
        if decl.name.name.is_empty() {
            return Err(Error::MissingIdentifier { span: decl.span });
        }

        debug!("resolving {} `{}`", decl.kind.keyword(), decl.name.name);
        match &decl.kind {
            DeclKind::Enum { .. } | DeclKind::Sum { .. } => {
                return Err(Error::UnsupportedDeclarationKind {
                    kind: decl.kind.keyword(),
                    name: decl.name.name.clone(),
                    span: decl.span,
                });
            }
            DeclKind::Struct { members } | DeclKind::Union { members } => {
                decl.state.set(ResolutionState::Initializing);
                trace!("`{}` -> Initializing", decl.name.name);
                for member in members {
                    self.resolve_type(table, &member.ty, Reach::ByValue)?;
                }
                check_duplicate_members(decl, members)?;
            }
            DeclKind::Var(var) => {
                decl.state.set(ResolutionState::Initializing);
                trace!("`{}` -> Initializing", decl.name.name);
                self.resolve_var(table, var)?;
            }
        }

        decl.state.set(ResolutionState::Initialized);
        trace!("`{}` -> Initialized", decl.name.name);
        Ok(())
    }

    fn resolve_type(&self, table: &SymbolTable<'_>, ty: &Type, reach: Reach) -> Result<()> {
        match ty {
            Type::Primitive(..) => Ok(()),
            Type::Pointer(base, _) | Type::NullablePointer(base, _) => {
                self.resolve_type(table, base, Reach::Indirect)
            }
            Type::Array(elem, _) => self.resolve_type(table, elem, reach),
            Type::Named(named) => self.link(table, named, reach),
            Type::Function(func) => self.resolve_signature(table, func),
        }
    }

    fn resolve_signature(&self, table: &SymbolTable<'_>, func: &FunctionType) -> Result<()> {
        for param in &func.params {
            self.resolve_type(table, &param.ty, Reach::Indirect)?;
        }
        self.resolve_type(table, &func.result, Reach::Indirect)
    }

    /// Fill in the back-reference of a named type
    fn link(&self, table: &SymbolTable<'_>, named: &NamedType, reach: Reach) -> Result<()> {
        let name = &named.name.name;
        let Some(target) = table.lookup(name) else {
            return Err(Error::UnknownType { name: name.clone(), span: named.name.span });
        };
        if self.file.decl(target).is_var() {
            return Err(Error::NotAType { name: name.clone(), span: named.name.span });
        }
        trace!("linked `{}` -> {:?} ({:?})", name, target, reach);
        if reach == Reach::ByValue {
            self.resolve(table, target)?;
        }
        named.resolved.set(Some(target));
        Ok(())
    }

    fn resolve_var(&self, table: &SymbolTable<'_>, var: &'a VarDecl) -> Result<()> {
        match var {
            VarDecl::Constant { ty, value } => {
                if let Some(ty) = ty {
                    self.resolve_type(table, ty, Reach::ByValue)?;
                }
                self.resolve_expr(table, value)
            }
            VarDecl::Mutable { ty, value } => {
                self.resolve_type(table, ty, Reach::ByValue)?;
                match value {
                    Some(value) => self.resolve_expr(table, value),
                    None => Ok(()),
                }
            }
        }
    }

    fn resolve_expr(&self, table: &SymbolTable<'_>, expr: &'a Expr) -> Result<()> {
        match expr {
            Expr::Paren { expr, .. } | Expr::Unary { expr, .. } | Expr::Field { expr, .. } => {
                self.resolve_expr(table, expr)
            }
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(table, left)?;
                self.resolve_expr(table, right)
            }
            Expr::Cast { expr, ty, .. } => {
                self.resolve_type(table, ty, Reach::ByValue)?;
                self.resolve_expr(table, expr)
            }
            Expr::Index { expr, index, .. } => {
                self.resolve_expr(table, expr)?;
                self.resolve_expr(table, index)
            }
            Expr::Call { func, args, .. } => {
                self.resolve_expr(table, func)?;
                args.iter().try_for_each(|arg| self.resolve_expr(table, arg))
            }
            Expr::Function { ty, body, .. } => self.resolve_function(table, ty, body),
            Expr::Array { count, elem_ty, elements, .. } => {
                self.resolve_type(table, elem_ty, Reach::ByValue)?;
                if let Some(count) = count {
                    self.resolve_expr(table, count)?;
                }
                elements.iter().try_for_each(|e| self.resolve_expr(table, e))
            }
            Expr::Ident(_) | Expr::Literal(_) | Expr::Bool(..) => Ok(()),
        }
    }

    fn resolve_function(
        &self,
        table: &SymbolTable<'_>,
        ty: &'a FunctionType,
        body: &'a Scope,
    ) -> Result<()> {
        self.resolve_signature(table, ty)?;
        for (i, param) in ty.params.iter().enumerate() {
            if ty.params[..i].iter().any(|p| p.name.name == param.name.name) {
                return Err(Error::DuplicateDeclaration {
                    name: param.name.name.clone(),
                    span: param.span,
                });
            }
        }
        // C puts the parameters and the outermost body block in one scope
        let outermost = match body {
            Scope::Block { scopes, .. } => scopes.as_slice(),
            single => std::slice::from_ref(single),
        };
        for scope in outermost {
            if let Scope::Statement(Stmt::Declaration(id, span)) = scope {
                let name = &self.file.decl(*id).name.name;
                if ty.params.iter().any(|p| &p.name.name == name) {
                    return Err(Error::DuplicateDeclaration { name: name.clone(), span: *span });
                }
            }
        }
        let mut locals = SymbolTable::with_parent(table);
        self.resolve_scope(&mut locals, body)
    }

    fn resolve_scope<'t>(&self, table: &mut SymbolTable<'t>, scope: &'a Scope) -> Result<()>
    where
        'a: 't,
    {
        match scope {
            Scope::Statement(stmt) => self.resolve_stmt(table, stmt),
            Scope::Block { scopes, .. } => {
                let mut locals = SymbolTable::with_parent(table);
                scopes.iter().try_for_each(|s| self.resolve_scope(&mut locals, s))
            }
            Scope::Conditional { cond, then_scope, else_scope, .. } => {
                self.resolve_expr(table, cond)?;
                self.resolve_scope(table, then_scope)?;
                match else_scope {
                    Some(else_scope) => self.resolve_scope(table, else_scope),
                    None => Ok(()),
                }
            }
            Scope::For { init, cond, step, body, .. } => {
                let mut locals = SymbolTable::with_parent(table);
                self.resolve_stmt(&mut locals, init)?;
                self.resolve_expr(&locals, cond)?;
                self.resolve_stmt(&mut locals, step)?;
                self.resolve_scope(&mut locals, body)
            }
            Scope::While { cond, body, .. } => {
                self.resolve_expr(table, cond)?;
                self.resolve_scope(table, body)
            }
            Scope::ForEach { span, .. } => Err(Error::unsupported("for-each loop", *span)),
            Scope::Match { span, .. } => Err(Error::unsupported("match scope", *span)),
        }
    }

    fn resolve_stmt<'t>(&self, table: &mut SymbolTable<'t>, stmt: &'a Stmt) -> Result<()>
    where
        'a: 't,
    {
        match stmt {
            Stmt::Declaration(id, _) => {
                self.declare(table, *id)?;
                self.resolve(table, *id)
            }
            Stmt::Increment(expr, _) | Stmt::Decrement(expr, _) | Stmt::Expr(expr) => {
                self.resolve_expr(table, expr)
            }
            Stmt::Assign { target, value, .. } => {
                self.resolve_expr(table, target)?;
                self.resolve_expr(table, value)
            }
            Stmt::Return { value: Some(value), .. } => self.resolve_expr(table, value),
            Stmt::Return { value: None, .. } | Stmt::Label(_) | Stmt::Goto(_) => Ok(()),
        }
    }
}

/// Pairwise check for repeated member names
fn check_duplicate_members(decl: &Declaration, members: &[Member]) -> Result<()> {
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|prev| prev.name.name == member.name.name) {
            return Err(Error::DuplicateMember {
                owner: decl.name.name.clone(),
                name: member.name.name.clone(),
                span: member.span,
            });
        }
    }
    Ok(())
}

//! Compilation driver
//!
//! Glue between the CLI and the passes: load a declaration tree, resolve
//! it, generate C and commit the output file.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::backend::{CCodeGen, CodeGen};
use crate::feedback::CompilationStats;
use crate::frontend::ast::*;
use crate::frontend::semantic::resolve_file;
use crate::utils::{Error, Result};

/// Compilation options
#[derive(Debug, Clone)]
pub struct Options {
    /// Run type resolution before generation
    pub resolve: bool,
    /// Prefix the output with a generated-by comment
    pub banner: bool,
    /// Output path; defaults to the input path with the backend's extension
    pub output: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self { resolve: true, banner: false, output: None }
    }
}

/// Result of a successful build
#[derive(Debug)]
pub struct Build {
    pub output: PathBuf,
    pub stats: CompilationStats,
}

// ==================== Input ====================

/// Read a JSON declaration tree from disk
pub fn load_source_file(path: &Path) -> Result<SourceFile> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
    parse_source_file(&text)
}

/// Parse a JSON declaration tree and check its arena indices
pub fn parse_source_file(text: &str) -> Result<SourceFile> {
    let file: SourceFile =
        serde_json::from_str(text).map_err(|e| Error::InvalidInput(e.to_string()))?;
    validate(&file)?;
    debug!(
        "loaded {} declarations ({} top-level)",
        file.declarations.len(),
        file.items.len()
    );
    Ok(file)
}

/// Every `DeclId` in the file must index its arena
fn validate(file: &SourceFile) -> Result<()> {
    let mut ids = file.items.clone();
    for decl in &file.declarations {
        match &decl.kind {
            DeclKind::Var(VarDecl::Constant { value, .. }) => expr_ids(value, &mut ids),
            DeclKind::Var(VarDecl::Mutable { value: Some(value), .. }) => expr_ids(value, &mut ids),
            _ => {}
        }
    }
    match ids.into_iter().find(|id| id.0 >= file.declarations.len()) {
        Some(id) => Err(Error::InvalidInput(format!(
            "declaration index {} out of range ({} declarations)",
            id.0,
            file.declarations.len()
        ))),
        None => Ok(()),
    }
}

fn expr_ids(expr: &Expr, ids: &mut Vec<DeclId>) {
    match expr {
        Expr::Paren { expr, .. }
        | Expr::Unary { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Field { expr, .. } => expr_ids(expr, ids),
        Expr::Binary { left, right, .. } | Expr::Index { expr: left, index: right, .. } => {
            expr_ids(left, ids);
            expr_ids(right, ids);
        }
        Expr::Function { body, .. } => scope_ids(body, ids),
        Expr::Call { func, args, .. } => {
            expr_ids(func, ids);
            args.iter().for_each(|arg| expr_ids(arg, ids));
        }
        Expr::Array { count, elements, .. } => {
            if let Some(count) = count {
                expr_ids(count, ids);
            }
            elements.iter().for_each(|e| expr_ids(e, ids));
        }
        Expr::Ident(_) | Expr::Literal(_) | Expr::Bool(..) => {}
    }
}

fn stmt_ids(stmt: &Stmt, ids: &mut Vec<DeclId>) {
    match stmt {
        // the declaration's own initializer is visited from the arena
        Stmt::Declaration(id, _) => ids.push(*id),
        Stmt::Increment(expr, _) | Stmt::Decrement(expr, _) | Stmt::Expr(expr) => {
            expr_ids(expr, ids)
        }
        Stmt::Assign { target, value, .. } => {
            expr_ids(target, ids);
            expr_ids(value, ids);
        }
        Stmt::Return { value: Some(value), .. } => expr_ids(value, ids),
        Stmt::Return { value: None, .. } | Stmt::Label(_) | Stmt::Goto(_) => {}
    }
}

fn scope_ids(scope: &Scope, ids: &mut Vec<DeclId>) {
    match scope {
        Scope::Statement(stmt) => stmt_ids(stmt, ids),
        Scope::Block { scopes, .. } => scopes.iter().for_each(|s| scope_ids(s, ids)),
        Scope::Conditional { cond, then_scope, else_scope, .. } => {
            expr_ids(cond, ids);
            scope_ids(then_scope, ids);
            if let Some(else_scope) = else_scope {
                scope_ids(else_scope, ids);
            }
        }
        Scope::For { init, cond, step, body, .. } => {
            stmt_ids(init, ids);
            expr_ids(cond, ids);
            stmt_ids(step, ids);
            scope_ids(body, ids);
        }
        Scope::While { cond, body, .. } => {
            expr_ids(cond, ids);
            scope_ids(body, ids);
        }
        Scope::ForEach { iterable, body, .. } => {
            expr_ids(iterable, ids);
            scope_ids(body, ids);
        }
        Scope::Match { expr, cases, .. } => {
            expr_ids(expr, ids);
            cases
                .iter()
                .flat_map(|case| &case.scopes)
                .for_each(|s| scope_ids(s, ids));
        }
    }
}

// ==================== Pipeline ====================

/// Resolve (unless disabled) and generate C for a file
pub fn compile(file: &SourceFile, options: &Options) -> Result<String> {
    if options.resolve {
        resolve_file(file)?;
    } else {
        info!("type resolution skipped");
    }
    let mut backend = CCodeGen::new().with_banner(options.banner);
    debug!("generating with the {} backend", backend.name());
    backend.generate(file)
}

/// Where the output of `input` goes
pub fn output_path(input: &Path, options: &Options) -> PathBuf {
    options
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension(CCodeGen::new().extension()))
}

/// Write `text` to `path` in one step: the text goes to a temporary file in
/// the same directory, which then replaces `path`.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.persist(path).map_err(|e| Error::from(e.error))?;
    info!("wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

/// Load, compile and write one file. Nothing is written unless every pass
/// succeeds.
pub fn build(input: &Path, options: &Options) -> Result<Build> {
    let start = Instant::now();
    let file = load_source_file(input)?;
    let text = compile(&file, options)?;
    let output = output_path(input, options);
    write_output(&output, &text)?;

    let mut stats = CompilationStats::of(&file);
    stats.output_bytes = text.len();
    stats.total_time_ms = start.elapsed().as_millis() as u64;
    Ok(Build { output, stats })
}

/// Load and resolve one file without generating anything
pub fn check(input: &Path) -> Result<CompilationStats> {
    let file = load_source_file(input)?;
    resolve_file(&file)?;
    Ok(CompilationStats::of(&file))
}

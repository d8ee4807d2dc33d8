//! C Code Generator
//!
//! Lowers a (resolved) Creed declaration tree to C source text.
//!
//! Type declarations are written before variable declarations so that
//! functions and globals can name every struct, union and enum without
//! forward declarations. Indentation is passed down explicitly; the
//! generator keeps no state between calls.

use log::{debug, trace};

use crate::backend::codegen::CodeGen;
use crate::frontend::ast::*;
use crate::utils::{Error, Result, Span};

/// One level of indentation
const INDENT: &str = "    ";

/// Comment written at the top of the file when the banner is enabled
const BANNER: &str = "/* Generated by creedc */";

/// C code generator
pub struct CCodeGen {
    banner: bool,
}

impl CCodeGen {
    pub fn new() -> Self {
        Self { banner: false }
    }

    /// Prefix the output with [`BANNER`]
    pub fn with_banner(mut self, banner: bool) -> Self {
        self.banner = banner;
        self
    }

    /// Generate the complete C source file
    pub fn generate_source(&self, file: &SourceFile) -> Result<String> {
        let emitter = Emitter { file };
        let mut out = String::new();
        if self.banner {
            out.push_str(BANNER);
            out.push('\n');
        }

        // Types first, then variables and functions
        for vars in [false, true] {
            for (_, decl) in file.top_level().filter(|(_, d)| d.is_var() == vars) {
                debug!("emitting {} `{}`", decl.kind.keyword(), decl.name.name);
                emitter.declaration(&mut out, decl, 0)?;
                if !decl.is_function() {
                    out.push_str(";\n\n");
                }
            }
        }

        debug!("generated {} bytes of C", out.len());
        Ok(out)
    }
}

impl Default for CCodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen for CCodeGen {
    fn generate(&mut self, file: &SourceFile) -> Result<String> {
        self.generate_source(file)
    }

    fn name(&self) -> &str {
        "C"
    }

    fn extension(&self) -> &str {
        "c"
    }
}

// ==================== Operator Tables ====================

fn unary_glyph(op: UnOp) -> &'static str {
    match op {
        UnOp::Not => "!",
        UnOp::BitNot => "~",
        UnOp::Neg => "-",
        UnOp::Deref => "*",
        UnOp::Ref => "&",
    }
}

fn binary_glyph(op: BinOp) -> &'static str {
    match op {
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
    }
}

/// C spelling of an assignment operator. C has no logical compound
/// assignment, so `&&=` and `||=` have no spelling.
fn assign_glyph(op: AssignOp) -> Option<&'static str> {
    Some(match op {
        AssignOp::Assign => "=",
        AssignOp::AndAssign | AssignOp::OrAssign => return None,
        AssignOp::BitAndAssign => "&=",
        AssignOp::BitOrAssign => "|=",
        AssignOp::BitXorAssign => "^=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
    })
}

// ==================== Literals ====================

/// Escape `c` into `out`. `next` is the character written after it: a short
/// `\0` would swallow a following octal digit.
fn escape_into(out: &mut String, c: char, next: Option<char>) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\0' if matches!(next, Some('0'..='7')) => out.push_str("\\000"),
        '\0' => out.push_str("\\0"),
        '\'' => out.push_str("\\'"),
        '"' => out.push_str("\\\""),
        '\r' => out.push_str("\\r"),
        other => out.push(other),
    }
}

fn non_finite(value: impl std::fmt::Display, span: Span) -> Error {
    Error::unsupported(format!("non-finite float literal `{}`", value), span)
}

/// C text of a literal, suffix included
fn literal(lit: &Literal) -> Result<String> {
    let mut text = match &lit.value {
        LiteralValue::String(s) => {
            let mut text = String::from("\"");
            let mut chars = s.chars().peekable();
            while let Some(c) = chars.next() {
                escape_into(&mut text, c, chars.peek().copied());
            }
            text.push('"');
            text
        }
        LiteralValue::Char(byte) => {
            let mut text = String::from("'");
            if byte.is_ascii() {
                escape_into(&mut text, char::from(*byte), None);
            } else {
                // keep the exact byte; the output itself is UTF-8
                text.push_str(&format!("\\{:03o}", byte));
            }
            text.push('\'');
            text
        }
        LiteralValue::I8(v) => v.to_string(),
        LiteralValue::I16(v) => v.to_string(),
        LiteralValue::I32(v) => v.to_string(),
        // the magnitude of the minimum does not fit a `long long` constant
        LiteralValue::I64(i64::MIN) => return Ok(format!("({}LL - 1)", i64::MIN + 1)),
        LiteralValue::I64(v) => v.to_string(),
        LiteralValue::U8(v) => v.to_string(),
        LiteralValue::U16(v) => v.to_string(),
        LiteralValue::U32(v) => v.to_string(),
        LiteralValue::U64(v) => v.to_string(),
        LiteralValue::F32(v) if !v.is_finite() => return Err(non_finite(v, lit.span)),
        LiteralValue::F64(v) if !v.is_finite() => return Err(non_finite(v, lit.span)),
        // Debug prints the shortest text that reads back exactly, always
        // with a fraction or an exponent
        LiteralValue::F32(v) => format!("{:?}", v),
        LiteralValue::F64(v) => format!("{:?}", v),
    };
    if let Some(prim) = lit.value.primitive() {
        text.push_str(prim.literal_suffix());
    }
    Ok(text)
}

// ==================== Emitter ====================

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

/// Walks one file. Every method takes the indentation level it writes at.
struct Emitter<'a> {
    file: &'a SourceFile,
}

impl<'a> Emitter<'a> {
    // ---------- Types ----------

    /// C spelling of a type, without any declarator
    fn type_name(&self, ty: &Type) -> Result<String> {
        match ty {
            Type::Primitive(p, _) => Ok(p.c_name().to_string()),
            Type::Pointer(base, _) | Type::NullablePointer(base, _) => {
                Ok(format!("{} *", self.type_name(base)?))
            }
            // the brackets belong to the declarator
            Type::Array(elem, _) => self.type_name(elem),
            Type::Named(named) => self.named_type(named),
            Type::Function(_) => Err(Error::unsupported(
                format!("function type `{}` outside a function declaration", ty),
                ty.span(),
            )),
        }
    }

    fn named_type(&self, named: &NamedType) -> Result<String> {
        let name = &named.name.name;
        let Some(id) = named.resolved.get() else {
            return Err(Error::UnresolvedType { name: name.clone(), span: named.name.span });
        };
        let tag = match &self.file.decl(id).kind {
            DeclKind::Struct { .. } => "struct",
            DeclKind::Union { .. } => "union",
            DeclKind::Enum { .. } => "enum",
            DeclKind::Sum { .. } => {
                return Err(Error::unsupported(format!("sum type `{}`", name), named.name.span));
            }
            DeclKind::Var(_) => {
                return Err(Error::NotAType { name: name.clone(), span: named.name.span });
            }
        };
        Ok(format!("{} {}", tag, name))
    }

    /// `<type> <name>`, with `[count]` appended for arrays
    fn declarator(&self, ty: &Type, name: &str, count: Option<&Expr>) -> Result<String> {
        let Type::Array(elem, _) = ty else {
            return Ok(format!("{} {}", self.type_name(ty)?, name));
        };
        if let Type::Array(..) = elem.as_ref() {
            return Err(Error::unsupported(format!("nested array type `{}`", ty), elem.span()));
        }
        let count = match count {
            Some(count) => self.expr(count)?,
            None => String::new(),
        };
        Ok(format!("{} {}[{}]", self.type_name(elem)?, name, count))
    }

    // ---------- Expressions ----------

    fn expr(&self, expr: &Expr) -> Result<String> {
        Ok(match expr {
            Expr::Paren { expr, .. } => format!("({})", self.expr(expr)?),
            Expr::Unary { op, expr, .. } => format!("{}{}", unary_glyph(*op), self.expr(expr)?),
            Expr::Binary { left, op, right, .. } => {
                format!("{} {} {}", self.expr(left)?, binary_glyph(*op), self.expr(right)?)
            }
            Expr::Cast { expr, ty, .. } => format!("({}){}", self.type_name(ty)?, self.expr(expr)?),
            Expr::Field { expr, field, .. } => format!("{}.{}", self.expr(expr)?, field.name),
            Expr::Index { expr, index, .. } => {
                format!("{}[{}]", self.expr(expr)?, self.expr(index)?)
            }
            Expr::Function { .. } => {
                return Err(Error::unsupported(
                    "function literal outside a top-level constant",
                    expr.span(),
                ));
            }
            Expr::Call { func, args, .. } => {
                format!("{}({})", self.expr(func)?, self.expr_list(args)?)
            }
            Expr::Ident(ident) => ident.name.clone(),
            Expr::Literal(lit) => literal(lit)?,
            Expr::Bool(value, _) => if *value { "1" } else { "0" }.to_string(),
            Expr::Array { elements, .. } => format!("{{{}}}", self.expr_list(elements)?),
        })
    }

    fn expr_list(&self, exprs: &[Expr]) -> Result<String> {
        let parts = exprs.iter().map(|e| self.expr(e)).collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    // ---------- Statements ----------

    /// Statement text without its terminator
    fn stmt(&self, out: &mut String, stmt: &Stmt, indent: usize) -> Result<()> {
        match stmt {
            Stmt::Declaration(id, span) => {
                let decl = self.file.decl(*id);
                if decl.is_function() {
                    return Err(Error::unsupported(
                        format!("local function `{}`", decl.name.name),
                        *span,
                    ));
                }
                self.declaration(out, decl, indent)?;
            }
            Stmt::Increment(expr, _) => {
                out.push_str("++");
                out.push_str(&self.expr(expr)?);
            }
            Stmt::Decrement(expr, _) => {
                out.push_str("--");
                out.push_str(&self.expr(expr)?);
            }
            Stmt::Assign { op, target, value, .. } => {
                let Some(glyph) = assign_glyph(*op) else {
                    return Err(Error::unsupported("logical compound assignment", stmt.span()));
                };
                out.push_str(&format!("{} {} {}", self.expr(target)?, glyph, self.expr(value)?));
            }
            Stmt::Expr(expr) => out.push_str(&self.expr(expr)?),
            Stmt::Label(name) => {
                out.push_str(&name.name);
                out.push(':');
            }
            Stmt::Goto(name) => {
                out.push_str("goto ");
                out.push_str(&name.name);
            }
            Stmt::Return { value, .. } => {
                out.push_str("return");
                if let Some(value) = value {
                    out.push(' ');
                    out.push_str(&self.expr(value)?);
                }
            }
        }
        Ok(())
    }

    // ---------- Scopes ----------

    /// A scope written from the start of a line
    fn scope(&self, out: &mut String, scope: &Scope, indent: usize) -> Result<()> {
        match scope {
            Scope::Statement(stmt) => {
                pad(out, indent);
                self.stmt(out, stmt, indent)?;
                out.push_str(";\n");
            }
            Scope::Block { scopes, .. } => {
                pad(out, indent);
                out.push('{');
                self.block_body(out, scopes, indent)?;
            }
            Scope::Conditional { .. } => {
                pad(out, indent);
                self.conditional(out, scope, indent)?;
            }
            Scope::For { init, cond, step, body, .. } => {
                pad(out, indent);
                out.push_str("for (");
                self.stmt(out, init, indent)?;
                out.push_str(&format!("; {}; ", self.expr(cond)?));
                self.stmt(out, step, indent)?;
                out.push(')');
                self.body(out, body, indent)?;
            }
            Scope::While { cond, body, .. } => {
                pad(out, indent);
                out.push_str(&format!("while ({})", self.expr(cond)?));
                self.body(out, body, indent)?;
            }
            Scope::ForEach { .. } => return Err(Error::unsupported("for-each loop", scope.span())),
            Scope::Match { .. } => return Err(Error::unsupported("match scope", scope.span())),
        }
        Ok(())
    }

    /// `if (...)` plus its branches, from the current column
    fn conditional(&self, out: &mut String, scope: &Scope, indent: usize) -> Result<()> {
        let Scope::Conditional { cond, then_scope, else_scope, .. } = scope else {
            return self.scope(out, scope, indent);
        };
        out.push_str(&format!("if ({})", self.expr(cond)?));
        match then_scope.as_ref() {
            // braced so a trailing `if` inside cannot claim our `else`
            single if else_scope.is_some() && !matches!(single, Scope::Block { .. }) => {
                out.push_str(" {");
                self.block_body(out, std::slice::from_ref(single), indent)?;
            }
            then_scope => self.body(out, then_scope, indent)?,
        }

        if let Some(else_scope) = else_scope {
            pad(out, indent);
            out.push_str("else");
            if let Scope::Conditional { .. } = else_scope.as_ref() {
                out.push(' ');
                self.conditional(out, else_scope, indent)?;
            } else {
                self.body(out, else_scope, indent)?;
            }
        }
        Ok(())
    }

    /// The body of a header (`if`, `else`, `for`, `while`). A block opens on
    /// the header line; anything else goes on the next line, one level deeper.
    fn body(&self, out: &mut String, body: &Scope, indent: usize) -> Result<()> {
        match body {
            Scope::Block { scopes, .. } => {
                out.push_str(" {");
                self.block_body(out, scopes, indent)
            }
            other => {
                out.push('\n');
                self.scope(out, other, indent + 1)
            }
        }
    }

    /// Everything after an opening brace
    fn block_body(&self, out: &mut String, scopes: &[Scope], indent: usize) -> Result<()> {
        out.push('\n');
        for scope in scopes {
            self.scope(out, scope, indent + 1)?;
        }
        pad(out, indent);
        out.push_str("}\n\n");
        Ok(())
    }

    // ---------- Declarations ----------

    /// Declaration text. Functions include their body; every other
    /// declaration leaves the terminator to the caller.
    fn declaration(&self, out: &mut String, decl: &Declaration, indent: usize) -> Result<()> {
        let name = &decl.name.name;
        match &decl.kind {
            DeclKind::Var(VarDecl::Constant { ty, value }) => {
                if let Expr::Function { ty: sig, body, .. } = value {
                    let result = match ty {
                        Some(Type::Function(annotated)) => annotated.result.as_ref(),
                        Some(other) => other,
                        None => sig.result.as_ref(),
                    };
                    return self.function(out, name, result, sig, body, indent);
                }
                let Some(ty) = ty else {
                    return Err(Error::MissingType { name: name.clone(), span: decl.span });
                };
                let text = self.declarator(ty, name, array_count(value))?;
                out.push_str(&format!("{} = {}", text, self.expr(value)?));
            }
            DeclKind::Var(VarDecl::Mutable { ty, value }) => {
                out.push_str(&self.declarator(ty, name, value.as_ref().and_then(array_count))?);
                if let Some(value) = value {
                    out.push_str(&format!(" = {}", self.expr(value)?));
                }
            }
            DeclKind::Enum { members } => {
                out.push_str(&format!("enum {} {{\n", name));
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pad(out, indent + 1);
                    out.push_str(&member.name);
                }
                if !members.is_empty() {
                    out.push('\n');
                }
                pad(out, indent);
                out.push('}');
            }
            DeclKind::Struct { members } | DeclKind::Union { members } => {
                out.push_str(&format!("{} {} {{\n", decl.kind.keyword(), name));
                for member in members {
                    pad(out, indent + 1);
                    out.push_str(&self.declarator(&member.ty, &member.name.name, None)?);
                    out.push_str(";\n");
                }
                pad(out, indent);
                out.push('}');
            }
            DeclKind::Sum { .. } => {
                return Err(Error::UnsupportedDeclarationKind {
                    kind: decl.kind.keyword(),
                    name: name.clone(),
                    span: decl.span,
                });
            }
        }
        Ok(())
    }

    fn function(
        &self,
        out: &mut String,
        name: &str,
        result: &Type,
        sig: &FunctionType,
        body: &Scope,
        indent: usize,
    ) -> Result<()> {
        let params = sig
            .params
            .iter()
            .map(|p| self.declarator(&p.ty, &p.name.name, None))
            .collect::<Result<Vec<_>>>()?;
        trace!("function `{}` with {} parameters", name, params.len());
        out.push_str(&format!("{} {}({}) {{", self.type_name(result)?, name, params.join(", ")));
        match body {
            Scope::Block { scopes, .. } => self.block_body(out, scopes, indent),
            single => self.block_body(out, std::slice::from_ref(single), indent),
        }
    }
}

/// Element count an array initializer spells out
fn array_count(value: &Expr) -> Option<&Expr> {
    match value {
        Expr::Array { count: Some(count), .. } => Some(count),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::builder::*;
    use crate::frontend::semantic::resolve_file;
    use crate::types::PrimitiveType;
    use pretty_assertions::assert_eq;

    fn generate_c(file: &SourceFile) -> String {
        resolve_file(file).unwrap();
        CCodeGen::new().generate(file).unwrap()
    }

    fn generate_err(file: &SourceFile) -> Error {
        CCodeGen::new().generate(file).unwrap_err()
    }

    fn render_expr(expr: &Expr) -> String {
        let file = SourceFile::default();
        Emitter { file: &file }.expr(expr).unwrap()
    }

    fn void() -> Type {
        prim(PrimitiveType::Void)
    }

    #[test]
    fn test_mutable_with_initializer() {
        let mut b = SourceFileBuilder::new();
        b.item(mutable("x", int(), Some(int_lit(5))));
        assert_eq!(generate_c(&b.finish()), "int x = 5;\n\n");
    }

    #[test]
    fn test_struct_declaration() {
        let mut b = SourceFileBuilder::new();
        b.item(structure("Point", vec![("x", int()), ("y", int())]));
        assert_eq!(generate_c(&b.finish()), "struct Point {\n    int x;\n    int y;\n};\n\n");
    }

    #[test]
    fn test_function_with_inferred_result() {
        let mut b = SourceFileBuilder::new();
        b.item(function("f", vec![], int(), block(vec![stmt(ret(Some(int_lit(1))))])));
        assert_eq!(generate_c(&b.finish()), "int f() {\n    return 1;\n}\n\n");
    }

    #[test]
    fn test_single_statement_function_body_is_wrapped() {
        let mut b = SourceFileBuilder::new();
        b.item(function("f", vec![], int(), stmt(ret(Some(int_lit(1))))));
        assert_eq!(generate_c(&b.finish()), "int f() {\n    return 1;\n}\n\n");
    }

    #[test]
    fn test_bare_block() {
        let file = SourceFile::default();
        let scope = block(vec![
            stmt(assign(AssignOp::Assign, id("a"), int_lit(1))),
            stmt(assign(AssignOp::AddAssign, id("b"), int_lit(2))),
        ]);
        let mut out = String::new();
        Emitter { file: &file }.scope(&mut out, &scope, 0).unwrap();
        assert_eq!(out, "{\n    a = 1;\n    b += 2;\n}\n\n");
    }

    #[test]
    fn test_types_are_emitted_before_variables() {
        let mut b = SourceFileBuilder::new();
        b.item(mutable("origin", named("Point"), None));
        b.item(structure("Point", vec![("x", prim(PrimitiveType::F64))]));
        assert_eq!(
            generate_c(&b.finish()),
            "struct Point {\n    double x;\n};\n\nstruct Point origin;\n\n"
        );
    }

    #[test]
    fn test_function_with_parameters_and_pointer_types() {
        let mut b = SourceFileBuilder::new();
        b.item(structure("Node", vec![("value", int()), ("next", ptr(named("Node")))]));
        b.item(function(
            "length",
            vec![("head", nullable(named("Node"))), ("limit", prim(PrimitiveType::U64))],
            prim(PrimitiveType::U64),
            block(vec![stmt(ret(Some(lit(LiteralValue::U64(0)))))]),
        ));
        let expected = "\
struct Node {
    int value;
    struct Node * next;
};

unsigned long long length(struct Node * head, unsigned long long limit) {
    return 0ULL;
}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_annotated_function_constant_uses_result_type() {
        let mut b = SourceFileBuilder::new();
        let sig = fn_type(vec![("a", int())], prim(PrimitiveType::Bool));
        b.item(constant(
            "positive",
            Some(Type::Function(sig.clone())),
            func_lit(sig, block(vec![stmt(ret(Some(binary(id("a"), BinOp::Gt, int_lit(0)))))])),
        ));
        assert_eq!(
            generate_c(&b.finish()),
            "int positive(int a) {\n    return a > 0;\n}\n\n"
        );
    }

    #[test]
    fn test_typed_constant() {
        let mut b = SourceFileBuilder::new();
        b.item(constant("limit", Some(prim(PrimitiveType::I64)), lit(LiteralValue::I64(1 << 40))));
        assert_eq!(generate_c(&b.finish()), "long long limit = 1099511627776LL;\n\n");
    }

    #[test]
    fn test_array_declarators() {
        let mut b = SourceFileBuilder::new();
        b.item(mutable(
            "primes",
            array(int()),
            Some(array_lit(Some(int_lit(3)), int(), vec![int_lit(2), int_lit(3), int_lit(5)])),
        ));
        b.item(mutable("empty", array(int()), Some(array_lit(None, int(), vec![]))));
        b.item(mutable("buf", array(prim(PrimitiveType::Char)), None));
        assert_eq!(
            generate_c(&b.finish()),
            "int primes[3] = {2, 3, 5};\n\nint empty[] = {};\n\nchar buf[];\n\n"
        );
    }

    #[test]
    fn test_nested_array_is_rejected() {
        let mut b = SourceFileBuilder::new();
        b.item(mutable("grid", array(array(int())), None));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_union_and_enum() {
        let mut b = SourceFileBuilder::new();
        b.item(union("Value", vec![("i", int()), ("f", prim(PrimitiveType::F32))]));
        b.item(enumeration("Color", &["Red", "Green", "Blue"]));
        b.item(enumeration("Never", &[]));
        let expected = "\
union Value {
    int i;
    float f;
};

enum Color {
    Red,
    Green,
    Blue
};

enum Never {
};

";
        // enums cannot be resolved yet, so this file is generated unresolved
        assert_eq!(CCodeGen::new().generate(&b.finish()).unwrap(), expected);
    }

    #[test]
    fn test_sum_declaration_fails() {
        let mut b = SourceFileBuilder::new();
        b.item(sum("Shape", vec![("Circle", Some(prim(PrimitiveType::F32)))]));
        assert!(matches!(
            generate_err(&b.finish()),
            Error::UnsupportedDeclarationKind { kind: "sum", .. }
        ));
    }

    #[test]
    fn test_unresolved_named_type() {
        let mut b = SourceFileBuilder::new();
        b.item(structure("Point", vec![("x", int())]));
        b.item(mutable("p", named("Point"), None));
        assert!(matches!(
            generate_err(&b.finish()),
            Error::UnresolvedType { ref name, .. } if name == "Point"
        ));
    }

    #[test]
    fn test_missing_type() {
        let mut b = SourceFileBuilder::new();
        b.item(constant("answer", None, int_lit(42)));
        assert!(matches!(generate_err(&b.finish()), Error::MissingType { .. }));
    }

    #[test]
    fn test_integer_literals_round_trip() {
        fn check<T: std::str::FromStr + PartialEq + std::fmt::Debug>(
            value: LiteralValue,
            suffix: &str,
            expected: T,
        ) where
            T::Err: std::fmt::Debug,
        {
            let text = render_expr(&lit(value));
            let digits = text.strip_suffix(suffix).unwrap_or_else(|| panic!("{} lacks {}", text, suffix));
            assert!(digits.chars().last().unwrap().is_ascii_digit(), "{}", text);
            assert_eq!(digits.parse::<T>().unwrap(), expected);
        }

        check(LiteralValue::I8(i8::MIN), "", i8::MIN);
        check(LiteralValue::I8(i8::MAX), "", i8::MAX);
        check(LiteralValue::I16(i16::MIN), "", i16::MIN);
        check(LiteralValue::I16(i16::MAX), "", i16::MAX);
        check(LiteralValue::I32(i32::MIN), "", i32::MIN);
        check(LiteralValue::I32(i32::MAX), "", i32::MAX);
        check(LiteralValue::I64(i64::MAX), "LL", i64::MAX);
        check(LiteralValue::U8(u8::MAX), "U", u8::MAX);
        check(LiteralValue::U16(u16::MAX), "U", u16::MAX);
        check(LiteralValue::U32(0), "U", 0u32);
        check(LiteralValue::U32(u32::MAX), "U", u32::MAX);
        check(LiteralValue::U64(u64::MAX), "ULL", u64::MAX);
    }

    #[test]
    fn test_i64_minimum_is_a_constant_expression() {
        assert_eq!(
            render_expr(&lit(LiteralValue::I64(i64::MIN))),
            "(-9223372036854775807LL - 1)"
        );
        assert_eq!(render_expr(&lit(LiteralValue::I64(i64::MIN + 1))), "-9223372036854775807LL");
    }

    #[test]
    fn test_float_literals_round_trip() {
        for value in [0.0f32, 1.5, -0.1, f32::MIN_POSITIVE, f32::MAX, 1e-7] {
            let text = render_expr(&lit(LiteralValue::F32(value)));
            let digits = text.strip_suffix('f').unwrap();
            assert!(digits.contains('.') || digits.contains('e'), "{}", text);
            assert_eq!(digits.parse::<f32>().unwrap(), value);
        }
        for value in [0.1f64, -2.0, f64::MAX, f64::MIN_POSITIVE, 123456789.125] {
            let text = render_expr(&lit(LiteralValue::F64(value)));
            assert!(text.contains('.') || text.contains('e'), "{}", text);
            assert_eq!(text.parse::<f64>().unwrap(), value);
        }
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let file = SourceFile::default();
        let emitter = Emitter { file: &file };
        assert!(emitter.expr(&lit(LiteralValue::F64(f64::NAN))).is_err());
        assert!(emitter.expr(&lit(LiteralValue::F32(f32::INFINITY))).is_err());
    }

    #[test]
    fn test_string_and_char_escapes() {
        let text = render_expr(&lit(LiteralValue::String("a\\b\n\t\0'\"\r é".into())));
        assert_eq!(text, r#""a\\b\n\t\0\'\"\r é""#);
        assert_eq!(render_expr(&lit(LiteralValue::Char(b'\''))), r"'\''");
        assert_eq!(render_expr(&lit(LiteralValue::Char(b'x'))), "'x'");
        assert_eq!(render_expr(&lit(LiteralValue::Char(0xE9))), r"'\351'");
    }

    /// Read back a C string literal the way a C compiler does: octal escapes
    /// take up to three digits
    fn unescape_c(text: &str) -> String {
        let inner = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap();
        let mut out = String::new();
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next().unwrap() {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                d @ '0'..='7' => {
                    let mut value = d.to_digit(8).unwrap();
                    for _ in 0..2 {
                        match chars.peek().and_then(|c| c.to_digit(8)) {
                            Some(digit) => {
                                value = value * 8 + digit;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    out.push(char::from_u32(value).unwrap());
                }
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn test_nul_before_octal_digit_keeps_both_characters() {
        for source in ["a\u{0}1", "\u{0}7z", "\u{0}8", "x\u{0}", "\u{0}\u{0}0"] {
            let text = render_expr(&lit(LiteralValue::String(source.into())));
            assert_eq!(unescape_c(&text), source, "{}", text);
        }
        assert_eq!(render_expr(&lit(LiteralValue::String("a\u{0}1".into()))), r#""a\0001""#);
        assert_eq!(render_expr(&lit(LiteralValue::String("a\u{0}b".into()))), r#""a\0b""#);
    }

    #[test]
    fn test_parentheses_are_preserved_not_inserted() {
        let explicit = binary(paren(binary(id("a"), BinOp::Add, id("b"))), BinOp::Mul, id("c"));
        assert_eq!(render_expr(&explicit), "(a + b) * c");

        let implicit = binary(binary(id("a"), BinOp::Add, id("b")), BinOp::Mul, id("c"));
        assert_eq!(render_expr(&implicit), "a + b * c");

        let nested = paren(paren(unary(UnOp::Neg, id("x"))));
        assert_eq!(render_expr(&nested), "((-x))");
    }

    #[test]
    fn test_operator_tables() {
        let ops = [
            BinOp::And, BinOp::Or, BinOp::BitAnd, BinOp::BitOr, BinOp::BitXor,
            BinOp::Eq, BinOp::Ne, BinOp::Lt, BinOp::Gt, BinOp::Le, BinOp::Ge,
            BinOp::Shl, BinOp::Shr, BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div, BinOp::Mod,
        ];
        let glyphs: Vec<_> = ops.into_iter().map(binary_glyph).collect();
        assert_eq!(
            glyphs.join(" "),
            "&& || & | ^ == != < > <= >= << >> + - * / %"
        );
        assert_eq!(render_expr(&unary(UnOp::Not, id("ok"))), "!ok");
        assert_eq!(render_expr(&unary(UnOp::BitNot, id("m"))), "~m");
        assert_eq!(render_expr(&unary(UnOp::Ref, id("v"))), "&v");
        assert_eq!(assign_glyph(AssignOp::ShlAssign), Some("<<="));
        assert_eq!(assign_glyph(AssignOp::OrAssign), None);
    }

    #[test]
    fn test_postfix_and_call_expressions() {
        let expr = call(
            id("draw"),
            vec![
                field(index(id("points"), id("i")), "x"),
                cast(unary(UnOp::Deref, id("p")), prim(PrimitiveType::I64)),
                boolean(true),
                boolean(false),
            ],
        );
        assert_eq!(render_expr(&expr), "draw(points[i].x, (long long)*p, 1, 0)");
        assert_eq!(render_expr(&call(id("tick"), vec![])), "tick()");
    }

    #[test]
    fn test_if_else_chain() {
        let mut b = SourceFileBuilder::new();
        b.item(function(
            "sign",
            vec![("x", int())],
            int(),
            block(vec![if_else(
                binary(id("x"), BinOp::Gt, int_lit(0)),
                block(vec![stmt(ret(Some(int_lit(1))))]),
                Some(if_else(
                    binary(id("x"), BinOp::Lt, int_lit(0)),
                    block(vec![stmt(ret(Some(int_lit(-1))))]),
                    Some(block(vec![stmt(ret(Some(int_lit(0))))])),
                )),
            )]),
        ));
        let expected = "\
int sign(int x) {
    if (x > 0) {
        return 1;
    }

    else if (x < 0) {
        return -1;
    }

    else {
        return 0;
    }

}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_unbraced_branches() {
        let mut b = SourceFileBuilder::new();
        b.item(function(
            "clamp",
            vec![("x", int())],
            int(),
            block(vec![
                if_else(
                    binary(id("x"), BinOp::Gt, int_lit(9)),
                    stmt(ret(Some(int_lit(9)))),
                    Some(stmt(ret(Some(id("x"))))),
                ),
            ]),
        ));
        let expected = "\
int clamp(int x) {
    if (x > 9) {
        return 9;
    }

    else
        return x;
}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_inner_if_cannot_take_the_outer_else() {
        let mut b = SourceFileBuilder::new();
        b.item(function(
            "pick",
            vec![("a", int()), ("b", int())],
            int(),
            block(vec![
                if_else(
                    id("a"),
                    if_else(id("b"), stmt(ret(Some(int_lit(1)))), None),
                    Some(stmt(ret(Some(int_lit(2))))),
                ),
                stmt(ret(Some(int_lit(0)))),
            ]),
        ));
        let expected = "\
int pick(int a, int b) {
    if (a) {
        if (b)
            return 1;
    }

    else
        return 2;
    return 0;
}

";
        assert_eq!(generate_c(&b.finish()), expected);

        let mut b = SourceFileBuilder::new();
        b.item(function(
            "scan",
            vec![("n", int())],
            int(),
            block(vec![if_else(
                id("n"),
                while_loop(id("n"), if_else(id("n"), stmt(decrement(id("n"))), None)),
                Some(stmt(ret(Some(int_lit(2))))),
            )]),
        ));
        let expected = "\
int scan(int n) {
    if (n) {
        while (n)
            if (n)
                --n;
    }

    else
        return 2;
}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_loops() {
        let mut b = SourceFileBuilder::new();
        let total = b.local(mutable("total", int(), Some(int_lit(0))));
        let i = b.local(mutable("i", int(), Some(int_lit(0))));
        b.item(function(
            "sum",
            vec![("n", int())],
            int(),
            block(vec![
                stmt(decl_stmt(total)),
                for_loop(
                    decl_stmt(i),
                    binary(id("i"), BinOp::Lt, id("n")),
                    increment(id("i")),
                    stmt(assign(AssignOp::AddAssign, id("total"), id("i"))),
                ),
                while_loop(
                    binary(id("n"), BinOp::Gt, int_lit(0)),
                    block(vec![stmt(decrement(id("n")))]),
                ),
                stmt(ret(Some(id("total")))),
            ]),
        ));
        let expected = "\
int sum(int n) {
    int total = 0;
    for (int i = 0; i < n; ++i)
        total += i;
    while (n > 0) {
        --n;
    }

    return total;
}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_labels_goto_and_local_struct() {
        let mut b = SourceFileBuilder::new();
        let pair = b.local(structure("Pair", vec![("a", int()), ("b", int())]));
        let p = b.local(mutable("p", named("Pair"), None));
        b.item(function(
            "spin",
            vec![],
            void(),
            block(vec![
                stmt(decl_stmt(pair)),
                stmt(decl_stmt(p)),
                stmt(label("top")),
                stmt(assign(AssignOp::Assign, field(id("p"), "a"), int_lit(1))),
                stmt(goto("top")),
                stmt(ret(None)),
            ]),
        ));
        let expected = "\
void spin() {
    struct Pair {
        int a;
        int b;
    };
    struct Pair p;
    top:;
    p.a = 1;
    goto top;
    return;
}

";
        assert_eq!(generate_c(&b.finish()), expected);
    }

    #[test]
    fn test_unsupported_constructs() {
        let mut b = SourceFileBuilder::new();
        b.item(function(
            "walk",
            vec![("xs", array(int()))],
            void(),
            block(vec![for_each("x", id("xs"), block(vec![]))]),
        ));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));

        let mut b = SourceFileBuilder::new();
        b.item(function(
            "pick",
            vec![("s", int())],
            void(),
            block(vec![match_scope(id("s"), vec![("A", vec![])])]),
        ));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));

        let mut b = SourceFileBuilder::new();
        b.item(function(
            "both",
            vec![("a", int())],
            void(),
            stmt(assign(AssignOp::AndAssign, id("a"), boolean(true))),
        ));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));

        let mut b = SourceFileBuilder::new();
        let inner = b.local(function("inner", vec![], void(), block(vec![])));
        b.item(function("outer", vec![], void(), block(vec![stmt(decl_stmt(inner))])));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));

        let mut b = SourceFileBuilder::new();
        b.item(mutable("callback", Type::Function(fn_type(vec![], void())), None));
        assert!(matches!(generate_err(&b.finish()), Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_banner() {
        let mut b = SourceFileBuilder::new();
        b.item(mutable("x", int(), None));
        let file = b.finish();
        let out = CCodeGen::new().with_banner(true).generate(&file).unwrap();
        assert_eq!(out, "/* Generated by creedc */\nint x;\n\n");
    }

    #[test]
    fn test_generation_is_repeatable() {
        let mut b = SourceFileBuilder::new();
        b.item(structure("P", vec![("x", int())]));
        b.item(mutable("p", named("P"), None));
        let file = b.finish();
        resolve_file(&file).unwrap();

        let mut backend = CCodeGen::new();
        let first = backend.generate(&file).unwrap();
        assert_eq!(backend.generate(&file).unwrap(), first);
        assert_eq!(backend.name(), "C");
        assert_eq!(backend.extension(), "c");
    }
}

//! Structured Feedback Module
//!
//! Provides machine-readable output for tools driving the compiler:
//! - JSON error reports with fix suggestions
//! - Compilation statistics

use serde::{Deserialize, Serialize};

use crate::frontend::ast::{DeclKind, SourceFile};
use crate::utils::{Error, Span};

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0105")
    pub code: String,

    /// Error severity
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Location information
    pub location: Option<Location>,

    /// Suggested fixes
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
}

impl Location {
    /// Location of a span in `file`; dummy spans carry no location
    pub fn from_span(file: &str, span: Span) -> Option<Self> {
        if span.is_dummy() {
            return None;
        }
        Some(Self {
            file: file.to_string(),
            line: span.line,
            column: span.column,
            end_line: Some(span.end_line),
            end_column: Some(span.end_column),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Description of the fix
    pub message: String,

    /// The replacement text
    pub replacement: Option<String>,

    /// Confidence in this suggestion (0.0 - 1.0)
    pub confidence: f64,
}

impl Suggestion {
    fn new(message: impl Into<String>, replacement: Option<String>, confidence: f64) -> Self {
        Self { message: message.into(), replacement, confidence }
    }
}

// ==================== Compilation Feedback ====================

/// Complete compilation feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationFeedback {
    /// Compilation status
    pub success: bool,

    /// Source file
    pub source_file: String,

    /// All errors and warnings
    pub diagnostics: Vec<ErrorReport>,

    /// Compilation statistics
    pub stats: CompilationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationStats {
    /// Top-level struct, union, enum and sum declarations
    pub type_count: usize,

    /// Top-level variables and non-function constants
    pub variable_count: usize,

    /// Top-level function constants
    pub function_count: usize,

    /// Size of the generated text
    pub output_bytes: usize,

    /// Total time
    pub total_time_ms: u64,
}

impl CompilationStats {
    /// Count the top-level declarations of a file
    pub fn of(file: &SourceFile) -> Self {
        let mut stats = Self::default();
        for (_, decl) in file.top_level() {
            match &decl.kind {
                DeclKind::Var(_) if decl.is_function() => stats.function_count += 1,
                DeclKind::Var(_) => stats.variable_count += 1,
                _ => stats.type_count += 1,
            }
        }
        stats
    }
}

// ==================== Error Conversion ====================

impl ErrorReport {
    /// Create an error report from a compiler error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let mut report = Self {
            code: error.code().to_string(),
            severity: Severity::Error,
            message: error.to_string(),
            location: error.span().and_then(|s| Location::from_span(file_name, s)),
            suggestions: suggestions_for(error),
        };
        report.sort_suggestions();
        report
    }

    /// Sort suggestions by confidence (highest first)
    pub fn sort_suggestions(&mut self) {
        self.suggestions.sort_by(|a, b| {
            b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Fix suggestions for each kind of error
fn suggestions_for(error: &Error) -> Vec<Suggestion> {
    match error {
        Error::DuplicateDeclaration { name, .. } => vec![
            Suggestion::new(format!("Rename one of the declarations of `{}`", name), None, 0.8),
            Suggestion::new(
                "Move the second declaration into an inner block to shadow the first",
                None,
                0.3,
            ),
        ],
        Error::DuplicateMember { owner, name, .. } => vec![Suggestion::new(
            format!("Remove or rename the repeated member `{}` of `{}`", name, owner),
            None,
            0.9,
        )],
        Error::UnknownType { name, .. } => vec![
            Suggestion::new(
                format!("Declare `{}` as a struct or union", name),
                Some(format!("{} :: struct {{ }}", name)),
                0.6,
            ),
            Suggestion::new("Check the spelling of the type name", None, 0.5),
        ],
        Error::NotAType { name, .. } => vec![Suggestion::new(
            format!("`{}` names a variable; use the name of a struct or union here", name),
            None,
            0.8,
        )],
        Error::CircularTypeReference { name, .. } => vec![
            Suggestion::new(
                format!("Store `{}` behind a pointer to break the cycle", name),
                Some(format!("*{}", name)),
                0.9,
            ),
            Suggestion::new("Use a nullable pointer if the link may be absent", None, 0.6),
        ],
        Error::UnsupportedDeclarationKind { kind, .. } => vec![Suggestion::new(
            format!("Rewrite the {} as a struct with an explicit tag member", kind),
            None,
            0.4,
        )],
        Error::MissingIdentifier { .. } => {
            vec![Suggestion::new("Give the declaration a name", None, 0.9)]
        }
        Error::MissingType { name, .. } => vec![Suggestion::new(
            format!("Add a type annotation to `{}`", name),
            Some(format!("{}: int : ...", name)),
            0.8,
        )],
        Error::UnsupportedConstruct { .. } => vec![Suggestion::new(
            "Rewrite the construct using if/for/while and plain assignment",
            None,
            0.5,
        )],
        Error::UnresolvedType { .. } => vec![Suggestion::new(
            "Run type resolution before code generation (drop --no-resolve)",
            None,
            0.9,
        )],
        Error::Io(_) | Error::InvalidInput(_) => vec![],
    }
}

impl CompilationFeedback {
    /// Create a successful feedback
    pub fn success(source_file: String, stats: CompilationStats) -> Self {
        Self { success: true, source_file, diagnostics: vec![], stats }
    }

    /// Create a failed feedback
    pub fn failure(source_file: String, errors: Vec<ErrorReport>, stats: CompilationStats) -> Self {
        Self { success: false, source_file, diagnostics: errors, stats }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

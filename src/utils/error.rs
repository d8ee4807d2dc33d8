//! Error handling for the Creed backend

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Every error is fatal: the first one detected aborts the whole file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Resolution Errors ====================

    #[error("A declaration named `{name}` already exists in this scope")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("`{owner}` declares more than one member named `{name}`")]
    DuplicateMember { owner: String, name: String, span: Span },

    #[error("Unknown type: {name}")]
    UnknownType { name: String, span: Span },

    #[error("`{name}` is a variable, not the name of a type")]
    NotAType { name: String, span: Span },

    #[error("Type `{name}` contains itself")]
    CircularTypeReference { name: String, span: Span },

    #[error("{kind} declarations are not supported yet (`{name}`)")]
    UnsupportedDeclarationKind { kind: &'static str, name: String, span: Span },

    #[error("Declaration is missing its identifier")]
    MissingIdentifier { span: Span },

    #[error("Cannot determine the type of `{name}`; add an explicit type")]
    MissingType { name: String, span: Span },

    // ==================== Generation Errors ====================

    #[error("Unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String, span: Span },

    #[error("Type `{name}` was not resolved before code generation")]
    UnresolvedType { name: String, span: Span },

    // ==================== Driver Errors ====================

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedConstruct { construct: construct.into(), span }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::DuplicateDeclaration { span, .. } => Some(*span),
            Self::DuplicateMember { span, .. } => Some(*span),
            Self::UnknownType { span, .. } => Some(*span),
            Self::NotAType { span, .. } => Some(*span),
            Self::CircularTypeReference { span, .. } => Some(*span),
            Self::UnsupportedDeclarationKind { span, .. } => Some(*span),
            Self::MissingIdentifier { span } => Some(*span),
            Self::MissingType { span, .. } => Some(*span),
            Self::UnsupportedConstruct { span, .. } => Some(*span),
            Self::UnresolvedType { span, .. } => Some(*span),
            Self::Io(_) | Self::InvalidInput(_) => None,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateDeclaration { .. } => "E0101",
            Self::DuplicateMember { .. } => "E0102",
            Self::UnknownType { .. } => "E0103",
            Self::NotAType { .. } => "E0104",
            Self::CircularTypeReference { .. } => "E0105",
            Self::UnsupportedDeclarationKind { .. } => "E0106",
            Self::MissingIdentifier { .. } => "E0107",
            Self::MissingType { .. } => "E0108",
            Self::UnsupportedConstruct { .. } => "E0201",
            Self::UnresolvedType { .. } => "E0202",
            Self::Io(_) => "E0901",
            Self::InvalidInput(_) => "E0902",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

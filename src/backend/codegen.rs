//! Code Generation trait - Backend abstraction
//!
//! A backend turns a declaration tree into the text of one output file.

use crate::frontend::ast::SourceFile;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Generate the output text for a file. Generation is all-or-nothing:
    /// on error no partial text is returned.
    fn generate(&mut self, file: &SourceFile) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;

    /// File extension of the generated output, without the dot
    fn extension(&self) -> &str;
}

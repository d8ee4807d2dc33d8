//! Source location tracking
#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// A span represents a range in the source code, in 1-based lines and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    /// Create a new span
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self { line, column, end_line, end_column }
    }

    /// A span covering a single position
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    /// Create a dummy span (for testing and built trees)
    pub fn dummy() -> Self {
        Self { line: 0, column: 0, end_line: 0, end_column: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        *self == Self::dummy()
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) -> ({}, {})",
            self.line, self.column, self.end_line, self.end_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Span::new(1, 4, 2, 7).to_string(), "(1, 4) -> (2, 7)");
    }
}

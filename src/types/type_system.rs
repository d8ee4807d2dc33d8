//! Type System for Creed
//!
//! Primitive type kinds and the two tables that name them: the source
//! keyword and the C scalar type the generator emits.

use serde::{Deserialize, Serialize};

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Void,
    Char,
    I8, I16, I32, I64,
    U8, U16, U32, U64,
    F32, F64,
    Bool,
}

impl PrimitiveType {
    /// Source-language keyword
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Char => "char",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint",
            Self::U64 => "uint64",
            Self::F32 => "float",
            Self::F64 => "float64",
            Self::Bool => "bool",
        }
    }

    /// C scalar type name. The target has no first-class boolean here, so
    /// `bool` lowers to plain `int`.
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Char => "char",
            Self::I8 => "signed char",
            Self::I16 => "short",
            Self::I32 => "int",
            Self::I64 => "long long",
            Self::U8 => "unsigned char",
            Self::U16 => "unsigned short",
            Self::U32 => "unsigned int",
            Self::U64 => "unsigned long long",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Bool => "int",
        }
    }

    /// Suffix a C literal of this type carries
    pub fn literal_suffix(self) -> &'static str {
        match self {
            Self::I64 => "LL",
            Self::U8 | Self::U16 | Self::U32 => "U",
            Self::U64 => "ULL",
            Self::F32 => "f",
            _ => "",
        }
    }
}

//! Backend module - Code generation

pub mod codegen;

// C Backend
pub mod c;

pub use codegen::CodeGen;
pub use c::CCodeGen;

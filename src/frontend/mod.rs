//! Frontend module - Declaration tree, Symbol Table, Type Resolution

pub mod ast;
pub mod builder;
pub mod semantic;

//! C Backend - Generate C source from a resolved declaration tree

mod c_codegen;

pub use c_codegen::CCodeGen;

//! Type module

pub mod type_system;

pub use type_system::PrimitiveType;

//! Backends: the C code generator and the direct interpreter.
//!
//! Both walk the same grammar; they never cooperate. The generator
//! pulls tokens on demand with two-token lookahead and emits C; the
//! interpreter requires random repositioning and therefore runs over a
//! fully materialized token buffer.

pub mod c_codegen;
pub mod interp;

pub use c_codegen::CCodeGen;
pub use interp::Interpreter;

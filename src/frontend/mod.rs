//! Frontend: token model and lexer, shared by both backends

pub mod lexer;
pub mod token;

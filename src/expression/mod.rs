//! The formula language: lexer, parser, tree evaluator and the bytecode used by the render loop.

pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod error;
pub(crate) mod eval;
pub(crate) mod intrinsics;
pub(crate) mod lexer;
pub(crate) mod lower;
pub(crate) mod parser;
pub(crate) mod vm;

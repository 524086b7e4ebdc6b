//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that lowers a type
//! checked `Program` into LLVM IR. It handles:
//!
//! - Lowering of expressions and statements into basic blocks
//! - Global and stack storage for variables
//! - Functions with a single exit block
//! - On-demand declaration of runtime support functions

pub mod compiler;
pub mod expr;
pub mod runtime;
pub mod stmt;

#[cfg(test)]
mod tests;

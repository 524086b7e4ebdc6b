//! Error types and error handling for the toolchain.
//!
//! Every phase reports through the same `Error` type:
//!
//! - Lexer and parser errors (unrecognised or unexpected tokens)
//! - Name resolution, type, arity and redeclaration errors from the checker
//! - Builder and verifier failures from code generation
//! - Runtime failures from the interpreter
//!
//! `ErrorImpl::Unsupported` is the single warning kind: code generation
//! records it and carries on.

pub mod errors;

#[cfg(test)]
mod tests;

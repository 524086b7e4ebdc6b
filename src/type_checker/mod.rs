//! Type checking and semantic analysis module.
//!
//! Walks the parsed `Program` once, binding every declaration in a
//! `SymbolTable` and validating it against the `DataType` lattice:
//!
//! - declared types against initialiser and assigned values
//! - operand types of every operator
//! - function arity, argument and return types
//! - `bit` conditions for `ping`, `stream` and `select` tests
//!
//! Failures are collected rather than fatal, so a single run reports every
//! independent error in the program.

pub mod type_checker;

#[cfg(test)]
mod tests;

//! Tree-walking interpreter.
//!
//! Executes a type checked `Program` directly, without lowering, and writes
//! `log` output to any `std::io::Write` sink.

pub mod interpreter;
pub mod value;

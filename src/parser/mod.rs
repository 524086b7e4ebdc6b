//! Parser module for building the Abstract Syntax Tree.
//!
//! Transforms a stream of tokens into a `Program`. Expressions use a Pratt
//! parser with NUD (null denotation) and LED (left denotation) handlers and
//! binding powers for precedence. Statements are dispatched on their
//! leading keyword; block bodies run until a closing keyword such as
//! `ping_end` or `module_end`.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;

//! Lexical analysis module.
//!
//! Converts source text into a stream of tokens for parsing:
//!
//! - Tokenization using an ordered table of anchored regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Token position tracking for error reporting
//! - Comments (`//` and `#`) and whitespace handling

pub mod lexer;
pub mod tokens;

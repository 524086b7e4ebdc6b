#![allow(clippy::module_inception)]

use std::{path::Path, rc::Rc};

use crate::{
    ast::ast::Program,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod symbol_table;
pub mod type_checker;

extern crate regex;

/// A byte offset into a named source file.
#[derive(Debug, Clone)]
pub struct Position(pub u32, pub Rc<String>);

const NULL_FILE: &str = "<null>";

impl Position {
    /// A position not tied to any source location.
    pub fn null() -> Self {
        Position(0, Rc::new(String::from(NULL_FILE)))
    }

    pub fn is_null(&self) -> bool {
        self.1.as_str() == NULL_FILE
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Finds the line holding byte offset `position`.
///
/// Returns the 1-based line number, the line text and the offset within the
/// line. An offset equal to the source length (end of file) resolves to the
/// end of the last line.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;
    if pos > source.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        start = end;
        line_number += 1;
    }

    // End of file: the last line, or an empty line after a trailing newline
    match source.split_inclusive('\n').last() {
        Some(last) if !last.ends_with('\n') => {
            Some((line_number - 1, last.to_string(), last.len()))
        }
        _ => Some((line_number, String::new(), 0)),
    }
}

/// Tokenizes and parses `source`, naming it `file` in positions.
pub fn parse_source(source: &str, file: &str) -> Result<Program, Error> {
    let tokens = tokenize(String::from(source), Some(String::from(file)))?;
    let (_, program) = parse(tokens, Rc::new(String::from(file)));
    program
}

pub fn display_error(error: &Error, source: &str, file: &Path) {
    /*
        Error: TypeMatchError (Expected type `byte`, received `chip`)
        -> demo.tf
           |
        20 | byte a = "x"
           | ---------^
    */

    let label = if error.is_warning() { "Warning" } else { "Error" };
    if let ErrorTip::None = error.get_tip() {
        eprintln!("{}: {} ({})", label, error.get_error_name(), error);
    } else {
        eprintln!("{}: {} ({})", label, error.get_error_name(), error.get_tip());
    }
    eprintln!("-> {}", file.as_os_str().to_string_lossy());

    let position = error.get_position();
    if position.is_null() {
        return;
    }
    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    const SOURCE: &str = "Hello, world!\nThis is a test\n\n    Testing { }\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 38).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "    Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_get_line_at_end_of_file() {
        let (line_number, line, line_pos) = super::get_line_at_position("boot x", 6).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "boot x");
        assert_eq!(line_pos, 6);

        assert!(super::get_line_at_position("boot x", 7).is_none());
    }

    #[test]
    fn test_remove_starting_whitespace() {
        assert_eq!(
            super::remove_starting_whitespace("  \tlog 1"),
            (String::from("log 1"), 3)
        );
    }

    #[test]
    fn test_parse_source_reports_file_name() {
        let error = super::parse_source("boot a shutdown b", "demo.tf").unwrap_err();
        assert_eq!(error.get_position().1.as_str(), "demo.tf");
        assert!(!error.get_position().is_null());
    }
}

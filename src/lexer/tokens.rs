use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("boot", TokenKind::Boot);
        map.insert("shutdown", TokenKind::Shutdown);
        map.insert("byte", TokenKind::Byte);
        map.insert("bit", TokenKind::Bit);
        map.insert("chip", TokenKind::Chip);
        map.insert("array", TokenKind::Array);
        map.insert("log", TokenKind::Log);
        map.insert("ping", TokenKind::Ping);
        map.insert("pong", TokenKind::Pong);
        map.insert("ping_end", TokenKind::PingEnd);
        map.insert("process", TokenKind::Process);
        map.insert("loop", TokenKind::Loop);
        map.insert("as", TokenKind::As);
        map.insert("loop_end", TokenKind::LoopEnd);
        map.insert("stream", TokenKind::Stream);
        map.insert("stream_end", TokenKind::StreamEnd);
        map.insert("select", TokenKind::Select);
        map.insert("when", TokenKind::When);
        map.insert("otherwise", TokenKind::Otherwise);
        map.insert("select_end", TokenKind::SelectEnd);
        map.insert("module", TokenKind::Module);
        map.insert("module_end", TokenKind::ModuleEnd);
        map.insert("return", TokenKind::Return);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("not", TokenKind::Not);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,

    Assignment, // =
    Equals,     // ==
    Not,        // ! or not
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,

    PlusPlus, // concatenation
    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Boot,
    Shutdown,
    Byte,
    Bit,
    Chip,
    Array,
    Log,
    Ping,
    Pong,
    PingEnd,
    Process,
    Loop,
    As,
    LoopEnd,
    Stream,
    StreamEnd,
    Select,
    When,
    Otherwise,
    SelectEnd,
    Module,
    ModuleEnd,
    Return,
    True,
    False,
}

impl TokenKind {
    /// Keywords that introduce a typed variable declaration.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Byte | TokenKind::Bit | TokenKind::Chip | TokenKind::Array
        )
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn is_one_of_many(&self, expected_tokens: &[TokenKind]) -> bool {
        expected_tokens.contains(&self.kind)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::String => {
                write!(f, "{:?} ({})", self.kind, self.value)
            }
            _ => write!(f, "{:?}", self.kind),
        }
    }
}

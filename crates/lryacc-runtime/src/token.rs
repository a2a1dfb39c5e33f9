//! Tokens handed from the lexer to the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The location of a token in the source text.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the beginning of the input.
    pub index: usize,
    /// 1-based line number.
    pub row: usize,
    /// 1-based column, counted in bytes from the start of the line.
    pub column: usize,
    /// Length of the matched text in bytes.
    pub length: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.row, self.column, self.index)
    }
}

/// A lexical token: the terminal name, the raw text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub content: String,
    pub position: Position,
}

impl Token {
    pub fn new(name: impl Into<String>, content: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            position,
        }
    }

    /// Create a token that does not originate from the source text,
    /// e.g. one inserted by an error recovery hook.
    ///
    /// It borrows the location of `at` with a zero length.
    pub fn synthetic(name: impl Into<String>, at: Position) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            position: Position { length: 0, ..at },
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.content)
    }
}

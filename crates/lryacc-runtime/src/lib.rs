//! Runtime support for `lryacc`: the lexer, the compiled parse table and
//! the shift-reduce driver that interprets it.

pub mod lexer;
pub mod parser;
pub mod table;
pub mod token;
pub mod tree;
pub mod types;

pub use crate::{
    lexer::{LexAction, LexError, LexRule, Lexer},
    parser::{ParseContext, ParseError, Parser, Reducer},
    table::{Action, ParseTable, ParseTableRow, StateID},
    token::{Position, Token},
    tree::Node,
};

/// Reserved terminal name marking the end of input.
pub const EOI: &str = "$";

/// Reserved nonterminal name of the augmented start production.
pub const START: &str = "$start";

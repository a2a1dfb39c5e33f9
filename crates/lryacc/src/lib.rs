//! A canonical LR(1) parser generator.
//!
//! Grammars are defined with [`Grammar::define`] (or read from a grammar
//! file), compiled into a [`ParseTable`] with [`build_table`], and then
//! interpreted by the shift-reduce driver of [`runtime::Parser`].

pub mod cfg;
pub mod first_sets;
pub mod grammar;
pub mod lr1;
pub mod syntax;
pub mod table;
pub mod types;

pub use crate::{
    grammar::{Grammar, GrammarDef, GrammarDefError},
    table::TableError,
};
pub use lryacc_runtime as runtime;
pub use lryacc_runtime::ParseTable;

use crate::{first_sets::FirstSets, lr1::Automaton};

/// Compile the parse table of a grammar.
pub fn build_table<U>(grammar: &Grammar<U>) -> Result<ParseTable, TableError> {
    let cfg = grammar.cfg();
    let first_sets = FirstSets::new(cfg);
    let automaton = Automaton::generate(cfg, &first_sets);
    table::compile(cfg, &automaton)
}

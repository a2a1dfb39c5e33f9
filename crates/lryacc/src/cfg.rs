//! The augmented context-free grammar used by the table construction.
//!
//! Symbols are classified in two passes: first every expression name becomes
//! a nonterminal, then every other referenced name becomes a terminal. The
//! synthetic start symbol, its accepting rule and the end-of-input terminal
//! are added on top of the user definitions.

use crate::{
    grammar::{Expression, GrammarDefError},
    types::Map,
};
use lryacc_runtime::{EOI, START};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u32,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u32 = 1;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u32,
}

impl NonterminalID {
    /// Reserved symbol used as the left-hand side of the accepting rule.
    pub const START: Self = Self::new(0);

    const OFFSET: u32 = 1;

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u32,
}

impl RuleID {
    /// The rule `$start := <start symbol>`.
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u32 = 1;

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }
}

#[derive(Debug)]
pub struct Terminal {
    pub id: TerminalID,
    pub name: String,
}

#[derive(Debug)]
pub struct Nonterminal {
    pub id: NonterminalID,
    pub name: String,
    /// The rules of this nonterminal, in declaration order of the alternatives.
    pub rules: Vec<RuleID>,
}

/// A production rule: one alternative of an expression.
#[derive(Debug)]
pub struct Rule {
    pub id: RuleID,
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
    /// The index of the alternative within its expression.
    pub alternative: usize,
}

impl Rule {
    // `"LHS := R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Cfg) -> RuleDisplay<'g> {
        RuleDisplay {
            rule: self,
            g,
            marker: None,
        }
    }
}

pub struct RuleDisplay<'g> {
    rule: &'g Rule,
    g: &'g Cfg,
    marker: Option<usize>,
}

impl<'g> RuleDisplay<'g> {
    /// Print a dot before the symbol at the specified position.
    pub fn with_marker(mut self, marker: usize) -> Self {
        self.marker = Some(marker);
        self
    }
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :=", self.g.nonterminals[&self.rule.left].name)?;
        for (i, symbol) in self.rule.right.iter().enumerate() {
            if self.marker == Some(i) {
                f.write_str(" .")?;
            }
            write!(f, " {}", self.g.symbol_name(*symbol))?;
        }
        if self.marker == Some(self.rule.right.len()) {
            f.write_str(" .")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct Cfg {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub rules: Map<RuleID, Rule>,
    pub start_symbol: NonterminalID,
    symbols: Map<String, SymbolID>,
}

impl Cfg {
    pub(crate) fn augment<U>(expressions: &[Expression<U>]) -> Result<Self, GrammarDefError> {
        if expressions.is_empty() {
            return Err(GrammarDefError::Empty);
        }
        // the first definition is the start symbol.
        let start = NonterminalID::new(NonterminalID::OFFSET);

        let mut g = Self {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: Map::default(),
            start_symbol: start,
            symbols: Map::default(),
        };
        g.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: EOI.to_owned(),
            },
        );
        g.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                name: START.to_owned(),
                rules: vec![RuleID::ACCEPT],
            },
        );
        g.rules.insert(
            RuleID::ACCEPT,
            Rule {
                id: RuleID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
                alternative: 0,
            },
        );

        // 1st pass: every defined expression is a nonterminal.
        for (i, expr) in expressions.iter().enumerate() {
            verify_name(&expr.name)?;
            let id = NonterminalID::new(NonterminalID::OFFSET + i as u32);
            if g.symbols.insert(expr.name.clone(), SymbolID::N(id)).is_some() {
                return Err(GrammarDefError::DuplicateExpression {
                    name: expr.name.clone(),
                });
            }
            g.nonterminals.insert(
                id,
                Nonterminal {
                    id,
                    name: expr.name.clone(),
                    rules: vec![],
                },
            );
        }

        // 2nd pass: any other referenced name is a terminal.
        let mut next_rule_id = RuleID::OFFSET;
        for (i, expr) in expressions.iter().enumerate() {
            let left = NonterminalID::new(NonterminalID::OFFSET + i as u32);
            for (alternative, alt) in expr.alternatives.iter().enumerate() {
                let right = alt
                    .symbols
                    .iter()
                    .map(|name| g.classify(name))
                    .collect::<Result<Vec<_>, _>>()?;

                let id = RuleID::new(next_rule_id);
                next_rule_id += 1;
                g.rules.insert(
                    id,
                    Rule {
                        id,
                        left,
                        right,
                        alternative,
                    },
                );
                g.nonterminals[&left].rules.push(id);
            }
        }

        tracing::debug!(
            "classified {} terminals and {} nonterminals ({} rules)",
            g.terminals.len(),
            g.nonterminals.len(),
            g.rules.len(),
        );

        Ok(g)
    }

    fn classify(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        if let Some(symbol) = self.symbols.get(name) {
            return Ok(*symbol);
        }
        verify_name(name)?;
        let id = TerminalID::from_raw(TerminalID::OFFSET + (self.terminals.len() - 1) as u32);
        self.terminals.insert(
            id,
            Terminal {
                id,
                name: name.to_owned(),
            },
        );
        self.symbols.insert(name.to_owned(), SymbolID::T(id));
        Ok(SymbolID::T(id))
    }

    /// Look up a symbol by its name, including the reserved ones.
    pub fn symbol(&self, name: &str) -> Option<SymbolID> {
        match name {
            EOI => Some(SymbolID::T(TerminalID::EOI)),
            START => Some(SymbolID::N(NonterminalID::START)),
            _ => self.symbols.get(name).copied(),
        }
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.nonterminals[&n].name,
        }
    }

    pub fn rules_of(&self, n: NonterminalID) -> &[RuleID] {
        &self.nonterminals[&n].rules
    }
}

fn verify_name(name: &str) -> Result<(), GrammarDefError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(GrammarDefError::InvalidName { name: name.into() });
    }
    if name.starts_with('$') {
        return Err(GrammarDefError::ReservedName { name: name.into() });
    }
    Ok(())
}

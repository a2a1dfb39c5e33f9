//! Calculation of first set function.

use crate::{
    cfg::{Cfg, NonterminalID, SymbolID, TerminalID},
    types::Map,
};
use std::fmt;

/// A set of terminal symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw() as usize)
    }

    /// Add the elements of `other`, returning whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| TerminalID::from_raw(raw as u32))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw() as usize).collect(),
        }
    }
}

/// The terminals that can begin a string derived from a symbol sequence,
/// and whether the sequence can derive the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct First {
    pub terminals: TerminalSet,
    pub nullable: bool,
}

impl First {
    pub fn display<'g>(&'g self, g: &'g Cfg) -> FirstDisplay<'g> {
        FirstDisplay { first: self, g }
    }
}

pub struct FirstDisplay<'g> {
    first: &'g First,
    g: &'g Cfg,
}

// `{ and or ε }`
impl fmt::Display for FirstDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for t in self.first.terminals.iter() {
            write!(f, " {}", self.g.symbol_name(SymbolID::T(t)))?;
        }
        if self.first.nullable {
            f.write_str(" ε")?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FirstSetError {
    #[error("unknown symbol: `{symbol}'")]
    UnknownSymbol { symbol: String },
}

#[derive(Debug)]
pub struct FirstSets {
    map: Map<NonterminalID, First>,
}

impl FirstSets {
    pub fn new(g: &Cfg) -> Self {
        let mut this = Self {
            map: g
                .nonterminals
                .keys()
                .map(|id| (*id, First::default()))
                .collect(),
        };

        // repeat until a whole pass adds nothing.
        let mut changed = true;
        let mut passes = 0;
        while changed {
            changed = false;
            passes += 1;
            for rule in g.rules.values() {
                let added = this.first_of(&rule.right);
                let first = &mut this.map[&rule.left];
                changed |= first.terminals.union_with(&added.terminals);
                if added.nullable && !first.nullable {
                    first.nullable = true;
                    changed = true;
                }
            }
        }
        tracing::debug!("first sets converged after {} passes", passes);

        this
    }

    /// `First(N)` of a nonterminal symbol.
    pub fn get(&self, n: NonterminalID) -> Option<&First> {
        self.map.get(&n)
    }

    /// `First(Y1 Y2 ... Yn)`
    pub fn first_of(&self, symbols: &[SymbolID]) -> First {
        let mut res = First::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    res.terminals.insert(*t);
                    return res;
                }
                SymbolID::N(n) => {
                    let Some(first) = self.map.get(n) else {
                        return res;
                    };
                    res.terminals.union_with(&first.terminals);
                    if !first.nullable {
                        return res;
                    }
                }
            }
        }
        res.nullable = true;
        res
    }

    /// Same as `first_of`, but the sequence is given by symbol names.
    pub fn first_of_names(&self, g: &Cfg, names: &[&str]) -> Result<First, FirstSetError> {
        let symbols = names
            .iter()
            .map(|name| {
                g.symbol(name).ok_or_else(|| FirstSetError::UnknownSymbol {
                    symbol: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.first_of(&symbols))
    }

    /// `First(beta lookahead)`, which never contains the empty string.
    pub(crate) fn lookaheads(&self, beta: &[SymbolID], lookahead: TerminalID) -> TerminalSet {
        let First {
            mut terminals,
            nullable,
        } = self.first_of(beta);
        if nullable {
            terminals.insert(lookahead);
        }
        terminals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn names(g: &Cfg, set: &TerminalSet) -> Vec<String> {
        let mut names: Vec<_> = set
            .iter()
            .map(|t| g.symbol_name(SymbolID::T(t)).to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn boolean_expressions() {
        let grammar = Grammar::<()>::define(|g| {
            g.expression("E", |e| {
                e.alt(["E", "and", "F"]).alt(["E", "or", "F"]).alt(["F"]);
            })?;
            g.expression("F", |e| {
                e.alt(["leftb", "E", "rightb"]).alt(["not", "F"]).alt(["id"]);
            })?;
            Ok(())
        })
        .unwrap();
        let cfg = grammar.cfg();
        let first_sets = FirstSets::new(cfg);

        for name in ["E", "F", "$start"] {
            let first = first_sets.first_of_names(cfg, &[name]).unwrap();
            assert_eq!(names(cfg, &first.terminals), ["id", "leftb", "not"]);
            assert!(!first.nullable);
        }

        let first = first_sets.first_of_names(cfg, &["and", "E"]).unwrap();
        assert_eq!(names(cfg, &first.terminals), ["and"]);
        assert_eq!(first.display(cfg).to_string(), "{ and }");
    }

    #[test]
    fn nullable_prefixes() {
        // A : a | ; B : A b | A ; S : A B c ;
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["A", "B", "c"]);
            })?;
            g.expression("A", |e| {
                e.alt(["a"]).empty();
            })?;
            g.expression("B", |e| {
                e.alt(["A", "b"]).alt(["A"]);
            })?;
            Ok(())
        })
        .unwrap();
        let cfg = grammar.cfg();
        let first_sets = FirstSets::new(cfg);

        let a = first_sets.first_of_names(cfg, &["A"]).unwrap();
        assert_eq!(names(cfg, &a.terminals), ["a"]);
        assert!(a.nullable);

        let b = first_sets.first_of_names(cfg, &["B"]).unwrap();
        assert_eq!(names(cfg, &b.terminals), ["a", "b"]);
        assert!(b.nullable);

        let s = first_sets.first_of_names(cfg, &["S"]).unwrap();
        assert_eq!(names(cfg, &s.terminals), ["a", "b", "c"]);
        assert!(!s.nullable);

        let la = first_sets.lookaheads(&[], TerminalID::EOI);
        assert_eq!(names(cfg, &la), ["$"]);
    }

    #[test]
    fn empty_sequence_is_nullable() {
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["x"]);
            })
        })
        .unwrap();
        let first_sets = FirstSets::new(grammar.cfg());
        let first = first_sets.first_of(&[]);
        assert!(first.terminals.is_empty());
        assert!(first.nullable);
    }

    #[test]
    fn union_reports_growth() {
        let a = TerminalID::from_raw(1);
        let b = TerminalID::from_raw(2);
        let mut set: TerminalSet = [a].into_iter().collect();
        assert!(!set.insert(a));
        assert!(!set.union_with(&[a].into_iter().collect()));
        assert!(set.union_with(&[a, b].into_iter().collect()));
        assert_eq!(set.iter().collect::<Vec<_>>(), [a, b]);
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["x"]);
            })
        })
        .unwrap();
        let cfg = grammar.cfg();
        let err = FirstSets::new(cfg)
            .first_of_names(cfg, &["S", "y"])
            .unwrap_err();
        assert!(matches!(err, FirstSetError::UnknownSymbol { symbol } if symbol == "y"));
    }
}

//! The implementation of canonical LR(1) automaton.

use crate::{
    cfg::{Cfg, RuleID, SymbolID, TerminalID},
    first_sets::FirstSets,
    types::Map,
};
use lryacc_runtime::StateID;
use std::{collections::BTreeSet, fmt};

/// LR(1) item.
///
/// A production rule with a marker position and a single lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LRItem {
    pub rule: RuleID,
    pub marker: usize,
    pub lookahead: TerminalID,
}

/// A set of LR(1) items, compared independently of insertion order.
pub type ItemSet = BTreeSet<LRItem>;

/// Computes closures and transitions of item sets.
#[derive(Debug)]
pub struct ItemSetBuilder<'g> {
    g: &'g Cfg,
    first_sets: &'g FirstSets,
}

impl<'g> ItemSetBuilder<'g> {
    pub fn new(g: &'g Cfg, first_sets: &'g FirstSets) -> Self {
        Self { g, first_sets }
    }

    /// The item set from which the automaton starts, `closure({[$start := . S, $]})`.
    pub fn initial(&self) -> ItemSet {
        self.closure([LRItem {
            rule: RuleID::ACCEPT,
            marker: 0,
            lookahead: TerminalID::EOI,
        }])
    }

    /// Expand the kernel items with every item predicted by them.
    pub fn closure<I>(&self, kernel: I) -> ItemSet
    where
        I: IntoIterator<Item = LRItem>,
    {
        let mut items = ItemSet::new();
        let mut pending = vec![];
        for item in kernel {
            if items.insert(item) {
                pending.push(item);
            }
        }

        while let Some(item) = pending.pop() {
            let rule = &self.g.rules[&item.rule];

            // [X := ... . Y beta, a]
            let (y, beta) = match &rule.right[item.marker..] {
                [SymbolID::N(y), beta @ ..] => (*y, beta),
                _ => continue,
            };

            let lookaheads = self.first_sets.lookaheads(beta, item.lookahead);
            for &rule in self.g.rules_of(y) {
                for lookahead in lookaheads.iter() {
                    let new_item = LRItem {
                        rule,
                        marker: 0,
                        lookahead,
                    };
                    if items.insert(new_item) {
                        pending.push(new_item);
                    }
                }
            }
        }

        items
    }

    /// `GOTO(items, symbol)`; empty when there is no transition.
    pub fn goto(&self, items: &ItemSet, symbol: SymbolID) -> ItemSet {
        self.closure(items.iter().filter_map(|item| {
            let rule = &self.g.rules[&item.rule];
            (rule.right.get(item.marker) == Some(&symbol)).then_some(LRItem {
                marker: item.marker + 1,
                ..*item
            })
        }))
    }

    /// Extract the (unexpanded) kernels of all transitions from an item set.
    fn transitions(&self, items: &ItemSet) -> Map<SymbolID, Vec<LRItem>> {
        let mut kernels: Map<SymbolID, Vec<LRItem>> = Map::default();
        for item in items {
            let rule = &self.g.rules[&item.rule];
            let Some(label) = rule.right.get(item.marker) else {
                continue;
            };
            kernels.entry(*label).or_default().push(LRItem {
                marker: item.marker + 1,
                ..*item
            });
        }
        kernels
    }
}

#[derive(Debug)]
pub struct AutomatonNode {
    pub items: ItemSet,
    pub edges: Map<SymbolID, StateID>,
}

/// The canonical LR(1) automaton.
///
/// States are numbered in breadth-first discovery order, starting from the
/// closure of the accepting rule.
#[derive(Debug)]
pub struct Automaton {
    nodes: Map<StateID, AutomatonNode>,
}

impl Automaton {
    pub const START: StateID = StateID::from_raw(0);

    pub fn generate(g: &Cfg, first_sets: &FirstSets) -> Self {
        let builder = ItemSetBuilder::new(g, first_sets);

        // the index of an item set is its state number.
        let mut states: Map<ItemSet, Map<SymbolID, StateID>> = Map::default();
        states.insert(builder.initial(), Map::default());

        let mut cursor = 0;
        while let Some((items, _)) = states.get_index(cursor) {
            let transitions = builder.transitions(items);

            let mut edges = Map::default();
            for (symbol, kernel) in transitions {
                let entry = states.entry(builder.closure(kernel));
                let id = StateID::from_raw(entry.index() as u32);
                entry.or_default();
                edges.insert(symbol, id);
            }
            if let Some((_, slot)) = states.get_index_mut(cursor) {
                *slot = edges;
            }
            cursor += 1;
        }

        tracing::debug!("generated {} LR(1) states", states.len());

        Self {
            nodes: states
                .into_iter()
                .enumerate()
                .map(|(i, (items, edges))| (StateID::from_raw(i as u32), AutomatonNode { items, edges }))
                .collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (StateID, &AutomatonNode)> + '_ {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn node(&self, id: StateID) -> Option<&AutomatonNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Cfg) -> AutomatonDisplay<'g> {
        AutomatonDisplay { automaton: self, g }
    }
}

pub struct AutomatonDisplay<'g> {
    automaton: &'g Automaton,
    g: &'g Cfg,
}

impl fmt::Display for AutomatonDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.g;
        for (i, (id, node)) in self.automaton.nodes().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            writeln!(f, "#### State {:02}", id)?;
            writeln!(f, "## items")?;
            // items sharing a core are printed on one line.
            let mut items = node.items.iter().peekable();
            while let Some(item) = items.next() {
                let rule = &g.rules[&item.rule];
                write!(f, "- {}  [", rule.display(g).with_marker(item.marker))?;
                write!(f, "{}", g.symbol_name(SymbolID::T(item.lookahead)))?;
                while let Some(next) = items.next_if(|next| {
                    next.rule == item.rule && next.marker == item.marker
                }) {
                    write!(f, " {}", g.symbol_name(SymbolID::T(next.lookahead)))?;
                }
                f.write_str("]\n")?;
            }

            writeln!(f, "## edges")?;
            for (symbol, target) in &node.edges {
                writeln!(f, "- {} => {:02}", g.symbol_name(*symbol), target)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn boolean() -> Grammar {
        Grammar::define(|g| {
            g.expression("E", |e| {
                e.alt(["E", "and", "F"]).alt(["E", "or", "F"]).alt(["F"]);
            })?;
            g.expression("F", |e| {
                e.alt(["leftb", "E", "rightb"]).alt(["not", "F"]).alt(["id"]);
            })?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn initial_closure() {
        let grammar = boolean();
        let cfg = grammar.cfg();
        let first_sets = FirstSets::new(cfg);
        let builder = ItemSetBuilder::new(cfg, &first_sets);

        let initial = builder.initial();
        // $start := . E [$], plus the 3 alternatives of E and F, each under $, and, or.
        assert_eq!(initial.len(), 1 + 9 + 9);

        let id = cfg.symbol("id").unwrap();
        let on_id = builder.goto(&initial, id);
        assert_eq!(on_id.len(), 3);
        assert!(on_id
            .iter()
            .all(|item| item.marker == 1 && cfg.rules[&item.rule].right == [id]));

        let and = cfg.symbol("and").unwrap();
        assert!(builder.goto(&initial, and).is_empty());
    }

    #[test]
    fn closure_is_idempotent() {
        let grammar = boolean();
        let cfg = grammar.cfg();
        let first_sets = FirstSets::new(cfg);
        let builder = ItemSetBuilder::new(cfg, &first_sets);

        let initial = builder.initial();
        assert_eq!(builder.closure(initial.iter().copied()), initial);
    }

    #[test]
    fn canonical_states_are_not_merged() {
        // S : C C ; C : c C | d ;
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["C", "C"]);
            })?;
            g.expression("C", |e| {
                e.alt(["c", "C"]).alt(["d"]);
            })?;
            Ok(())
        })
        .unwrap();
        let cfg = grammar.cfg();
        let automaton = Automaton::generate(cfg, &FirstSets::new(cfg));
        assert_eq!(automaton.len(), 10);

        // every edge leads to a known state
        for (_, node) in automaton.nodes() {
            for target in node.edges.values() {
                assert!(automaton.node(*target).is_some());
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let grammar = boolean();
        let cfg = grammar.cfg();
        let first_sets = FirstSets::new(cfg);
        let a = Automaton::generate(cfg, &first_sets);
        let b = Automaton::generate(cfg, &first_sets);
        assert_eq!(a.display(cfg).to_string(), b.display(cfg).to_string());

        let dump = a.display(cfg).to_string();
        assert!(dump.starts_with("#### State 00\n## items\n- $start := . E  [$]\n"));
        assert!(dump.contains("- E := . E and F  [$ and or]\n"));
    }
}

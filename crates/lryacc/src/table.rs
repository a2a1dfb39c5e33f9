//! Compilation of the LR(1) automaton into a parse table.

use crate::{
    cfg::{Cfg, RuleID, SymbolID},
    lr1::Automaton,
};
use lryacc_runtime::{Action, ParseTable, ParseTableRow, StateID};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(
        "LR(1) conflict in state {state} at `{expression} := {right} .' on `{lookahead}': \
         {existing} vs {incoming}"
    )]
    Conflict {
        state: StateID,
        expression: String,
        right: String,
        lookahead: String,
        existing: Action,
        incoming: Action,
    },
}

/// Build the action and goto rows of every automaton state.
///
/// Edges on terminals become shifts and completed items become reductions
/// (or the accept action for the augmented rule). Any cell assigned twice
/// is reported as a conflict.
pub fn compile(g: &Cfg, automaton: &Automaton) -> Result<ParseTable, TableError> {
    let mut table = ParseTable {
        start: Automaton::START,
        states: Default::default(),
    };

    for (id, node) in automaton.nodes() {
        let mut row = ParseTableRow::default();

        for (symbol, target) in &node.edges {
            match symbol {
                SymbolID::T(_) => {
                    row.actions.insert(
                        g.symbol_name(*symbol).to_owned(),
                        Action::Shift { state: *target },
                    );
                }
                SymbolID::N(_) => {
                    row.gotos.insert(g.symbol_name(*symbol).to_owned(), *target);
                }
            }
        }

        for item in &node.items {
            let rule = &g.rules[&item.rule];
            if item.marker < rule.right.len() {
                continue;
            }

            let lookahead = g.symbol_name(SymbolID::T(item.lookahead));
            let expression = g.symbol_name(SymbolID::N(rule.left));
            let action = if rule.id == RuleID::ACCEPT {
                Action::Accept
            } else {
                Action::Reduce {
                    expression: expression.to_owned(),
                    alternative: rule.alternative,
                    len: rule.right.len(),
                }
            };

            if let Some(existing) = row.actions.get(lookahead) {
                return Err(TableError::Conflict {
                    state: id,
                    expression: expression.to_owned(),
                    right: rule
                        .right
                        .iter()
                        .map(|s| g.symbol_name(*s))
                        .collect::<Vec<_>>()
                        .join(" "),
                    lookahead: lookahead.to_owned(),
                    existing: existing.clone(),
                    incoming: action,
                });
            }
            row.actions.insert(lookahead.to_owned(), action);
        }

        table.states.insert(id, row);
    }

    tracing::debug!("compiled parse table with {} states", table.states.len());

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{first_sets::FirstSets, grammar::Grammar};
    use lryacc_runtime::EOI;

    fn build<U>(grammar: &Grammar<U>) -> Result<ParseTable, TableError> {
        let cfg = grammar.cfg();
        let automaton = Automaton::generate(cfg, &FirstSets::new(cfg));
        compile(cfg, &automaton)
    }

    #[test]
    fn ambiguous_grammar_is_rejected() {
        // E : E + E | id ;
        let grammar = Grammar::<()>::define(|g| {
            g.expression("E", |e| {
                e.alt(["E", "+", "E"]).alt(["id"]);
            })
        })
        .unwrap();

        match build(&grammar).unwrap_err() {
            TableError::Conflict {
                expression,
                right,
                lookahead,
                existing,
                incoming,
                ..
            } => {
                assert_eq!(expression, "E");
                assert_eq!(right, "E + E");
                assert_eq!(lookahead, "+");
                assert!(matches!(existing, Action::Shift { .. }));
                assert!(matches!(
                    incoming,
                    Action::Reduce {
                        alternative: 0,
                        len: 3,
                        ..
                    }
                ));
            }
        }
    }

    #[test]
    fn reduce_reduce_conflict_is_rejected() {
        // S : A | B ; A : x ; B : x ;
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["A"]).alt(["B"]);
            })?;
            g.expression("A", |e| {
                e.alt(["x"]);
            })?;
            g.expression("B", |e| {
                e.alt(["x"]);
            })?;
            Ok(())
        })
        .unwrap();

        let err = build(&grammar).unwrap_err();
        let TableError::Conflict {
            lookahead,
            existing,
            incoming,
            ..
        } = &err;
        assert_eq!(lookahead, EOI);
        assert!(matches!(existing, Action::Reduce { .. }));
        assert!(matches!(incoming, Action::Reduce { .. }));
        assert!(err.to_string().starts_with("LR(1) conflict in state "));
    }

    #[test]
    fn actions_and_gotos_are_separated() {
        // S : a S | ;
        let grammar = Grammar::<()>::define(|g| {
            g.expression("S", |e| {
                e.alt(["a", "S"]).empty();
            })
        })
        .unwrap();
        let table = build(&grammar).unwrap();
        let start = table.start;

        assert!(matches!(
            table.action(start, "a"),
            Some(Action::Shift { .. })
        ));
        assert_eq!(
            table.action(start, EOI),
            Some(&Action::Reduce {
                expression: "S".into(),
                alternative: 1,
                len: 0,
            })
        );
        assert!(table.action(start, "S").is_none());

        let accepting = table.goto(start, "S").unwrap();
        assert_eq!(table.action(accepting, EOI), Some(&Action::Accept));
        assert_eq!(table.states.len(), 4);
    }
}

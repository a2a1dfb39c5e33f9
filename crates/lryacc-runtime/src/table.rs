//! The compiled LR(1) parse table.
//!
//! The table is plain data keyed by state numbers and symbol names, so it can
//! be serialized with any `serde` format and reloaded without rebuilding it.

use crate::types::Map;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The number identifying a state of the LR(1) automaton.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}

impl StateID {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift { state: StateID },

    /// Reduce by the given alternative of an expression, popping `len`
    /// entries from the stacks.
    Reduce {
        expression: String,
        alternative: usize,
        len: usize,
    },

    /// The input has been derived from the start symbol.
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift { state } => write!(f, "shift({:02})", state),
            Self::Reduce {
                expression,
                alternative,
                ..
            } => write!(f, "reduce({}#{})", expression, alternative),
            Self::Accept => f.write_str("accept"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseTableRow {
    /// Actions keyed by terminal names.
    pub actions: Map<String, Action>,
    /// Transitions taken after a reduction, keyed by expression names.
    pub gotos: Map<String, StateID>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseTable {
    pub start: StateID,
    pub states: Map<StateID, ParseTableRow>,
}

impl ParseTable {
    pub fn row(&self, state: StateID) -> Option<&ParseTableRow> {
        self.states.get(&state)
    }

    pub fn action(&self, state: StateID, terminal: &str) -> Option<&Action> {
        self.row(state)?.actions.get(terminal)
    }

    pub fn goto(&self, state: StateID, expression: &str) -> Option<StateID> {
        self.row(state)?.gotos.get(expression).copied()
    }

    /// Return the terminals that have an action in the specified state.
    pub fn expected_terminals(&self, state: StateID) -> impl Iterator<Item = &str> + '_ {
        self.row(state)
            .into_iter()
            .flat_map(|row| row.actions.keys().map(String::as_str))
    }
}

impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, row)) in self.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "#### State {:02}", id)?;
            if *id == self.start {
                f.write_str(" (start)")?;
            }
            writeln!(f)?;
            writeln!(f, "## actions")?;
            for (terminal, action) in &row.actions {
                writeln!(f, "- {} => {}", terminal, action)?;
            }
            writeln!(f, "## gotos")?;
            for (expression, goto) in &row.gotos {
                writeln!(f, "- {} => goto({:02})", expression, goto)?;
            }
        }
        Ok(())
    }
}

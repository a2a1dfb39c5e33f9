//! Parse tree.

use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the parse tree built by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// A shifted input token.
    Leaf { token: Token },

    /// The result of reducing an alternative of an expression.
    Expression {
        expression: String,
        alternative: usize,
        children: Vec<Node>,
    },
}

impl Node {
    /// Return the symbol name of this node, i.e. the token name of a leaf
    /// or the expression name.
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf { token } => &token.name,
            Self::Expression { expression, .. } => expression,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Leaf { token } => Some(token),
            Self::Expression { .. } => None,
        }
    }

    pub fn alternative(&self) -> Option<usize> {
        match self {
            Self::Leaf { .. } => None,
            Self::Expression { alternative, .. } => Some(*alternative),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Expression { children, .. } => children,
        }
    }

    /// Collect the tokens of this subtree from left to right.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut leaves = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { token } => leaves.push(token),
                Self::Expression { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        leaves
    }
}

// `(E#0 (E#2 (F#2 id)) and (F#2 id))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { token } => f.write_str(&token.name),
            Self::Expression {
                expression,
                alternative,
                children,
            } => {
                write!(f, "({}#{}", expression, alternative)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

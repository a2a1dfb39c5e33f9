//! The shift-reduce driver interpreting a compiled [`ParseTable`].

use crate::{
    table::{Action, ParseTable, StateID},
    token::{Position, Token},
    tree::Node,
    EOI,
};
use std::fmt;

/// The default number of consecutive recovery attempts without a shift.
pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: usize = 32;

/// Callbacks invoked after an alternative has been reduced.
///
/// The new node is already on top of the node stack, see
/// [`ParseContext::reduced`].
pub trait Reducer<U> {
    fn reduce(&self, ctx: &mut ParseContext<U>);
}

impl<U, F> Reducer<U> for F
where
    F: Fn(&mut ParseContext<U>),
{
    fn reduce(&self, ctx: &mut ParseContext<U>) {
        (self)(ctx)
    }
}

/// The mutable state of a single parse run.
///
/// Hooks receive this value by reference and may edit the remaining input
/// and move the cursor; the stacks are only observable.
pub struct ParseContext<U = ()> {
    input: Vec<Token>,
    next_index: usize,
    state_stack: Vec<StateID>,
    node_stack: Vec<Node>,
    user_context: U,
}

impl<U> fmt::Debug for ParseContext<U>
where
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("input", &self.input)
            .field("next_index", &self.next_index)
            .field("state_stack", &self.state_stack)
            .field("node_stack", &self.node_stack)
            .field("user_context", &self.user_context)
            .finish()
    }
}

impl ParseContext<()> {
    pub fn from_tokens(input: Vec<Token>) -> Self {
        Self::new(input, ())
    }
}

impl<U> ParseContext<U> {
    pub fn new(input: Vec<Token>, user_context: U) -> Self {
        Self {
            input,
            next_index: 0,
            state_stack: vec![],
            node_stack: vec![],
            user_context,
        }
    }

    pub fn input(&self) -> &[Token] {
        &self.input
    }

    /// The token sequence, e.g. for splicing in implied tokens.
    pub fn input_mut(&mut self) -> &mut Vec<Token> {
        &mut self.input
    }

    /// The index of the next token to be read.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn set_next_index(&mut self, next_index: usize) {
        self.next_index = next_index;
    }

    /// The token at the cursor, or `None` at the end of input.
    pub fn lookahead(&self) -> Option<&Token> {
        self.input.get(self.next_index)
    }

    pub fn current_state(&self) -> Option<StateID> {
        self.state_stack.last().copied()
    }

    pub fn state_stack(&self) -> &[StateID] {
        &self.state_stack
    }

    pub fn nodes(&self) -> &[Node] {
        &self.node_stack
    }

    /// The node on top of the node stack, i.e. the one just built inside
    /// a reduction callback.
    pub fn reduced(&self) -> Option<&Node> {
        self.node_stack.last()
    }

    /// Borrow the top node together with the user context.
    pub fn reduced_with_user_context(&mut self) -> (Option<&Node>, &mut U) {
        (self.node_stack.last(), &mut self.user_context)
    }

    pub fn user_context(&self) -> &U {
        &self.user_context
    }

    pub fn user_context_mut(&mut self) -> &mut U {
        &mut self.user_context
    }

    pub fn into_user_context(self) -> U {
        self.user_context
    }

    fn reset(&mut self, start: StateID) {
        self.next_index = 0;
        self.state_stack.clear();
        self.state_stack.push(start);
        self.node_stack.clear();
    }

    /// Best known location at the cursor, for diagnostics.
    fn position(&self) -> Option<Position> {
        self.input
            .get(self.next_index)
            .or_else(|| self.input.last())
            .map(|t| t.position)
    }
}

type BadInputHook<'p, U> = Box<dyn Fn(&mut ParseContext<U>) -> bool + 'p>;

/// The parser driven based on a compiled parse table.
pub struct Parser<'p, U = ()> {
    table: &'p ParseTable,
    reducer: Option<&'p dyn Reducer<U>>,
    on_bad_input: Option<BadInputHook<'p, U>>,
    max_recovery_attempts: usize,
}

impl<U> fmt::Debug for Parser<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("table", &self.table)
            .field("reducer", &self.reducer.is_some())
            .field("on_bad_input", &self.on_bad_input.is_some())
            .field("max_recovery_attempts", &self.max_recovery_attempts)
            .finish()
    }
}

impl<'p, U> Parser<'p, U> {
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(table: &'p ParseTable) -> Self {
        Self {
            table,
            reducer: None,
            on_bad_input: None,
            max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
        }
    }

    /// Set the callbacks invoked after each reduction.
    pub fn reductions(mut self, reducer: &'p dyn Reducer<U>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Set the hook consulted when the table has no action for the lookahead.
    ///
    /// The hook returns `true` when it has repaired the input (or moved the
    /// cursor), in which case the same step is attempted again.
    pub fn on_bad_input<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ParseContext<U>) -> bool + 'p,
    {
        self.on_bad_input = Some(Box::new(hook));
        self
    }

    /// Limit the number of recovery attempts between two shifts.
    pub fn max_recovery_attempts(mut self, attempts: usize) -> Self {
        self.max_recovery_attempts = attempts;
        self
    }

    /// Run the parser over the input of `ctx` until it is accepted or fails.
    pub fn parse(&self, ctx: &mut ParseContext<U>) -> Result<Node, ParseError> {
        ctx.reset(self.table.start);
        let mut attempts = 0;

        // the cursor and the input are re-read on every step since hooks may edit them.
        while ctx.next_index <= ctx.input.len() {
            let current = ctx.current_state().ok_or(ParseError::EmptyStateStack)?;
            let lookahead = ctx.lookahead().map_or(EOI, |t| t.name.as_str());

            let action = match self.table.action(current, lookahead) {
                Some(action) => action,
                None => {
                    if self.recover(ctx, &mut attempts)? {
                        continue;
                    }
                    return Err(self.unexpected_input(ctx, current));
                }
            };

            match action {
                Action::Accept => {
                    tracing::debug!("accepted at state {}", current);
                    break;
                }

                Action::Shift { state } => {
                    let token = ctx
                        .lookahead()
                        .cloned()
                        .ok_or(ParseError::UnexpectedEnd {
                            index: ctx.next_index,
                            position: ctx.position(),
                        })?;
                    tracing::trace!("shift {} -> {:02}", token, state);
                    ctx.next_index += 1;
                    ctx.state_stack.push(*state);
                    ctx.node_stack.push(Node::Leaf { token });
                    attempts = 0;
                }

                Action::Reduce {
                    expression,
                    alternative,
                    len,
                } => {
                    let len = *len;
                    if ctx.state_stack.len() <= len || ctx.node_stack.len() < len {
                        return Err(ParseError::StackUnderflow {
                            expression: expression.clone(),
                            alternative: *alternative,
                            len,
                        });
                    }
                    ctx.state_stack.truncate(ctx.state_stack.len() - len);
                    let children = ctx.node_stack.split_off(ctx.node_stack.len() - len);

                    let exposed = ctx.current_state().ok_or(ParseError::EmptyStateStack)?;
                    let next = self.table.goto(exposed, expression).ok_or_else(|| {
                        ParseError::NoMoveAfterReduce {
                            state: exposed,
                            expression: expression.clone(),
                        }
                    })?;
                    tracing::trace!("reduce {}#{} -> {:02}", expression, alternative, next);

                    let node = Node::Expression {
                        expression: expression.clone(),
                        alternative: *alternative,
                        children,
                    };
                    ctx.state_stack.push(next);
                    ctx.node_stack.push(node);
                    if let Some(reducer) = self.reducer {
                        reducer.reduce(ctx);
                    }
                }
            }
        }

        if ctx.node_stack.len() != 1 {
            return Err(ParseError::EndedBeforeAllReduced {
                remaining: ctx.node_stack.len(),
            });
        }
        if ctx.next_index < ctx.input.len() {
            return Err(ParseError::EndedBeforeReadAllInput {
                index: ctx.next_index,
                position: ctx.position(),
            });
        }
        if ctx.next_index > ctx.input.len() {
            let handled = match &self.on_bad_input {
                Some(hook) => hook(ctx),
                None => false,
            };
            if !handled {
                return Err(ParseError::UnexpectedEnd {
                    index: ctx.next_index,
                    position: ctx.position(),
                });
            }
        }

        ctx.node_stack.pop().ok_or(ParseError::EndedBeforeAllReduced { remaining: 0 })
    }

    /// Offer the bad input to the hook.
    ///
    /// A hook that reports success must have changed the cursor or the
    /// lookahead; otherwise the same step would fail forever.
    fn recover(&self, ctx: &mut ParseContext<U>, attempts: &mut usize) -> Result<bool, ParseError> {
        let Some(hook) = &self.on_bad_input else {
            return Ok(false);
        };
        if *attempts >= self.max_recovery_attempts {
            return Err(ParseError::RecoveryLimitExceeded {
                index: ctx.next_index,
                attempts: *attempts,
            });
        }

        let snapshot = (
            ctx.next_index,
            ctx.input.len(),
            ctx.lookahead().map(|t| t.name.clone()),
        );
        if !hook(ctx) {
            return Ok(false);
        }
        *attempts += 1;

        let progressed = snapshot
            != (
                ctx.next_index,
                ctx.input.len(),
                ctx.lookahead().map(|t| t.name.clone()),
            );
        if !progressed {
            return Err(ParseError::RecoveryStalled {
                index: ctx.next_index,
            });
        }
        tracing::debug!("recovered from bad input at {}", snapshot.0);
        Ok(true)
    }

    fn unexpected_input(&self, ctx: &ParseContext<U>, state: StateID) -> ParseError {
        let expected = self
            .table
            .expected_terminals(state)
            .map(str::to_owned)
            .collect();
        match ctx.lookahead() {
            Some(token) => ParseError::UnexpectedToken {
                index: ctx.next_index,
                token: token.name.clone(),
                position: token.position,
                expected,
            },
            None => ParseError::UnexpectedEnd {
                index: ctx.next_index,
                position: ctx.position(),
            },
        }
    }
}

impl Parser<'_, ()> {
    /// Parse a token sequence without user context.
    pub fn parse_tokens(&self, input: Vec<Token>) -> Result<Node, ParseError> {
        self.parse(&mut ParseContext::from_tokens(input))
    }
}

struct DisplayPosition<'a>(&'a Option<Position>);

impl fmt::Display for DisplayPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " ({}:{})", position.row, position.column),
            None => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("bad input at index {index}: {token} ({}:{}), expected one of {expected:?}", .position.row, .position.column)]
    UnexpectedToken {
        index: usize,
        token: String,
        position: Position,
        expected: Vec<String>,
    },

    #[error("unexpected end of input at index {index}{}", DisplayPosition(.position))]
    UnexpectedEnd {
        index: usize,
        position: Option<Position>,
    },

    #[error("ended before read all input, stopped at index {index}{}", DisplayPosition(.position))]
    EndedBeforeReadAllInput {
        index: usize,
        position: Option<Position>,
    },

    #[error("ended before all reduced ({remaining} nodes remaining)")]
    EndedBeforeAllReduced { remaining: usize },

    #[error("unable to reduce {expression}#{alternative}: fewer than {len} entries on the stack")]
    StackUnderflow {
        expression: String,
        alternative: usize,
        len: usize,
    },

    #[error("no move after reducing {expression} in state {state}")]
    NoMoveAfterReduce { state: StateID, expression: String },

    #[error("empty state stack")]
    EmptyStateStack,

    #[error("the bad input hook made no progress at index {index}")]
    RecoveryStalled { index: usize },

    #[error("gave up recovering at index {index} after {attempts} attempts")]
    RecoveryLimitExceeded { index: usize, attempts: usize },
}

impl ParseError {
    /// The input index at which the error was detected, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { index, .. }
            | Self::UnexpectedEnd { index, .. }
            | Self::EndedBeforeReadAllInput { index, .. }
            | Self::RecoveryStalled { index }
            | Self::RecoveryLimitExceeded { index, .. } => Some(*index),
            _ => None,
        }
    }
}

//! The grammar file syntax.
//!
//! ```text
//! # comment
//! E : E and F | E or F | F ;
//! F : leftb E rightb | not F | id ;
//! ```
//!
//! A file is tokenized with the runtime lexer and parsed with a table built
//! by this crate from the grammar of the syntax itself.

use crate::{
    grammar::{Grammar, GrammarDefError},
    table::TableError,
};
use lryacc_runtime::{
    LexError, LexRule, Lexer, Node, ParseContext, ParseError, ParseTable, Parser,
};
use std::sync::OnceLock;

/// The definitions of a grammar file, in order of appearance.
pub type Definitions = Vec<(String, Vec<Vec<String>>)>;

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to define the grammar file syntax: {}", _0)]
    Definition(#[source] GrammarDefError),

    #[error("failed to compile the grammar file syntax: {}", _0)]
    Table(#[source] TableError),

    #[error("unexpected stack item, expecting {expected}")]
    UnexpectedNode { expected: &'static str },
}

#[derive(Debug)]
enum StackItem {
    Definitions(Definitions),
    Definition((String, Vec<Vec<String>>)),
    Alternatives(Vec<Vec<String>>),
    Elems(Vec<String>),
}

#[derive(Debug, Default)]
struct Builder {
    stack: Vec<StackItem>,
    error: Option<SyntaxError>,
}

macro_rules! pop_stack {
    ($b:expr, $Variant:ident) => {
        match $b.stack.pop() {
            Some(StackItem::$Variant(item)) => item,
            _ => {
                return Err(SyntaxError::UnexpectedNode {
                    expected: stringify!($Variant),
                })
            }
        }
    };
}

type StackAction = fn(&mut Builder, &Node) -> Result<(), SyntaxError>;

/// Wrap a stack action as a reduction callback, keeping only the first error.
fn action(f: StackAction) -> impl Fn(&mut ParseContext<Builder>) + Send + Sync + 'static {
    move |ctx: &mut ParseContext<Builder>| {
        let (node, b) = ctx.reduced_with_user_context();
        if b.error.is_some() {
            return;
        }
        let result = match node {
            Some(node) => f(b, node),
            None => Err(SyntaxError::UnexpectedNode {
                expected: "reduced node",
            }),
        };
        if let Err(err) = result {
            b.error = Some(err);
        }
    }
}

fn ident(node: &Node, index: usize) -> Result<String, SyntaxError> {
    node.children()
        .get(index)
        .and_then(Node::token)
        .map(|t| t.content.clone())
        .ok_or(SyntaxError::UnexpectedNode { expected: "ident" })
}

fn definitions() -> Result<Grammar<Builder>, GrammarDefError> {
    Grammar::define(|g| {
        g.expression("grammar", |e| {
            e.alt_with(["grammar", "definition"], action(|b, _| {
                let (name, alternatives) = pop_stack!(b, Definition);
                let mut definitions = pop_stack!(b, Definitions);
                definitions.push((name, alternatives));
                b.stack.push(StackItem::Definitions(definitions));
                Ok(())
            }))
            .alt_with(["definition"], action(|b, _| {
                let (name, alternatives) = pop_stack!(b, Definition);
                b.stack.push(StackItem::Definitions(vec![(name, alternatives)]));
                Ok(())
            }));
        })?;

        g.expression("definition", |e| {
            e.alt_with(["ident", "colon", "alternatives", "semi"], action(|b, node| {
                let alternatives = pop_stack!(b, Alternatives);
                let name = ident(node, 0)?;
                b.stack.push(StackItem::Definition((name, alternatives)));
                Ok(())
            }));
        })?;

        g.expression("alternatives", |e| {
            e.alt_with(["alternatives", "bar", "sequence"], action(|b, _| {
                let elems = pop_stack!(b, Elems);
                let mut alternatives = pop_stack!(b, Alternatives);
                alternatives.push(elems);
                b.stack.push(StackItem::Alternatives(alternatives));
                Ok(())
            }))
            .alt_with(["sequence"], action(|b, _| {
                let elems = pop_stack!(b, Elems);
                b.stack.push(StackItem::Alternatives(vec![elems]));
                Ok(())
            }));
        })?;

        g.expression("sequence", |e| {
            e.alt_with(["sequence", "ident"], action(|b, node| {
                let mut elems = pop_stack!(b, Elems);
                elems.push(ident(node, 1)?);
                b.stack.push(StackItem::Elems(elems));
                Ok(())
            }))
            .alt_with(Vec::<String>::new(), action(|b, _| {
                b.stack.push(StackItem::Elems(vec![]));
                Ok(())
            }));
        })?;

        Ok(())
    })
}

fn lexer() -> Result<Lexer, LexError> {
    Lexer::new([
        LexRule::new("ws", r"\s+").skip(),
        LexRule::new("comment", r"#[^\n]*").skip(),
        LexRule::new("colon", ":"),
        LexRule::new("bar", r"\|"),
        LexRule::new("semi", ";"),
        LexRule::new("ident", r"[^\s:|;#]+"),
    ])
}

/// The grammar, table and lexer of the grammar file syntax.
struct Syntax {
    grammar: Grammar<Builder>,
    table: ParseTable,
    lexer: Lexer,
}

static SYNTAX: OnceLock<Syntax> = OnceLock::new();

/// Build the syntax on first use and share it afterwards.
fn syntax() -> Result<&'static Syntax, SyntaxError> {
    if let Some(syntax) = SYNTAX.get() {
        return Ok(syntax);
    }
    tracing::debug!("building the grammar file syntax");
    let grammar = definitions().map_err(SyntaxError::Definition)?;
    let table = crate::build_table(&grammar).map_err(SyntaxError::Table)?;
    let lexer = lexer()?;
    Ok(SYNTAX.get_or_init(|| Syntax {
        grammar,
        table,
        lexer,
    }))
}

/// Parse the source of a grammar file into its definitions.
pub fn parse(source: &str) -> Result<Definitions, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let Syntax {
        grammar,
        table,
        lexer,
    } = syntax()?;
    let tokens = lexer.tokenize(source)?;
    tracing::trace!("read {} tokens", tokens.len());

    let parser = Parser::new(table).reductions(grammar);
    let mut ctx = ParseContext::new(tokens, Builder::default());
    parser.parse(&mut ctx)?;

    let mut b = ctx.into_user_context();
    if let Some(err) = b.error.take() {
        return Err(err);
    }
    let definitions = pop_stack!(b, Definitions);
    Ok(definitions)
}

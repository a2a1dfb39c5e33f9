//! Grammar types.

use crate::{cfg::Cfg, types::Map};
use lryacc_runtime::{Node, ParseContext, Reducer};
use std::{fmt, fs, io, path::Path};

/// A callback invoked after an alternative has been reduced.
///
/// The reduced node is on top of the node stack when it runs.
pub type ReduceFn<U> = Box<dyn Fn(&mut ParseContext<U>) + Send + Sync>;

/// One right-hand side of an expression.
pub struct Alternative<U> {
    pub(crate) symbols: Vec<String>,
    action: Option<ReduceFn<U>>,
}

impl<U> Alternative<U> {
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl<U> fmt::Debug for Alternative<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alternative")
            .field("symbols", &self.symbols)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// A named nonterminal and its ordered alternatives.
#[derive(Debug)]
pub struct Expression<U> {
    pub(crate) name: String,
    pub(crate) alternatives: Vec<Alternative<U>>,
}

impl<U> Expression<U> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alternatives(&self) -> &[Alternative<U>] {
        &self.alternatives
    }
}

/// The grammar definition used to derive the parse table.
///
/// The first defined expression is the start symbol. Every referenced name
/// that is not defined as an expression is a terminal.
#[derive(Debug)]
pub struct Grammar<U = ()> {
    expressions: Vec<Expression<U>>,
    index: Map<String, usize>,
    cfg: Cfg,
}

impl<U> Grammar<U> {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    /// Read the definitions from a grammar file.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, GrammarDefError> {
        let definitions =
            crate::syntax::parse(source).map_err(|err| GrammarDefError::Syntax(Box::new(err)))?;
        Self::define(|g| {
            for (name, alternatives) in definitions {
                g.expression(&name, |e| {
                    for symbols in alternatives {
                        e.alt(symbols);
                    }
                })?;
            }
            Ok(())
        })
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef<U>) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            expressions: vec![],
        };
        f(&mut def)?;

        for expr in &def.expressions {
            if expr.alternatives.is_empty() {
                tracing::warn!("the expression `{}' has no alternatives", expr.name);
            }
        }

        let cfg = Cfg::augment(&def.expressions)?;
        let index = def
            .expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| (expr.name.clone(), i))
            .collect();
        Ok(Self {
            expressions: def.expressions,
            index,
            cfg,
        })
    }

    pub fn expressions(&self) -> &[Expression<U>] {
        &self.expressions
    }

    pub fn expression(&self, name: &str) -> Option<&Expression<U>> {
        self.index.get(name).map(|&i| &self.expressions[i])
    }

    /// The name of the start expression.
    pub fn start(&self) -> &str {
        &self.cfg.nonterminals[&self.cfg.start_symbol].name
    }

    /// The augmented grammar derived from the definitions.
    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Iterate over the terminal names referenced by this grammar.
    pub fn terminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.cfg
            .terminals
            .values()
            .skip(1)
            .map(|t| t.name.as_str())
    }
}

impl<U> Reducer<U> for Grammar<U> {
    fn reduce(&self, ctx: &mut ParseContext<U>) {
        let action = match ctx.reduced() {
            Some(Node::Expression {
                expression,
                alternative,
                ..
            }) => self
                .expression(expression)
                .and_then(|e| e.alternatives.get(*alternative))
                .and_then(|alt| alt.action.as_ref()),
            _ => None,
        };
        if let Some(action) = action {
            action(ctx);
        }
    }
}

impl<U> fmt::Display for Grammar<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for expr in &self.expressions {
            write!(f, "{} :", expr.name)?;
            for (i, alt) in expr.alternatives.iter().enumerate() {
                if i > 0 {
                    write!(f, "\n    |")?;
                }
                for symbol in &alt.symbols {
                    write!(f, " {}", symbol)?;
                }
            }
            writeln!(f, "\n    ;")?;
        }
        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<U> {
    expressions: Vec<Expression<U>>,
}

impl<U> GrammarDef<U> {
    /// Define an expression and its alternatives.
    pub fn expression<F>(&mut self, name: &str, f: F) -> Result<(), GrammarDefError>
    where
        F: FnOnce(&mut ExpressionDef<U>),
    {
        if self.expressions.iter().any(|e| e.name == name) {
            return Err(GrammarDefError::DuplicateExpression { name: name.into() });
        }

        let mut def = ExpressionDef {
            alternatives: vec![],
        };
        f(&mut def);

        for (i, alt) in def.alternatives.iter().enumerate() {
            if def.alternatives[..i]
                .iter()
                .any(|other| other.symbols == alt.symbols)
            {
                return Err(GrammarDefError::DuplicateAlternative {
                    name: name.into(),
                    symbols: alt.symbols.join(" "),
                });
            }
        }

        self.expressions.push(Expression {
            name: name.to_owned(),
            alternatives: def.alternatives,
        });
        Ok(())
    }
}

/// The alternatives of an expression under definition.
#[derive(Debug)]
pub struct ExpressionDef<U> {
    alternatives: Vec<Alternative<U>>,
}

impl<U> ExpressionDef<U> {
    /// Add an alternative without a reduction callback.
    pub fn alt<I, S>(&mut self, symbols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives.push(Alternative {
            symbols: symbols.into_iter().map(Into::into).collect(),
            action: None,
        });
        self
    }

    /// Add an alternative with a callback invoked each time it is reduced.
    pub fn alt_with<I, S, F>(&mut self, symbols: I, action: F) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut ParseContext<U>) + Send + Sync + 'static,
    {
        self.alternatives.push(Alternative {
            symbols: symbols.into_iter().map(Into::into).collect(),
            action: Some(Box::new(action)),
        });
        self
    }

    /// Add an alternative deriving the empty string.
    pub fn empty(&mut self) -> &mut Self {
        self.alt(std::iter::empty::<String>())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(Box<crate::syntax::SyntaxError>),

    #[error("the grammar has no expressions")]
    Empty,

    #[error("can not have expressions with same name: `{name}'")]
    DuplicateExpression { name: String },

    #[error("duplicate alternative `{name} := {symbols}'")]
    DuplicateAlternative { name: String, symbols: String },

    #[error("`{name}' is reserved")]
    ReservedName { name: String },

    #[error("incorrect symbol name: {name:?}")]
    InvalidName { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{NonterminalID, RuleID, SymbolID, TerminalID};

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
    fn classifies_symbols_in_two_passes() {
        let g = boolean();
        let cfg = g.cfg();

        // `E` is referenced before `F` is defined but both are nonterminals.
        assert!(matches!(cfg.symbol("E"), Some(SymbolID::N(_))));
        assert!(matches!(cfg.symbol("F"), Some(SymbolID::N(_))));
        assert_eq!(
            g.terminals().collect::<Vec<_>>(),
            ["and", "or", "leftb", "rightb", "not", "id"]
        );
        assert_eq!(cfg.symbol("$"), Some(SymbolID::T(TerminalID::EOI)));
        assert_eq!(cfg.symbol("$start"), Some(SymbolID::N(NonterminalID::START)));
        assert_eq!(g.start(), "E");
    }

    #[test]
    fn augments_with_accepting_rule() {
        let g = boolean();
        let cfg = g.cfg();
        let accept = &cfg.rules[&RuleID::ACCEPT];
        assert_eq!(accept.display(cfg).to_string(), "$start := E");
        assert_eq!(cfg.rules.len(), 7);
        assert_eq!(cfg.rules_of(cfg.start_symbol).len(), 3);

        let last = cfg.rules.values().last().unwrap();
        assert_eq!(last.display(cfg).with_marker(0).to_string(), "F := . id");
        assert_eq!(last.alternative, 2);
    }

    #[test]
    fn looks_up_expressions_by_name() {
        let g = boolean();
        let f = g.expression("F").unwrap();
        assert_eq!(f.name(), "F");
        assert_eq!(f.alternatives()[1].symbols(), ["not", "F"]);
        assert_eq!(g.expression("E").unwrap().alternatives().len(), 3);
        assert!(g.expression("id").is_none());
        assert!(g.expression("$start").is_none());
    }

    #[test]
    fn rejects_duplicate_expressions() {
        let err = Grammar::<()>::define(|g| {
            g.expression("E", |e| {
                e.alt(["id"]);
            })?;
            g.expression("E", |e| {
                e.alt(["num"]);
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::DuplicateExpression { name } if name == "E"));
    }

    #[test]
    fn rejects_duplicate_alternatives() {
        let err = Grammar::<()>::define(|g| {
            g.expression("E", |e| {
                e.alt(["id"]).alt(["id"]);
            })
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::DuplicateAlternative { .. }));
    }

    #[test]
    fn rejects_reserved_names() {
        let err = Grammar::<()>::define(|g| {
            g.expression("E", |e| {
                e.alt(["id", "$"]);
            })
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::ReservedName { name } if name == "$"));

        let err = Grammar::<()>::define(|g| g.expression("$start", |e| {
            e.alt(["id"]);
        }))
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::ReservedName { .. }));
    }

    #[test]
    fn rejects_empty_grammar() {
        let err = Grammar::<()>::define(|_| Ok(())).unwrap_err();
        assert!(matches!(err, GrammarDefError::Empty));
    }

    #[test]
    fn displays_in_grammar_file_syntax() {
        let g = Grammar::<()>::define(|g| {
            g.expression("list", |e| {
                e.alt(["list", "item"]).empty();
            })
        })
        .unwrap();
        assert_eq!(g.to_string(), "list : list item\n    |\n    ;\n");
    }
}

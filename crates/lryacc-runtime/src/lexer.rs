//! Regex based tokenizer.
//!
//! Rules are tried in declaration order at the current offset and the first
//! one that matches there wins, so more specific patterns must be declared
//! before general ones.

use crate::token::{Position, Token};
use regex::{Regex, RegexBuilder};
use std::{fmt, sync::Arc};

/// A callback run right after a rule has emitted its token.
///
/// The emitted token is the last element of the queue; the callback may
/// rewrite it, drop it, or push more tokens.
pub type LexAction = Arc<dyn Fn(&mut Vec<Token>) + Send + Sync>;

/// A lexical rule: a token name and the pattern that recognizes it.
#[derive(Clone)]
pub struct LexRule {
    name: String,
    pattern: String,
    case_insensitive: bool,
    skip: bool,
    action: Option<LexAction>,
}

impl LexRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            case_insensitive: false,
            skip: false,
            action: None,
        }
    }

    /// Match this rule without regard to letter case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Consume the matched text without emitting a token (whitespace, comments).
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Run `action` on the token queue each time this rule emits a token.
    ///
    /// Skipped rules emit nothing and never run their action.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Vec<Token>) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for LexRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("case_insensitive", &self.case_insensitive)
            .field("skip", &self.skip)
            .field("action", &self.action.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct CompiledRule {
    rule: LexRule,
    regex: Regex,
}

/// A tokenizer built from an ordered list of [`LexRule`]s.
#[derive(Debug)]
pub struct Lexer {
    rules: Vec<CompiledRule>,
}

impl Lexer {
    pub fn new<I>(rules: I) -> Result<Self, LexError>
    where
        I: IntoIterator<Item = LexRule>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| {
                // anchor the pattern so that it only matches at the current offset.
                let regex = RegexBuilder::new(&format!("^(?:{})", rule.pattern))
                    .case_insensitive(rule.case_insensitive)
                    .build()
                    .map_err(|source| LexError::InvalidPattern {
                        name: rule.name.clone(),
                        source,
                    })?;
                tracing::debug!("compiled lexer rule {}", rule);
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, LexError>>()?;
        Ok(Self { rules })
    }

    /// Split `input` into tokens.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let lines = LineIndex::new(input);
        let mut tokens = vec![];
        let mut offset = 0;

        'scan: while offset < input.len() {
            let rest = &input[offset..];
            for CompiledRule { rule, regex } in &self.rules {
                let Some(m) = regex.find(rest) else {
                    continue;
                };
                if m.as_str().is_empty() {
                    return Err(LexError::EmptyMatch {
                        name: rule.name.clone(),
                        pattern: rule.pattern.clone(),
                    });
                }

                let position = lines.position(offset, m.end());
                offset += m.end();
                if rule.skip {
                    continue 'scan;
                }
                tracing::trace!("lexed {} at {}", rule.name, position);
                tokens.push(Token::new(&rule.name, m.as_str(), position));
                if let Some(action) = &rule.action {
                    action(&mut tokens);
                }
                continue 'scan;
            }

            return Err(LexError::NoMatch {
                position: lines.position(offset, 0),
            });
        }

        Ok(tokens)
    }
}

/// Start offsets of every line, for converting byte offsets into rows/columns.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &str) -> Self {
        // "\r\n" ends with '\n' as well, so both line endings are covered.
        let starts = Some(0)
            .into_iter()
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn position(&self, index: usize, length: usize) -> Position {
        let row = self.starts.partition_point(|&start| start <= index);
        Position {
            index,
            row,
            column: index - self.starts[row - 1] + 1,
            length,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("invalid pattern for `{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("the pattern `{pattern}' of `{name}' matched an empty string")]
    EmptyMatch { name: String, pattern: String },

    #[error("no rule matches at position {position}")]
    NoMatch { position: Position },
}

impl fmt::Display for LexRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = /{}/", self.name, self.pattern)?;
        if self.case_insensitive {
            f.write_str("i")?;
        }
        if self.skip {
            f.write_str(" (skip)")?;
        }
        Ok(())
    }
}

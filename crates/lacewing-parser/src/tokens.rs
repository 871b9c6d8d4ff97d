//! Token types for the query language.
//!
//! The tokenizer splits on blanks; it never decides whether a word is a
//! keyword. That classification is positional and belongs to the grammar
//! engine, so `by` and `herps` both come out of the lexer as plain
//! [`Token::Word`]s. The one exception is [`Token::Compound`], produced by
//! the normalizer when a recognized two-word keyword phrase (`id by`) is
//! folded into its canonical hyphenated form.

use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// A lexical token of the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// A run of non-blank, non-comma, non-equals characters.
    Word(&'src str),

    /// A digit-only run, candidate numeric id.
    Number(&'src str),

    /// A double-quoted phrase spanning all enclosed words (quotes stripped).
    Quoted(String),

    /// A normalized two-word keyword phrase in canonical hyphenated form
    /// (`id-by`, `added-since`). Produced by the normalizer, never by the
    /// lexer.
    Compound(String),

    /// `,` - taxon clause separator.
    Comma,

    /// `=` - reserved separator (split out by the tokenizer contract).
    Equals,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> AsRef<Token<'src>> for PositionedToken<'src> {
    fn as_ref(&self) -> &Token<'src> {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.end()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => write!(f, "{word}"),
            Token::Number(digits) => write!(f, "{digits}"),
            Token::Quoted(phrase) => write!(f, "\"{phrase}\""),
            Token::Compound(keyword) => write!(f, "{keyword}"),
            Token::Comma => write!(f, ","),
            Token::Equals => write!(f, "="),
        }
    }
}

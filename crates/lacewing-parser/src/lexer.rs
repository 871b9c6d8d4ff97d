//! Lexical analyzer for query source text.
//!
//! The lexer splits the command on blank characters into a stream of
//! [`Token`]s: quoted phrases, digit runs, commas, equals signs, and plain
//! words. It never consults the keyword tables - keyword classification is
//! positional and happens in the grammar engine.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass. Tokenizing
//! is a pure function of the input string: identical input always yields an
//! identical token stream.

use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::{alt, cut_err, peek, not, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = Result<O, ErrMode<ContextError<LexerDiagnostic>>>;

/// A character that can be part of a word: anything except blanks, the
/// clause separator `,`, the reserved separator `=`, and the quote delimiter.
fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != ',' && c != '=' && c != '"'
}

/// Parse a double-quoted phrase spanning all enclosed words.
///
/// The quote characters delimit the token and are not part of its text.
/// There is no escape processing; a phrase cannot contain a double quote.
fn quoted_phrase<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    '"'.parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| {
            ErrMode::Backtrack(ContextError::new())
        })?;

    // Commit after the opening quote so a missing close quote reports E001
    // with a span from the opening quote to the error position.
    cut_err(terminated(take_while(0.., |c: char| c != '"'), '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated quoted phrase",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(|phrase: &str| Token::Quoted(phrase.to_string()))
}

/// Parse a digit-only run, candidate numeric id.
///
/// The run must end at a token boundary; `52a` is a word, not a number.
fn number<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        take_while(1.., |c: char| c.is_ascii_digit()),
        peek(not(one_of(is_word_char))),
    )
    .map(Token::Number)
    .parse_next(input)
}

/// Parse a plain word: a maximal run of word characters.
fn word<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., is_word_char)
        .map(Token::Word)
        .parse_next(input)
}

/// Parse the single-character structural tokens.
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((','.value(Token::Comma), '='.value(Token::Equals))).parse_next(input)
}

/// Parse a single token with position tracking.
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        quoted_phrase, // must come before word
        number,        // must come before word
        word,
        punctuation,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        loop {
            let _ = multispace0::<Input<'a>, ContextError<LexerDiagnostic>>(&mut input);
            if input.is_empty() {
                break;
            }

            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    // Get position before recovery
                    let error_pos = input.current_token_start();

                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    self.diagnostics.emit(diagnostic);

                    // Skip one character and continue so a single bad spot
                    // does not hide later errors.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to E002 (unexpected
    /// character) if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize a command string, collecting multiple errors.
///
/// # Returns
///
/// - `Ok(tokens)` - all tokens successfully parsed
/// - `Err(ParseError)` - one or more errors occurred; contains all
///   diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let located_input = LocatingSlice::new(input);
    let mut lexer = Lexer::new();
    lexer.tokenize(located_input);
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_words_and_quoted_phrase() {
        assert_eq!(
            kinds(r#"a "b c" d"#),
            vec![
                Token::Word("a"),
                Token::Quoted("b c".to_string()),
                Token::Word("d"),
            ]
        );
    }

    #[test]
    fn test_digit_run_is_number() {
        assert_eq!(
            kinds("52775,48484"),
            vec![
                Token::Number("52775"),
                Token::Comma,
                Token::Number("48484"),
            ]
        );
    }

    #[test]
    fn test_mixed_run_is_word() {
        assert_eq!(kinds("52a"), vec![Token::Word("52a")]);
        assert_eq!(kinds("a52"), vec![Token::Word("a52")]);
    }

    #[test]
    fn test_equals_splits_words() {
        assert_eq!(
            kinds("a=b"),
            vec![Token::Word("a"), Token::Equals, Token::Word("b")]
        );
    }

    #[test]
    fn test_whitespace_only_input_yields_no_tokens() {
        assert_eq!(kinds(""), Vec::<Token<'_>>::new());
        assert_eq!(kinds("   \t  "), Vec::<Token<'_>>::new());
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let err = tokenize(r#"birds "nova scotia"#).unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.message(), "unterminated quoted phrase");
        // Span runs from the opening quote to the end of input.
        assert_eq!(diag.labels()[0].span().start(), 6);
    }

    #[test]
    fn test_spans_track_source_positions() {
        let tokens = tokenize("my birds").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..2));
        assert_eq!(tokens[1].span, Span::new(3..8));
    }

    #[test]
    fn test_tokenize_is_pure() {
        let input = r#"rg birds "nova scotia" since 2021"#;
        assert_eq!(tokenize(input).unwrap(), tokenize(input).unwrap());
    }

    #[test]
    fn test_quoted_phrase_spans_include_quotes() {
        let tokens = tokenize(r#""b c""#).unwrap();
        assert_eq!(tokens[0].span, Span::new(0..5));
        assert_eq!(tokens[0].token, Token::Quoted("b c".to_string()));
    }
}

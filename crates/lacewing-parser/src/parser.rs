//! Grammar engine for query commands.
//!
//! This module transforms a normalized token stream from the
//! [`lexer`](super::lexer) into a raw AST defined in
//! [`parser_types`](super::parser_types). The public entry point is
//! [`build_query`].
//!
//! The grammar is keyword-sensitive but positional:
//!
//! ```text
//! Query        := (MacroKeyword)* (TaxonSelector)? (Option)*
//! TaxonSelector:= TaxonClause (',' TaxonClause)*
//! TaxonClause  := Number | GroupKeyword | TaxonWords (InSelector)?
//! InSelector   := 'in' TaxonWords
//! Option       := MacroKeyword | GroupKeyword | OptionKeyword OptionWords
//! OptionWords  := (Quoted | Number | NonKeywordWord)+
//! ```
//!
//! A word token is tested only against the keyword roles valid at its
//! position; the same literal text is plain payload anywhere else. Payload
//! runs are maximal and end at the next token that would be a valid keyword,
//! with one exception carried over from real-world usage: an option keyword
//! always expects at least one argument, so the token immediately after it
//! is payload even when it matches a macro or group keyword (`from home`
//! keeps `home` literal).

use winnow::{
    Parser as _,
    combinator::{opt, peek, repeat},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use lacewing_core::KeywordConfig;

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected at the failing position
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Run `f`, converting any failure into a committed error labeled with what
/// was expected, with the start offset recorded for span calculation.
fn cut_expected<'src, O, F>(input: &mut Input<'src>, label: &'static str, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::Label(label));
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Helper to create a Cut error with a specific StartOffset value
fn cut_error_from_offset(start_offset: usize, label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    e.push(Context::StartOffset(start_offset));
    ErrMode::Cut(e)
}

/// Parse a word acting as a macro keyword (head of query or option position).
fn macro_keyword<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word) if config.is_macro_keyword(word) => Some(Spanned::new(*word, token.span)),
        _ => None,
    })
    .context(Context::Label("macro keyword"))
    .parse_next(input)
}

/// Parse a word acting as a group keyword.
fn group_keyword<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word) if config.is_group_keyword(word) => Some(Spanned::new(*word, token.span)),
        _ => None,
    })
    .context(Context::Label("group keyword"))
    .parse_next(input)
}

/// Parse an option keyword in canonical lowercase form.
///
/// Compound tokens (`id-by`) already carry the canonical spelling; plain
/// words are matched case-insensitively against the option table.
fn option_keyword<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word) if config.is_option_keyword(word) => {
            Some(Spanned::new(word.to_ascii_lowercase(), token.span))
        }
        Token::Compound(keyword) if config.is_option_keyword(keyword) => {
            Some(Spanned::new(keyword.clone(), token.span))
        }
        _ => None,
    })
    .context(Context::Label("option keyword"))
    .parse_next(input)
}

/// Parse the ancestor-scope keyword `in`.
fn ancestor_keyword<'src>(input: &mut Input<'src>, config: &KeywordConfig) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(&token.token, Token::Word(word) if config.is_ancestor_keyword(word))
    })
    .void()
    .context(Context::Label("`in`"))
    .parse_next(input)
}

/// Parse a comma token.
fn comma<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| matches!(token.token, Token::Comma))
        .void()
        .context(Context::Label("`,`"))
        .parse_next(input)
}

/// First token of a payload run.
///
/// An option keyword always expects at least one argument, so only another
/// option keyword is refused here; macro and group keywords pass through as
/// payload (`from home`, `per species`).
fn run_first<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Spanned<types::RunPart<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word) if !config.is_option_keyword(word) => {
            Some(Spanned::new(types::RunPart::Word(*word), token.span))
        }
        Token::Number(digits) => Some(Spanned::new(types::RunPart::Number(*digits), token.span)),
        Token::Quoted(phrase) => {
            Some(Spanned::new(types::RunPart::Phrase(phrase.clone()), token.span))
        }
        _ => None,
    })
    .parse_next(input)
}

/// Continuation token of a payload run.
///
/// The run is maximal: it stops at the first word that is a valid keyword
/// for the next position. Inside the taxon selector that includes the
/// ancestor keyword `in`; in option payloads `in` is plain content
/// (`by john in doe` is a three-word identifier).
fn run_continuation<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
    in_taxon: bool,
) -> IResult<Spanned<types::RunPart<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word)
            if !config.is_any_keyword(word)
                && !(in_taxon && config.is_ancestor_keyword(word)) =>
        {
            Some(Spanned::new(types::RunPart::Word(*word), token.span))
        }
        Token::Number(digits) => Some(Spanned::new(types::RunPart::Number(*digits), token.span)),
        Token::Quoted(phrase) => {
            Some(Spanned::new(types::RunPart::Phrase(phrase.clone()), token.span))
        }
        _ => None,
    })
    .parse_next(input)
}

/// Parse a maximal payload run: one unconditional first token, then
/// non-keyword continuations.
fn word_run<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
    in_taxon: bool,
) -> IResult<types::WordRun<'src>> {
    let first = run_first(input, config)?;
    let rest: Vec<Spanned<types::RunPart<'src>>> = repeat(0.., |input: &mut Input<'src>| {
        run_continuation(input, config, in_taxon)
    })
    .parse_next(input)?;

    let mut run = Vec::with_capacity(1 + rest.len());
    run.push(first);
    run.extend(rest);
    Ok(run)
}

/// First token of a taxon name run.
///
/// Unlike option payloads, a taxon name cannot begin with the ancestor
/// keyword: a standalone `in plantae` is an error, not a name.
fn taxon_name_first<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Spanned<types::RunPart<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Word(word)
            if !config.is_option_keyword(word) && !config.is_ancestor_keyword(word) =>
        {
            Some(Spanned::new(types::RunPart::Word(*word), token.span))
        }
        Token::Number(digits) => Some(Spanned::new(types::RunPart::Number(*digits), token.span)),
        Token::Quoted(phrase) => {
            Some(Spanned::new(types::RunPart::Phrase(phrase.clone()), token.span))
        }
        _ => None,
    })
    .context(Context::Label("taxon name"))
    .parse_next(input)
}

/// Parse a taxon name run with its optional `in <ancestor>` scope.
fn taxon_name<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<types::TaxonClauseAst<'src>> {
    let first = taxon_name_first(input, config)?;
    let rest: Vec<Spanned<types::RunPart<'src>>> = repeat(0.., |input: &mut Input<'src>| {
        run_continuation(input, config, true)
    })
    .parse_next(input)?;

    let mut words = Vec::with_capacity(1 + rest.len());
    words.push(first);
    words.extend(rest);

    // Optional ancestor scope; once `in` is consumed the name is required.
    let checkpoint = input.checkpoint();
    let ancestor = match ancestor_keyword(input, config) {
        Ok(()) => Some(cut_expected(input, "taxon name after `in`", |input| {
            word_run(input, config, true)
        })?),
        Err(_) => {
            input.reset(&checkpoint);
            None
        }
    };

    Ok(types::TaxonClauseAst::Name { words, ancestor })
}

/// Parse a single taxon clause: numeric id, group keyword, or name run.
fn taxon_clause<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<types::TaxonClauseAst<'src>> {
    // Numeric id clause
    let start_remaining = input.eof_offset();
    let checkpoint = input.checkpoint();
    let number: IResult<(&'src str, Span)> = any
        .verify_map(|token: &PositionedToken<'src>| match &token.token {
            Token::Number(digits) => Some((*digits, token.span)),
            _ => None,
        })
        .parse_next(input);
    if let Ok((digits, span)) = number {
        let id: u64 = digits
            .parse()
            .map_err(|_| cut_error_from_offset(start_remaining, "valid taxon id"))?;
        return Ok(types::TaxonClauseAst::Id(Spanned::new(id, span)));
    }
    input.reset(&checkpoint);

    // Group keyword clause (valid anywhere inside a comma list)
    let group: IResult<Spanned<&'src str>> = group_keyword(input, config);
    if let Ok(keyword) = group {
        return Ok(types::TaxonClauseAst::Group(keyword));
    }
    input.reset(&checkpoint);

    taxon_name(input, config)
}

/// Parse the comma-delimited taxon selector, deciding first whether one
/// starts at the current position.
///
/// A lone group keyword does not start a selector - it is a group option -
/// but a group keyword followed by `,` is the head of a clause list.
fn taxon_selector<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<Vec<types::TaxonClauseAst<'src>>> {
    let (first, second) = peek((any, opt(any))).parse_next(input)?;
    let starts = match &first.token {
        Token::Number(_) | Token::Quoted(_) => true,
        Token::Word(word) => {
            if config.is_group_keyword(word) {
                matches!(second.map(|t| &t.token), Some(Token::Comma))
            } else {
                !config.is_option_keyword(word)
                    && !config.is_macro_keyword(word)
                    && !config.is_ancestor_keyword(word)
            }
        }
        _ => false,
    };
    if !starts {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    let mut clauses = vec![taxon_clause(input, config)?];
    loop {
        let checkpoint = input.checkpoint();
        if comma(input).is_err() {
            input.reset(&checkpoint);
            break;
        }
        let clause = cut_expected(input, "taxon clause after `,`", |input| {
            taxon_clause(input, config)
        })?;
        clauses.push(clause);
    }
    Ok(clauses)
}

/// Parse one option: a keyword clause, a macro, or a group keyword.
fn option_clause<'src>(
    input: &mut Input<'src>,
    config: &KeywordConfig,
) -> IResult<types::OptionAst<'src>> {
    let checkpoint = input.checkpoint();

    let keyword: IResult<Spanned<String>> = option_keyword(input, config);
    if let Ok(keyword) = keyword {
        let payload = cut_expected(input, "value after option keyword", |input| {
            word_run(input, config, false)
        })?;
        return Ok(types::OptionAst::Clause { keyword, payload });
    }
    input.reset(&checkpoint);

    let name: IResult<Spanned<&'src str>> = macro_keyword(input, config);
    if let Ok(name) = name {
        return Ok(types::OptionAst::Macro(name));
    }
    input.reset(&checkpoint);

    let name: IResult<Spanned<&'src str>> = group_keyword(input, config);
    if let Ok(name) = name {
        return Ok(types::OptionAst::Group(name));
    }
    input.reset(&checkpoint);

    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Parse a complete query: head macros, optional taxon selector, options.
fn query<'src>(input: &mut Input<'src>, config: &KeywordConfig) -> IResult<types::QueryAst<'src>> {
    let macros: Vec<Spanned<&'src str>> =
        repeat(0.., |input: &mut Input<'src>| macro_keyword(input, config)).parse_next(input)?;

    let taxa = opt(|input: &mut Input<'src>| taxon_selector(input, config)).parse_next(input)?;

    let options: Vec<types::OptionAst<'src>> =
        repeat(0.., |input: &mut Input<'src>| option_clause(input, config)).parse_next(input)?;

    Ok(types::QueryAst {
        macros,
        taxa: taxa.unwrap_or_default(),
        options,
    })
}

/// Union of the spans of a token range.
fn span_of_range(tokens: &[PositionedToken<'_>], range: std::ops::Range<usize>) -> Span {
    let slice = &tokens[range];
    let first = slice.first().map(|t| t.span).unwrap_or_default();
    let last = slice.last().map(|t| t.span).unwrap_or(first);
    first.union(last)
}

/// Utility function to convert winnow errors to our diagnostic format.
///
/// Extracts position information from error context (StartOffset) and
/// builds the expected-vs-found message from the context labels.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    // Extract start offset from error context if available
    let start_remaining = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(*n),
            _ => None,
        }),
        _ => None,
    };

    let end_offset = tokens.len() - current_remaining;
    let start_offset = start_remaining
        .map(|r| tokens.len() - r)
        .unwrap_or(end_offset);

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let expected: Vec<String> = e
                .context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some((*label).to_string()),
                    _ => None,
                })
                .collect();

            let (found, at_eof) = match tokens.get(end_offset) {
                Some(token) => (format!("`{token}`"), false),
                None => ("end of input".to_string(), true),
            };
            let message = if expected.is_empty() {
                format!("unexpected token: found {found}")
            } else {
                format!("expected {}, found {found}", expected.join(" → "))
            };

            let error_span = if start_offset < end_offset {
                span_of_range(tokens, start_offset..end_offset)
            } else if end_offset < tokens.len() {
                tokens[end_offset].span
            } else if let Some(last) = tokens.last() {
                Span::new(last.span.end()..last.span.end())
            } else {
                Span::default()
            };

            let label = if at_eof {
                "unexpected end of input"
            } else {
                "unexpected token"
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(error_span, label)
        }
        ErrMode::Incomplete(_) => {
            // Not reachable: we do not support streaming input.
            let error_span = tokens
                .get(end_offset)
                .or_else(|| tokens.last())
                .map(|t| t.span)
                .unwrap_or_default();

            Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(error_span, "incomplete")
        }
    }
}

/// Diagnostic for a token the grammar could not place anywhere.
fn leftover_diagnostic(token: &PositionedToken<'_>, config: &KeywordConfig) -> Diagnostic {
    let mut diag = Diagnostic::error(format!("expected an option clause, found `{token}`"))
        .with_code(ErrorCode::E100)
        .with_label(token.span, "unexpected token");

    match &token.token {
        Token::Word(word) if config.is_ancestor_keyword(word) => {
            diag = diag.with_help("`in <ancestor>` is only valid immediately after a taxon name");
        }
        Token::Comma => {
            diag = diag.with_help("`,` separates clauses of the taxon selector only");
        }
        Token::Equals => {
            diag = diag.with_help("`=` is reserved and cannot appear in a query");
        }
        _ => {}
    }
    diag
}

/// Build a raw query AST from normalized tokens.
pub(crate) fn build_query<'src>(
    tokens: &'src [PositionedToken<'src>],
    config: &KeywordConfig,
) -> Result<types::QueryAst<'src>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    let ast = match query(&mut token_slice, config) {
        Ok(ast) => ast,
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            return Err(convert_error(e, tokens, current_remaining));
        }
    };

    // The grammar stops cleanly at a token it cannot place; fail fast there.
    let consumed = tokens.len() - token_slice.eof_offset();
    if let Some(leftover) = tokens.get(consumed) {
        return Err(leftover_diagnostic(leftover, config));
    }

    Ok(ast)
}

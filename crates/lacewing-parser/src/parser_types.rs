//! Raw AST produced by the grammar engine.
//!
//! These types mirror the grammar, keep source spans for diagnostics, and
//! borrow word text from the source string. Elaboration turns them into the
//! owned [`lacewing_core::Query`] document.

use crate::span::Spanned;

/// One element of a payload run: a bare word, a digit run, or a quoted
/// phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPart<'src> {
    Word(&'src str),
    Number(&'src str),
    Phrase(String),
}

/// A maximal run of payload parts, terminated by the next valid keyword
/// position.
pub type WordRun<'src> = Vec<Spanned<RunPart<'src>>>;

/// One clause of the comma-delimited taxon selector.
#[derive(Debug, Clone, PartialEq)]
pub enum TaxonClauseAst<'src> {
    /// A numeric taxon id.
    Id(Spanned<u64>),
    /// A group keyword inside a comma list.
    Group(Spanned<&'src str>),
    /// A taxon name run, optionally scoped by `in <ancestor>`.
    Name {
        words: WordRun<'src>,
        ancestor: Option<WordRun<'src>>,
    },
}

/// One option following the taxon selector.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionAst<'src> {
    /// A macro keyword at option position.
    Macro(Spanned<&'src str>),
    /// A group keyword at option position.
    Group(Spanned<&'src str>),
    /// An option keyword with its payload run. The keyword is canonical
    /// lowercase (hyphenated for compound phrases).
    Clause {
        keyword: Spanned<String>,
        payload: WordRun<'src>,
    },
}

/// The parsed query: head macros, optional taxon selector, option clauses.
///
/// `taxa` is empty when the query has no taxon selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAst<'src> {
    pub macros: Vec<Spanned<&'src str>>,
    pub taxa: Vec<TaxonClauseAst<'src>>,
    pub options: Vec<OptionAst<'src>>,
}

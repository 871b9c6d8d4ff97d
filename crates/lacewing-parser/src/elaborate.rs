//! Elaboration from the raw AST to the query document.
//!
//! The grammar engine only decides *shape*; this stage assigns each option
//! clause to its selector kind from the triggering keyword, validates the
//! query-level invariants (non-emptiness, one clause per date field, one
//! value per setting), and freezes the result into a
//! [`lacewing_core::Query`].
//!
//! Resolution is deliberately absent: names, date expressions, and group
//! keywords leave here unresolved, enumerated by
//! [`Query::resolution_requests`](lacewing_core::Query::resolution_requests).

use log::trace;

use lacewing_core::query::{Clause, NameQuery, Query, QueryError, TaxonClause, TaxonSelector};
use lacewing_core::selector::{
    ControlledTermSelector, DateField, DateSelector, PlaceSelector, ProjectSelector, Setting,
    TextPart, TextRun, UserRole, UserSelector,
};

use crate::error::{Diagnostic, ErrorCode};
use crate::parser_types::{OptionAst, QueryAst, RunPart, TaxonClauseAst, WordRun};
use crate::span::Span;

/// Elaborates a parsed AST into a frozen query document.
pub(crate) struct Builder<'a> {
    source: &'a str,
}

impl<'a> Builder<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn build(&self, ast: &QueryAst<'_>) -> Result<Query, Diagnostic> {
        let mut builder = Query::builder(self.source);

        for name in &ast.macros {
            builder.push_macro(name.inner());
        }

        if !ast.taxa.is_empty() {
            let clauses = ast
                .taxa
                .iter()
                .map(taxon_clause)
                .collect::<Vec<TaxonClause>>();
            let selector = TaxonSelector::new(clauses)
                .expect("grammar produced a non-empty taxon clause list");
            builder.set_taxa(selector);
        }

        let mut seen_dates: Vec<(DateField, Span)> = Vec::new();
        let mut seen_settings: Vec<(Setting, Span)> = Vec::new();

        for option in &ast.options {
            match option {
                OptionAst::Macro(name) => builder.push_macro(name.inner()),
                OptionAst::Group(name) => {
                    builder.push_clause(Clause::Group(name.inner().to_ascii_lowercase()));
                }
                OptionAst::Clause { keyword, payload } => {
                    let clause = self.option_clause(
                        keyword.inner(),
                        keyword.span(),
                        payload,
                        &mut seen_dates,
                        &mut seen_settings,
                    )?;
                    builder.push_clause(clause);
                }
            }
        }

        trace!(source = self.source; "elaborated query AST");

        builder.finish().map_err(|err| match err {
            QueryError::Empty | QueryError::EmptyTaxonSelector => {
                Diagnostic::error("query is empty: no macro, taxon selector, or option clause")
                    .with_code(ErrorCode::E200)
                    .with_label(Span::new(0..self.source.len()), "nothing to select here")
                    .with_help("name a taxon, a place, a user, a date, or a macro")
            }
        })
    }

    /// Route one option clause to its selector kind by keyword.
    fn option_clause(
        &self,
        keyword: &str,
        span: Span,
        payload: &WordRun<'_>,
        seen_dates: &mut Vec<(DateField, Span)>,
        seen_settings: &mut Vec<(Setting, Span)>,
    ) -> Result<Clause, Diagnostic> {
        if let Some(role) = UserRole::from_keyword(keyword) {
            return Ok(Clause::User(UserSelector {
                role,
                who: text_run(payload),
            }));
        }

        if let Some(field) = DateField::from_keyword(keyword) {
            if let Some((_, first)) = seen_dates.iter().find(|(seen, _)| *seen == field) {
                return Err(Diagnostic::error(format!(
                    "duplicate date clause for `{}`",
                    field.keyword()
                ))
                .with_code(ErrorCode::E201)
                .with_label(span, "second value here")
                .with_secondary_label(*first, "first value here")
                .with_help("a query may constrain each date field once"));
            }
            seen_dates.push((field, span));
            return Ok(Clause::Date(DateSelector {
                field,
                expression: text_run(payload),
            }));
        }

        if let Some(name) = Setting::from_keyword(keyword) {
            if let Some((_, first)) = seen_settings.iter().find(|(seen, _)| *seen == name) {
                return Err(Diagnostic::error(format!(
                    "duplicate setting `{}`",
                    name.keyword()
                ))
                .with_code(ErrorCode::E202)
                .with_label(span, "second value here")
                .with_secondary_label(*first, "first value here"));
            }
            seen_settings.push((name, span));

            let value = text_run(payload);
            if name == Setting::PerPage && value.text().parse::<u32>().is_err() {
                let payload_span = run_span(payload);
                return Err(Diagnostic::error(format!(
                    "invalid per-page count `{}`",
                    value.text()
                ))
                .with_code(ErrorCode::E203)
                .with_label(payload_span, "not a whole number"));
            }
            return Ok(Clause::Setting { name, value });
        }

        match keyword {
            "from" => Ok(Clause::Place(PlaceSelector {
                place: text_run(payload),
            })),
            "in-prj" => Ok(Clause::Project(ProjectSelector {
                project: text_run(payload),
            })),
            "with" => {
                let mut parts = text_run(payload).parts().to_vec();
                let term = match parts.first() {
                    Some(TextPart::Word(w)) | Some(TextPart::Phrase(w)) => w.clone(),
                    None => unreachable!("grammar guarantees a non-empty payload"),
                };
                parts.remove(0);
                let value = if parts.is_empty() {
                    None
                } else {
                    Some(TextRun::new(parts))
                };
                Ok(Clause::Term(ControlledTermSelector { term, value }))
            }
            "rank" => Ok(Clause::Ranks(
                payload
                    .iter()
                    .map(|part| part_text(part.inner()).to_ascii_lowercase())
                    .collect(),
            )),
            "per" => Ok(Clause::Per(text_run(payload))),
            _ => Err(Diagnostic::error(format!(
                "option keyword `{keyword}` has no selector kind"
            ))
            .with_code(ErrorCode::E204)
            .with_label(span, "unknown option keyword")),
        }
    }
}

/// Convert a payload run into owned text, preserving phrase quoting.
fn text_run(run: &WordRun<'_>) -> TextRun {
    TextRun::new(
        run.iter()
            .map(|part| match part.inner() {
                RunPart::Word(word) => TextPart::Word((*word).to_string()),
                RunPart::Number(digits) => TextPart::Word((*digits).to_string()),
                RunPart::Phrase(phrase) => TextPart::Phrase(phrase.clone()),
            })
            .collect(),
    )
}

fn part_text<'a>(part: &'a RunPart<'_>) -> &'a str {
    match part {
        RunPart::Word(word) => word,
        RunPart::Number(digits) => digits,
        RunPart::Phrase(phrase) => phrase,
    }
}

fn run_span(run: &WordRun<'_>) -> Span {
    let first = run.first().map(|p| p.span()).unwrap_or_default();
    let last = run.last().map(|p| p.span()).unwrap_or(first);
    first.union(last)
}

/// A name run that is a single unquoted, purely alphabetic word of exactly
/// four letters is a candidate taxon abbreviation (`wtsp` -> `WTSP`).
fn name_query(run: &WordRun<'_>) -> NameQuery {
    if let [only] = &run[..] {
        if let RunPart::Word(word) = only.inner() {
            if word.len() == 4 && word.chars().all(|c| c.is_ascii_alphabetic()) {
                return NameQuery::Code(word.to_ascii_uppercase());
            }
        }
    }
    NameQuery::Terms(text_run(run))
}

fn taxon_clause(ast: &TaxonClauseAst<'_>) -> TaxonClause {
    match ast {
        TaxonClauseAst::Id(id) => TaxonClause::Id(*id.inner()),
        TaxonClauseAst::Group(keyword) => {
            TaxonClause::Group(keyword.inner().to_ascii_lowercase())
        }
        TaxonClauseAst::Name { words, ancestor } => TaxonClause::Name {
            name: name_query(words),
            ancestor: ancestor.as_ref().map(|run| name_query(run)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanned;

    fn word_part(word: &str) -> Spanned<RunPart<'_>> {
        Spanned::new(RunPart::Word(word), Span::default())
    }

    #[test]
    fn test_four_letter_code_detection() {
        let run = vec![word_part("wtsp")];
        assert_eq!(name_query(&run), NameQuery::Code("WTSP".to_string()));
    }

    #[test]
    fn test_longer_word_is_a_name() {
        let run = vec![word_part("heron")];
        assert!(matches!(name_query(&run), NameQuery::Terms(_)));
    }

    #[test]
    fn test_two_words_are_a_name_even_if_short() {
        let run = vec![word_part("wtsp"), word_part("also")];
        assert!(matches!(name_query(&run), NameQuery::Terms(_)));
    }

    #[test]
    fn test_quoted_four_letters_stay_a_phrase() {
        let run = vec![Spanned::new(
            RunPart::Phrase("wtsp".to_string()),
            Span::default(),
        )];
        assert!(matches!(name_query(&run), NameQuery::Terms(_)));
    }

    #[test]
    fn test_mixed_alphanumeric_is_not_a_code() {
        let run = vec![word_part("a1bc")];
        assert!(matches!(name_query(&run), NameQuery::Terms(_)));
    }
}

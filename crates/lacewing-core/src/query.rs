//! The query document and its canonical serialization.
//!
//! A [`Query`] is the immutable result of one parse: an ordered macro list,
//! an optional taxon selector, and the option clauses in the order the user
//! wrote them. Its `Display` impl renders canonical query text such that
//! re-parsing the output yields a structurally equal document (keyword
//! phrases hyphenated, macros hoisted to the head, phrase quoting
//! preserved).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolve::{ResolutionRequest, TaxonId};
use crate::selector::{
    ControlledTermSelector, DateSelector, PlaceSelector, ProjectSelector, Setting, TextRun,
    UserSelector,
};

/// Errors raised when assembling a query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The input produced no macro, taxon selector, or option clause.
    #[error("query is empty: no macro, taxon selector, or option clause")]
    Empty,

    /// A taxon selector must carry at least one clause.
    #[error("taxon selector must contain at least one clause")]
    EmptyTaxonSelector,
}

/// A taxon name as queried: either a four-letter abbreviation candidate or a
/// run of terms and quoted phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameQuery {
    /// A candidate taxon abbreviation (`WTSP`), stored uppercased.
    Code(String),
    /// Name terms, with quoted phrases preserved for exact-phrase matching.
    Terms(TextRun),
}

impl NameQuery {
    /// The name as plain text for resolver collaborators.
    pub fn text(&self) -> String {
        match self {
            NameQuery::Code(code) => code.clone(),
            NameQuery::Terms(run) => run.text(),
        }
    }
}

impl fmt::Display for NameQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameQuery::Code(code) => write!(f, "{code}"),
            NameQuery::Terms(run) => write!(f, "{run}"),
        }
    }
}

/// One clause of a taxon selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonClause {
    /// A numeric taxon id.
    Id(TaxonId),
    /// A group keyword inside a comma list (`herps,52775`).
    Group(String),
    /// A taxon name, optionally scoped to an ancestor clade.
    Name {
        name: NameQuery,
        /// The `in <clade>` qualifier narrowing an ambiguous name.
        ancestor: Option<NameQuery>,
    },
}

impl fmt::Display for TaxonClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonClause::Id(id) => write!(f, "{id}"),
            TaxonClause::Group(keyword) => write!(f, "{keyword}"),
            TaxonClause::Name { name, ancestor } => {
                write!(f, "{name}")?;
                if let Some(ancestor) = ancestor {
                    write!(f, " in {ancestor}")?;
                }
                Ok(())
            }
        }
    }
}

/// An ordered, non-empty sequence of taxon clauses built from a
/// comma-delimited run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonSelector {
    clauses: Vec<TaxonClause>,
}

impl TaxonSelector {
    pub fn new(clauses: Vec<TaxonClause>) -> Result<Self, QueryError> {
        if clauses.is_empty() {
            return Err(QueryError::EmptyTaxonSelector);
        }
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[TaxonClause] {
        &self.clauses
    }
}

impl fmt::Display for TaxonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// One option clause, in parse order.
///
/// Keeping a single ordered list (rather than one list per kind) is what
/// preserves clause order through serialization; the per-kind views on
/// [`Query`] are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clause {
    User(UserSelector),
    Place(PlaceSelector),
    Project(ProjectSelector),
    Term(ControlledTermSelector),
    Date(DateSelector),
    /// A group keyword used as an option (`waspsonly`).
    Group(String),
    /// Rank filter words (`rank species genus`), lowercased.
    Ranks(Vec<String>),
    /// Result grouping hint (`per species`).
    Per(TextRun),
    /// A typed option map entry (`sort-by observed`).
    Setting { name: Setting, value: TextRun },
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::User(user) => write!(f, "{} {}", user.role.keyword(), user.who),
            Clause::Place(place) => write!(f, "from {}", place.place),
            Clause::Project(project) => write!(f, "in-prj {}", project.project),
            Clause::Term(term) => {
                write!(f, "with {}", term.term)?;
                if let Some(value) = &term.value {
                    write!(f, " {value}")?;
                }
                Ok(())
            }
            Clause::Date(date) => write!(f, "{} {}", date.field.keyword(), date.expression),
            Clause::Group(keyword) => write!(f, "{keyword}"),
            Clause::Ranks(ranks) => {
                write!(f, "rank")?;
                for rank in ranks {
                    write!(f, " {rank}")?;
                }
                Ok(())
            }
            Clause::Per(per) => write!(f, "per {per}"),
            Clause::Setting { name, value } => write!(f, "{} {value}", name.keyword()),
        }
    }
}

/// An immutable, non-empty query document.
///
/// Created once per parse and owned by the caller for the lifetime of
/// building a downstream request. Structural equality ignores the recorded
/// source text, so a query and its canonical re-parse compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    source: String,
    macros: Vec<String>,
    taxa: Option<TaxonSelector>,
    clauses: Vec<Clause>,
}

impl Query {
    /// Start building a query for the given source text.
    pub fn builder(source: impl Into<String>) -> QueryBuilder {
        QueryBuilder {
            source: source.into(),
            macros: Vec::new(),
            taxa: None,
            clauses: Vec::new(),
        }
    }

    /// The original source text this query was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Macro keywords in the order encountered.
    pub fn macros(&self) -> &[String] {
        &self.macros
    }

    pub fn taxon_selector(&self) -> Option<&TaxonSelector> {
        self.taxa.as_ref()
    }

    /// All option clauses in parse order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn users(&self) -> impl Iterator<Item = &UserSelector> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::User(user) => Some(user),
            _ => None,
        })
    }

    pub fn places(&self) -> impl Iterator<Item = &PlaceSelector> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Place(place) => Some(place),
            _ => None,
        })
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectSelector> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Project(project) => Some(project),
            _ => None,
        })
    }

    pub fn controlled_terms(&self) -> impl Iterator<Item = &ControlledTermSelector> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Term(term) => Some(term),
            _ => None,
        })
    }

    pub fn dates(&self) -> impl Iterator<Item = &DateSelector> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Date(date) => Some(date),
            _ => None,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Group(keyword) => Some(keyword.as_str()),
            _ => None,
        })
    }

    pub fn ranks(&self) -> impl Iterator<Item = &str> {
        self.clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Ranks(ranks) => Some(ranks.iter().map(String::as_str)),
                _ => None,
            })
            .flatten()
    }

    pub fn per(&self) -> Option<&TextRun> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::Per(per) => Some(per),
            _ => None,
        })
    }

    /// The typed option map, in parse order.
    pub fn settings(&self) -> IndexMap<Setting, String> {
        self.clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Setting { name, value } => Some((*name, value.text())),
                _ => None,
            })
            .collect()
    }

    /// The external lookups a caller must run to fully resolve this query.
    ///
    /// The grammar engine never calls collaborators itself; everything that
    /// needs the live system is enumerated here as an explicit request.
    pub fn resolution_requests(&self) -> Vec<ResolutionRequest> {
        let mut requests = Vec::new();

        if let Some(taxa) = &self.taxa {
            for clause in taxa.clauses() {
                match clause {
                    TaxonClause::Id(_) => {}
                    TaxonClause::Group(keyword) => requests.push(ResolutionRequest::ExpandGroup {
                        keyword: keyword.clone(),
                    }),
                    TaxonClause::Name { name, ancestor } => {
                        requests.push(ResolutionRequest::TaxonName {
                            name: name.text(),
                            ancestor: ancestor.as_ref().map(NameQuery::text),
                        });
                    }
                }
            }
        }

        for clause in &self.clauses {
            match clause {
                Clause::User(user) => requests.push(ResolutionRequest::ResolveUser {
                    role: user.role,
                    who: user.who.text(),
                }),
                Clause::Place(place) => requests.push(ResolutionRequest::ResolvePlace {
                    place: place.place.text(),
                }),
                Clause::Project(project) => requests.push(ResolutionRequest::ResolveProject {
                    project: project.project.text(),
                }),
                Clause::Date(date) => requests.push(ResolutionRequest::ParseDate {
                    field: date.field,
                    expression: date.expression.text(),
                }),
                Clause::Group(keyword) => requests.push(ResolutionRequest::ExpandGroup {
                    keyword: keyword.clone(),
                }),
                Clause::Term(_) | Clause::Ranks(_) | Clause::Per(_) | Clause::Setting { .. } => {}
            }
        }

        requests
    }
}

// Structural equality: the recorded source text is carried for error
// reporting and does not participate, so `parse(q)` equals
// `parse(to_string(parse(q)))`.
impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.macros == other.macros && self.taxa == other.taxa && self.clauses == other.clauses
    }
}

impl Eq for Query {}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if first {
                first = false;
                Ok(())
            } else {
                write!(f, " ")
            }
        };

        for name in &self.macros {
            sep(f)?;
            write!(f, "{name}")?;
        }
        if let Some(taxa) = &self.taxa {
            sep(f)?;
            write!(f, "{taxa}")?;
        }
        for clause in &self.clauses {
            sep(f)?;
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Accumulates clauses in parse order, then validates and freezes.
#[derive(Debug)]
pub struct QueryBuilder {
    source: String,
    macros: Vec<String>,
    taxa: Option<TaxonSelector>,
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    /// Record a macro keyword (stored lowercased; order preserved).
    pub fn push_macro(&mut self, name: &str) {
        self.macros.push(name.to_ascii_lowercase());
    }

    pub fn set_taxa(&mut self, taxa: TaxonSelector) {
        self.taxa = Some(taxa);
    }

    pub fn push_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Validate the non-empty invariant and freeze the document.
    pub fn finish(self) -> Result<Query, QueryError> {
        if self.macros.is_empty() && self.taxa.is_none() && self.clauses.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Query {
            source: self.source,
            macros: self.macros,
            taxa: self.taxa,
            clauses: self.clauses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{DateField, TextPart, UserRole};

    fn run(words: &[&str]) -> TextRun {
        TextRun::new(words.iter().map(|w| TextPart::Word((*w).into())).collect())
    }

    #[test]
    fn test_empty_query_rejected() {
        let builder = Query::builder("   ");
        assert_eq!(builder.finish(), Err(QueryError::Empty));
    }

    #[test]
    fn test_macro_only_query_is_non_empty() {
        let mut builder = Query::builder("my");
        builder.push_macro("my");
        let query = builder.finish().unwrap();
        assert_eq!(query.macros(), ["my"]);
        assert_eq!(query.to_string(), "my");
    }

    #[test]
    fn test_taxon_selector_display_preserves_order() {
        let taxa =
            TaxonSelector::new(vec![TaxonClause::Id(52775), TaxonClause::Id(48484)]).unwrap();
        assert_eq!(taxa.to_string(), "52775,48484");
    }

    #[test]
    fn test_empty_taxon_selector_rejected() {
        assert_eq!(
            TaxonSelector::new(Vec::new()),
            Err(QueryError::EmptyTaxonSelector)
        );
    }

    #[test]
    fn test_canonical_text_hoists_macros_and_hyphenates() {
        let mut builder = Query::builder("birds my id by ben");
        builder.push_macro("my");
        builder.set_taxa(
            TaxonSelector::new(vec![TaxonClause::Name {
                name: NameQuery::Terms(run(&["birds"])),
                ancestor: None,
            }])
            .unwrap(),
        );
        builder.push_clause(Clause::User(UserSelector {
            role: UserRole::IdentifiedBy,
            who: run(&["ben"]),
        }));

        let query = builder.finish().unwrap();
        assert_eq!(query.to_string(), "my birds id-by ben");
    }

    #[test]
    fn test_ancestor_clause_display() {
        let clause = TaxonClause::Name {
            name: NameQuery::Terms(run(&["prunella"])),
            ancestor: Some(NameQuery::Terms(run(&["animalia"]))),
        };
        assert_eq!(clause.to_string(), "prunella in animalia");
    }

    #[test]
    fn test_structural_equality_ignores_source() {
        let make = |source: &str| {
            let mut builder = Query::builder(source);
            builder.push_clause(Clause::Date(DateSelector {
                field: DateField::ObservedSince,
                expression: run(&["june"]),
            }));
            builder.finish().unwrap()
        };

        assert_eq!(make("since june"), make("  since   june "));
    }

    #[test]
    fn test_settings_view_preserves_order() {
        let mut builder = Query::builder("sort-by observed per-page 50");
        builder.push_clause(Clause::Setting {
            name: Setting::SortBy,
            value: run(&["observed"]),
        });
        builder.push_clause(Clause::Setting {
            name: Setting::PerPage,
            value: run(&["50"]),
        });

        let query = builder.finish().unwrap();
        let settings = query.settings();
        let entries: Vec<_> = settings.iter().collect();
        assert_eq!(
            entries,
            [
                (&Setting::SortBy, &"observed".to_string()),
                (&Setting::PerPage, &"50".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolution_requests_enumerate_lookups() {
        let mut builder = Query::builder("prunella in animalia by me waspsonly since june");
        builder.set_taxa(
            TaxonSelector::new(vec![TaxonClause::Name {
                name: NameQuery::Terms(run(&["prunella"])),
                ancestor: Some(NameQuery::Terms(run(&["animalia"]))),
            }])
            .unwrap(),
        );
        builder.push_clause(Clause::User(UserSelector {
            role: UserRole::ObservedBy,
            who: run(&["me"]),
        }));
        builder.push_clause(Clause::Group("waspsonly".into()));
        builder.push_clause(Clause::Date(DateSelector {
            field: DateField::ObservedSince,
            expression: run(&["june"]),
        }));

        let requests = builder.finish().unwrap().resolution_requests();
        assert_eq!(
            requests,
            vec![
                ResolutionRequest::TaxonName {
                    name: "prunella".into(),
                    ancestor: Some("animalia".into()),
                },
                ResolutionRequest::ResolveUser {
                    role: UserRole::ObservedBy,
                    who: "me".into(),
                },
                ResolutionRequest::ExpandGroup {
                    keyword: "waspsonly".into(),
                },
                ResolutionRequest::ParseDate {
                    field: DateField::ObservedSince,
                    expression: "june".into(),
                },
            ]
        );
    }

    #[test]
    fn test_quoted_phrase_round_trips_through_display() {
        let mut builder = Query::builder("in prj \"arthropods on snow\"");
        builder.push_clause(Clause::Project(ProjectSelector {
            project: TextRun::new(vec![TextPart::Phrase("arthropods on snow".into())]),
        }));
        let query = builder.finish().unwrap();
        assert_eq!(query.to_string(), "in-prj \"arthropods on snow\"");
    }
}
